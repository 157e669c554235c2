use std::net::IpAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use thiserror::Error;

/// JSON field carrying the sender's contact address
pub const EMAIL_FIELD: &str = "email";
/// JSON field carrying the spill text
pub const MESSAGE_FIELD: &str = "message";
/// JSON field carrying the reCAPTCHA token
pub const TOKEN_FIELD: &str = "g-recaptcha-response";

pub const SUCCESS_TEXT: &str = "Your spill has been sent successfully!";

/// An inbound spill as handed over by the transport layer
#[derive(Debug, Clone)]
pub struct SpillRequest {
    pub body: Bytes,
    /// Client address, `None` when the transport could not determine it
    pub source_address: Option<IpAddr>,
}

/// Sender email and message that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Lower-cased, syntactically valid, in the required domain
    pub sender_email: String,
    /// Passed through verbatim
    pub message: String,
}

/// Client-side problems with a spill. The `Display` text is shown to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("No body attached to request.")]
    MissingBody,

    #[error("Please complete the captcha (the \"I'm not a robot\" checkbox) and try again.")]
    CaptchaFailed,

    #[error(
        "A {domain} email must be specified so that we can respond to your message. Only \
         students with valid {domain} email may submit messages."
    )]
    InvalidEmail { domain: String },

    #[error(
        "A message must be included. Messages cannot be longer than {max_length} characters."
    )]
    InvalidMessage { max_length: usize },
}

impl Rejection {
    /// Metric label
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingBody => "missing_body",
            Rejection::CaptchaFailed => "captcha",
            Rejection::InvalidEmail { .. } => "email",
            Rejection::InvalidMessage { .. } => "message",
        }
    }
}

/// Terminal state of a spill
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpillOutcome {
    Delivered,
    Rejected(Rejection),
    /// The sink did not accept the spill; the submitter must resubmit later
    Failed { support_email: String },
}

impl SpillOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            SpillOutcome::Delivered => StatusCode::OK,
            SpillOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
            SpillOutcome::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> String {
        match self {
            SpillOutcome::Delivered => SUCCESS_TEXT.to_string(),
            SpillOutcome::Rejected(rejection) => rejection.to_string(),
            SpillOutcome::Failed { support_email } => format!(
                "There was an error. Please email {support_email} to let us know something went \
                 wrong. We will fix our server issues, and then you can resubmit your message."
            ),
        }
    }
}

/// Plain-text reply returned to the submitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillResponse {
    pub status: StatusCode,
    pub body: String,
}

impl From<SpillOutcome> for SpillResponse {
    fn from(outcome: SpillOutcome) -> Self {
        Self { status: outcome.status(), body: outcome.body() }
    }
}

impl IntoResponse for SpillResponse {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}
