use email_address::EmailAddress;
use serde_json::{Map, Value};
use spill_common::config::ValidationConfig;

use crate::types::{Rejection, Submission, EMAIL_FIELD, MESSAGE_FIELD};

/// A parsed JSON object body
pub type Payload = Map<String, Value>;

/// Shape and content checks for inbound spills
#[derive(Debug, Clone)]
pub struct InputValidator {
    /// Lower-cased, without a leading `@`
    required_domain: String,
    max_email_length: usize,
    max_message_length: usize,
}

impl InputValidator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            required_domain: config.required_email_domain.trim().to_lowercase(),
            max_email_length: config.max_email_length,
            max_message_length: config.max_message_length,
        }
    }

    pub fn required_domain(&self) -> &str {
        &self.required_domain
    }

    pub fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    /// The body must be a JSON object; anything else counts as no body at all
    pub fn parse_payload(body: &[u8]) -> Result<Payload, Rejection> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(Rejection::MissingBody);
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(payload)) => Ok(payload),
            _ => Err(Rejection::MissingBody),
        }
    }

    /// Validate the sender email, then the message. The first failure wins.
    pub fn validate(&self, payload: &Payload) -> Result<Submission, Rejection> {
        let sender_email = self.validate_email(payload.get(EMAIL_FIELD))?;
        let message = self.validate_message(payload.get(MESSAGE_FIELD))?;

        Ok(Submission { sender_email, message })
    }

    fn validate_email(&self, raw: Option<&Value>) -> Result<String, Rejection> {
        let rejection = || Rejection::InvalidEmail { domain: self.required_domain.clone() };

        let email = raw.and_then(Value::as_str).ok_or_else(rejection)?.to_lowercase();

        if email.chars().count() > self.max_email_length {
            return Err(rejection());
        }

        // Display-name forms ("Name <a@b>") parse as valid but are not bare addresses
        if email.contains(['<', '>']) || email.contains(char::is_whitespace) {
            return Err(rejection());
        }
        if !EmailAddress::is_valid(&email) {
            return Err(rejection());
        }

        let domain = email.rsplit_once('@').map(|(_, domain)| domain).ok_or_else(rejection)?;
        if !self.is_required_domain(domain) {
            return Err(rejection());
        }

        Ok(email)
    }

    fn is_required_domain(&self, domain: &str) -> bool {
        domain == self.required_domain
            || domain
                .strip_suffix(self.required_domain.as_str())
                .is_some_and(|subdomain| subdomain.ends_with('.'))
    }

    fn validate_message(&self, raw: Option<&Value>) -> Result<String, Rejection> {
        let rejection = || Rejection::InvalidMessage { max_length: self.max_message_length };

        let message = raw.and_then(Value::as_str).ok_or_else(rejection)?;
        if message.is_empty() || message.chars().count() > self.max_message_length {
            return Err(rejection());
        }

        Ok(message.to_string())
    }
}
