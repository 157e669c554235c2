use async_trait::async_trait;
use thiserror::Error;

use crate::formatter::{NotificationMessage, SinkKind};

mod smtp;
mod webhook;

pub use smtp::SmtpSink;
pub use webhook::WebhookSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{sink} sink cannot deliver {got:?} notifications")]
    UnsupportedMessage { sink: &'static str, got: SinkKind },

    #[error("Webhook request failed: {0}")]
    Webhook(#[from] reqwest::Error),

    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build mail: {0}")]
    Mail(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Where validated spills end up for a moderator to read.
///
/// Implementations make exactly one delivery attempt per call.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Which [`NotificationMessage`] shape this sink accepts
    fn kind(&self) -> SinkKind;

    /// Short name for logs and metrics
    fn name(&self) -> &'static str;

    async fn deliver(&self, message: &NotificationMessage) -> Result<(), SinkError>;
}
