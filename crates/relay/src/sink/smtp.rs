use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use spill_common::config::SmtpSinkConfig;
use tracing::debug;

use super::{NotificationSink, SinkError};
use crate::formatter::{NotificationMessage, SinkKind};

/// Mails spills to a moderator mailbox over implicit-TLS SMTP
pub struct SmtpSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpSink {
    pub fn new(config: &SmtpSinkConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .wrap_err_with(|| format!("Invalid SMTP host '{}'", config.host))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ))
            .timeout(Some(Duration::from_millis(config.timeout_ms)))
            .build();

        Ok(Self {
            transport,
            from: config.from_address().parse().map_err(SinkError::from)?,
            to: config.to.parse().map_err(SinkError::from)?,
        })
    }
}

#[async_trait]
impl NotificationSink for SmtpSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Email
    }

    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn deliver(&self, message: &NotificationMessage) -> Result<(), SinkError> {
        let NotificationMessage::Email(email) = message else {
            return Err(SinkError::UnsupportedMessage { sink: self.name(), got: message.kind() });
        };

        let mail = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;

        let response = self.transport.send(mail).await?;
        debug!(code = %response.code(), "SMTP server accepted spill");
        Ok(())
    }
}
