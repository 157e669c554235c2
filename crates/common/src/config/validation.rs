use email_address::EmailAddress;
use eyre::{bail, eyre, Result};

use super::{SinkConfig, SpillConfig};
use crate::infrastructure::parse_and_validate_url;

/// Upper bound on any outbound call timeout
const MAX_TIMEOUT_MS: u64 = 60_000;

impl SpillConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.allowed_origins.is_empty() {
            bail!("At least one allowed origin must be configured");
        }
        for origin in &self.allowed_origins {
            url::Url::parse(origin).map_err(|e| eyre!("Invalid allowed origin '{origin}': {e}"))?;
        }

        let validation = &self.validation;
        let domain = validation.required_email_domain.trim();
        if domain.is_empty() || domain.starts_with('@') || domain.contains(char::is_whitespace) {
            bail!("Required email domain must be a bare domain such as 'wisc.edu'");
        }
        if validation.max_email_length == 0 {
            bail!("Max email length must be at least 1");
        }
        if validation.max_message_length == 0 {
            bail!("Max message length must be at least 1");
        }

        if self.captcha.secret.is_empty() {
            bail!("Captcha secret must be set (config or RECAPTCHA_SECRET_KEY)");
        }
        parse_and_validate_url(&self.captcha.verify_url)
            .map_err(|e| eyre!("Invalid captcha verify URL: {e}"))?;
        validate_timeout("captcha", self.captcha.timeout_ms)?;

        if !EmailAddress::is_valid(&self.notify.support_email) {
            bail!("Support email '{}' is not a valid address", self.notify.support_email);
        }
        jiff::tz::TimeZone::get(&self.notify.time_zone)
            .map_err(|e| eyre!("Unknown time zone '{}': {e}", self.notify.time_zone))?;

        match &self.sink {
            SinkConfig::Webhook(webhook) => {
                if webhook.url.is_empty() {
                    bail!("Webhook URL must be set (config or WEBHOOK_URL)");
                }
                parse_and_validate_url(&webhook.url)
                    .map_err(|e| eyre!("Invalid webhook URL: {e}"))?;
                validate_timeout("webhook", webhook.timeout_ms)?;
            }
            SinkConfig::Smtp(smtp) => {
                if smtp.host.is_empty() {
                    bail!("SMTP host must be set (config or SMTP_HOST)");
                }
                if smtp.port == 0 {
                    bail!("SMTP port must be non-zero");
                }
                if smtp.username.is_empty() || smtp.password.is_empty() {
                    bail!("SMTP credentials must be set (EMAIL_USERNAME / EMAIL_PASSWORD)");
                }
                if !EmailAddress::is_valid(smtp.from_address()) {
                    bail!("SMTP sender '{}' is not a valid address", smtp.from_address());
                }
                if !EmailAddress::is_valid(&smtp.to) {
                    bail!("SMTP recipient '{}' is not a valid address", smtp.to);
                }
                validate_timeout("smtp", smtp.timeout_ms)?;
            }
        }

        if self.metrics_port == Some(self.port) {
            bail!("Port conflict: metrics port {} already in use", self.port);
        }

        Ok(())
    }
}

fn validate_timeout(name: &str, timeout_ms: u64) -> Result<()> {
    if timeout_ms == 0 || timeout_ms > MAX_TIMEOUT_MS {
        bail!("{name} timeout must be between 1ms and 60 seconds");
    }
    Ok(())
}
