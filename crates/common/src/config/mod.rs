use std::{fmt, path::Path};

use eyre::{Result, WrapErr};
use serde::Deserialize;

use crate::infrastructure::Error;

mod validation;

/// Env var naming the TOML config file, when not passed on the command line
pub const CONFIG_ENV: &str = "SPILL_CONFIG";

pub const PORT_ENV: &str = "PORT";
pub const BEHIND_REVERSE_PROXY_ENV: &str = "BEHIND_REVERSE_PROXY";
pub const RECAPTCHA_SECRET_ENV: &str = "RECAPTCHA_SECRET_KEY";
pub const WEBHOOK_URL_ENV: &str = "WEBHOOK_URL";
pub const SMTP_HOST_ENV: &str = "SMTP_HOST";
pub const SMTP_PORT_ENV: &str = "SMTP_PORT";
pub const EMAIL_USERNAME_ENV: &str = "EMAIL_USERNAME";
pub const EMAIL_PASSWORD_ENV: &str = "EMAIL_PASSWORD";

pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// A string that never shows up in `Debug` output
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Process-wide configuration, read once at startup and never mutated
#[derive(Debug, Clone, Deserialize)]
pub struct SpillConfig {
    /// Port the spill API listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Take the client address from `X-Forwarded-For` instead of the socket
    #[serde(default)]
    pub behind_reverse_proxy: bool,

    /// Origins allowed to submit the form cross-origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub captcha: CaptchaConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    pub sink: SinkConfig,

    /// Serve Prometheus metrics on this port; disabled when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,

    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Sender emails must belong to this domain (or one of its subdomains)
    #[serde(default = "default_required_email_domain")]
    pub required_email_domain: String,

    #[serde(default = "default_max_email_length")]
    pub max_email_length: usize,

    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_email_domain: default_required_email_domain(),
            max_email_length: default_max_email_length(),
            max_message_length: default_max_message_length(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    /// Shared secret for the verification provider
    #[serde(default)]
    pub secret: SecretString,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            verify_url: default_verify_url(),
            secret: SecretString::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Address submitters are told to contact when delivery fails
    #[serde(default = "default_support_email")]
    pub support_email: String,

    /// IANA zone used for timestamps in email notifications
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { support_email: default_support_email(), time_zone: default_time_zone() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Webhook(WebhookSinkConfig),
    Smtp(SmtpSinkConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookSinkConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSinkConfig {
    #[serde(default)]
    pub host: String,

    /// Implicit-TLS submission port
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: SecretString,

    /// Sender address; falls back to `username`
    #[serde(default)]
    pub from: Option<String>,

    /// Moderator mailbox that receives spills
    pub to: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SmtpSinkConfig {
    pub fn from_address(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    /// Also write daily-rotated log files here
    #[serde(default)]
    pub log_dir: Option<std::path::PathBuf>,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false, log_dir: None }
    }
}

impl SpillConfig {
    /// Parse a config from TOML without applying environment overrides
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).wrap_err("Failed to parse spill config")
    }

    /// Read the config file at `path`, apply environment overrides and validate
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay secrets and deployment settings taken from the environment
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            self.port = parse_env(PORT_ENV, &port)?;
        }

        if let Some(flag) = lookup(BEHIND_REVERSE_PROXY_ENV) {
            self.behind_reverse_proxy = flag.eq_ignore_ascii_case("true");
        }

        if let Some(secret) = lookup(RECAPTCHA_SECRET_ENV) {
            self.captcha.secret = SecretString::new(secret);
        }

        match &mut self.sink {
            SinkConfig::Webhook(webhook) => {
                if let Some(url) = lookup(WEBHOOK_URL_ENV) {
                    webhook.url = url;
                }
            }
            SinkConfig::Smtp(smtp) => {
                if let Some(host) = lookup(SMTP_HOST_ENV) {
                    smtp.host = host;
                }
                if let Some(port) = lookup(SMTP_PORT_ENV) {
                    smtp.port = parse_env(SMTP_PORT_ENV, &port)?;
                }
                if let Some(username) = lookup(EMAIL_USERNAME_ENV) {
                    smtp.username = username;
                }
                if let Some(password) = lookup(EMAIL_PASSWORD_ENV) {
                    smtp.password = SecretString::new(password);
                }
            }
        }

        Ok(())
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| Error::InvalidEnv { name: name.to_string(), reason: e.to_string() })
        .map_err(Into::into)
}

fn default_port() -> u16 {
    3000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://thebadgerspill.com".to_string(),
        "https://badger-spill.github.io".to_string(),
        "http://localhost:4321".to_string(),
    ]
}

fn default_required_email_domain() -> String {
    "wisc.edu".to_string()
}

fn default_max_email_length() -> usize {
    50
}

fn default_max_message_length() -> usize {
    10_000
}

fn default_verify_url() -> String {
    DEFAULT_VERIFY_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_support_email() -> String {
    "dev.badgerspill@gmail.com".to_string()
}

fn default_time_zone() -> String {
    "America/Chicago".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_log_level() -> String {
    "info".to_string()
}
