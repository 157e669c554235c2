use thiserror::Error;

/// Errors raised by shared infrastructure helpers
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Environment variable {name} is invalid: {reason}")]
    InvalidEnv { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
