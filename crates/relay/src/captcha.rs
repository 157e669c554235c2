use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use spill_common::{
    config::{CaptchaConfig, SecretString},
    infrastructure::HttpClientFactory,
};
use tracing::{debug, warn};

use crate::{metrics::CAPTCHA_PROVIDER_ERRORS, types::TOKEN_FIELD, validation::Payload};

/// Remote service that decides whether a captcha token was solved by a human
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// One attempt, no retries. `Err` covers transport and decoding failures.
    async fn check(&self, token: &str) -> Result<bool>;
}

/// Response from the siteverify endpoint
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Google reCAPTCHA (or any siteverify-compatible) provider
pub struct RecaptchaProvider {
    client: Client,
    verify_url: String,
    secret: SecretString,
}

impl RecaptchaProvider {
    pub fn new(config: &CaptchaConfig) -> Result<Self> {
        let factory = HttpClientFactory::with_timeout(Duration::from_millis(config.timeout_ms));
        Ok(Self {
            client: factory.create_client()?,
            verify_url: config.verify_url.clone(),
            secret: config.secret.clone(),
        })
    }
}

#[async_trait]
impl VerificationProvider for RecaptchaProvider {
    async fn check(&self, token: &str) -> Result<bool> {
        let response: SiteVerifyResponse = self
            .client
            .post(&self.verify_url)
            .query(&[("secret", self.secret.expose_secret()), ("response", token)])
            .send()
            .await
            .wrap_err("Captcha provider request failed")?
            .error_for_status()
            .wrap_err("Captcha provider returned an error status")?
            .json()
            .await
            .wrap_err("Captcha provider returned a malformed response")?;

        if !response.success {
            debug!(error_codes = ?response.error_codes, "Captcha token rejected by provider");
        }

        Ok(response.success)
    }
}

/// Fail-closed front for a [`VerificationProvider`]
#[derive(Clone)]
pub struct HumanVerificationGate {
    provider: Arc<dyn VerificationProvider>,
}

impl HumanVerificationGate {
    pub fn new(provider: Arc<dyn VerificationProvider>) -> Self {
        Self { provider }
    }

    /// Token from the payload, if it is a non-empty string
    pub fn extract_token(payload: &Payload) -> Option<&str> {
        payload.get(TOKEN_FIELD).and_then(|token| token.as_str()).filter(|token| !token.is_empty())
    }

    /// `true` only if the provider positively confirmed the payload's token.
    ///
    /// A missing token never reaches the provider. Provider errors count as
    /// `false` and are only logged.
    pub async fn verify(&self, payload: &Payload) -> bool {
        let Some(token) = Self::extract_token(payload) else {
            debug!("Spill has no captcha token");
            return false;
        };

        match self.provider.check(token).await {
            Ok(verified) => verified,
            Err(e) => {
                CAPTCHA_PROVIDER_ERRORS.inc();
                warn!(error = %e, "Captcha verification failed, treating spill as unverified");
                false
            }
        }
    }
}
