//! Twilio Verify v2 provider over plain REST.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use super::provider::{Verification, VerificationCheck, VerifyChannel, VerifyProvider};
use crate::config::{HTTP_TIMEOUT, VerifyConfig, http_client};
use crate::error::ProviderError;

/// Error body returned by the Twilio REST API.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    message: Option<String>,
}

/// Twilio Verify client. Credentials never leave this struct.
pub struct TwilioVerify {
    config: VerifyConfig,
    client: reqwest::Client,
}

impl TwilioVerify {
    pub fn new(config: VerifyConfig) -> Self {
        Self {
            config,
            client: http_client(HTTP_TIMEOUT),
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    fn service_url(&self, resource: &str) -> String {
        format!(
            "{}/v2/Services/{}/{resource}",
            self.config.base_url, self.config.service_sid
        )
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let resp = self
            .client
            .post(self.service_url(resource))
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(form)
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<TwilioErrorBody>(&body).ok();
            return Err(ProviderError {
                code: parsed.as_ref().and_then(|b| b.code),
                http_status: Some(status.as_u16()),
                message: parsed
                    .and_then(|b| b.message)
                    .unwrap_or_else(|| format!("{resource} returned {status}")),
            });
        }

        resp.json::<T>().await.map_err(|e| ProviderError {
            code: None,
            http_status: Some(status.as_u16()),
            message: format!("Invalid {resource} response: {e}"),
        })
    }
}

#[async_trait]
impl VerifyProvider for TwilioVerify {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn start_verification(
        &self,
        to: &str,
        channel: VerifyChannel,
    ) -> Result<Verification, ProviderError> {
        self.post_form(
            "Verifications",
            &[("To", to), ("Channel", channel.as_str())],
        )
        .await
    }

    async fn check_verification(
        &self,
        to: &str,
        code: &str,
    ) -> Result<VerificationCheck, ProviderError> {
        self.post_form("VerificationCheck", &[("To", to), ("Code", code)])
            .await
    }
}
