//! HTTP client for the gateway endpoints, as a browser page would call them.

use serde::Deserialize;

use super::phone::digits_only;
use crate::config::{HTTP_TIMEOUT, http_client};

/// Body shape shared by both gateway endpoints.
#[derive(Debug, Deserialize)]
pub struct GatewayReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Calls `/api/send-otp` and `/api/verify-otp` on a running funnel server.
pub struct HttpOtpClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpOtpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(HTTP_TIMEOUT),
        }
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/{endpoint}", self.base_url)
    }

    /// Ask the gateway to text a code. Refuses locally if fewer than 10 digits.
    pub async fn send_otp(&self, phone: &str) -> anyhow::Result<GatewayReply> {
        let digits = digits_only(phone);
        if digits.len() < 10 {
            anyhow::bail!("Please enter a valid 10-digit phone number");
        }

        let resp = self
            .client
            .post(self.api_url("send-otp"))
            .json(&serde_json::json!({ "phone": digits }))
            .send()
            .await?;

        let ok = resp.status().is_success();
        let reply: GatewayReply = resp.json().await?;
        if !ok {
            anyhow::bail!(
                "{}",
                reply
                    .error
                    .as_deref()
                    .unwrap_or("Failed to send verification code")
            );
        }

        tracing::info!(status = ?reply.status, "OTP sent via gateway");
        Ok(reply)
    }

    /// Check a code. `Ok(())` only when the gateway reports `approved`.
    pub async fn verify_otp(&self, phone: &str, code: &str) -> anyhow::Result<()> {
        let digits = digits_only(phone);

        let resp = self
            .client
            .post(self.api_url("verify-otp"))
            .json(&serde_json::json!({ "phone": digits, "code": code }))
            .send()
            .await?;

        let ok = resp.status().is_success();
        let reply: GatewayReply = resp.json().await?;
        if !ok {
            anyhow::bail!("{}", reply.error.as_deref().unwrap_or("Verification failed"));
        }

        if reply.status.as_deref() == Some("approved") {
            tracing::info!("Phone verified via gateway");
            return Ok(());
        }

        anyhow::bail!("Invalid code. Please try again.")
    }
}
