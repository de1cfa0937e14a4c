//! Verification provider trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Delivery channel for a verification code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyChannel {
    Sms,
}

impl VerifyChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
        }
    }
}

/// Result of starting a verification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Verification {
    /// Provider status, `"pending"` on a fresh send.
    pub status: String,
    #[serde(default)]
    pub sid: Option<String>,
}

/// Result of checking a submitted code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerificationCheck {
    /// Provider status; only `"approved"` means the code matched.
    pub status: String,
}

impl VerificationCheck {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}

/// A hosted phone verification service.
///
/// Implementations hold their own credentials. Each call is independent; the
/// verification session lives on the provider, keyed by the destination number.
#[async_trait]
pub trait VerifyProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Send a fresh code to `to` (E.164-like) over `channel`.
    async fn start_verification(
        &self,
        to: &str,
        channel: VerifyChannel,
    ) -> Result<Verification, ProviderError>;

    /// Check `code` against the pending verification for `to`.
    async fn check_verification(
        &self,
        to: &str,
        code: &str,
    ) -> Result<VerificationCheck, ProviderError>;
}
