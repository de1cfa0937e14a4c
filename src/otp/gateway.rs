//! OTP gateway — normalizes numbers, calls the provider, classifies failures.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use super::phone::normalize_phone;
use super::provider::{VerifyChannel, VerifyProvider};
use crate::error::{OtpError, ProviderError};

/// A code was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendOutcome {
    /// Provider status for the new verification (usually `"pending"`).
    pub status: String,
    /// Normalized destination number.
    pub to: String,
}

/// A code was checked and approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub status: String,
    pub to: String,
}

/// Send/check operations the quiz needs from the gateway.
#[async_trait]
pub trait OtpService: Send + Sync {
    async fn send_code(&self, phone: &str) -> Result<SendOutcome, OtpError>;
    async fn check_code(&self, phone: &str, code: &str) -> Result<CheckOutcome, OtpError>;
}

/// Provider failure kinds this gateway distinguishes. Provider numeric codes
/// are only interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderFault {
    /// 60200: a request parameter (number or code) was rejected.
    InvalidParameter,
    /// 60202: too many check attempts, the pending code is dead.
    CheckAttemptsExhausted,
    /// 60203: too many send attempts for this number.
    SendAttemptsExhausted,
    Other,
}

impl ProviderFault {
    fn classify(err: &ProviderError) -> Self {
        match err.code {
            Some(60200) => Self::InvalidParameter,
            Some(60202) => Self::CheckAttemptsExhausted,
            Some(60203) => Self::SendAttemptsExhausted,
            _ => Self::Other,
        }
    }
}

impl OtpError {
    /// Map a provider failure during "send code".
    pub fn from_send_failure(err: &ProviderError) -> Self {
        match ProviderFault::classify(err) {
            ProviderFault::InvalidParameter => Self::InvalidPhone,
            ProviderFault::SendAttemptsExhausted => Self::RateLimited,
            _ => Self::SendFailed,
        }
    }

    /// Map a provider failure during "check code".
    pub fn from_check_failure(err: &ProviderError) -> Self {
        match ProviderFault::classify(err) {
            ProviderFault::CheckAttemptsExhausted => Self::CodeExpired,
            ProviderFault::InvalidParameter => Self::InvalidCode,
            _ => Self::VerificationFailed,
        }
    }
}

/// Stateless gateway in front of a [`VerifyProvider`]. No retries.
#[derive(Clone)]
pub struct OtpGateway {
    provider: Arc<dyn VerifyProvider>,
}

impl OtpGateway {
    pub fn new(provider: Arc<dyn VerifyProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl OtpService for OtpGateway {
    async fn send_code(&self, phone: &str) -> Result<SendOutcome, OtpError> {
        if phone.trim().is_empty() {
            return Err(OtpError::MissingPhone);
        }
        let to = normalize_phone(phone);

        match self
            .provider
            .start_verification(&to, VerifyChannel::Sms)
            .await
        {
            Ok(verification) => {
                info!(
                    to = %to,
                    status = %verification.status,
                    provider = self.provider.name(),
                    "OTP sent"
                );
                Ok(SendOutcome {
                    status: verification.status,
                    to,
                })
            }
            Err(e) => {
                error!(to = %to, error = %e, "Error sending OTP");
                Err(OtpError::from_send_failure(&e))
            }
        }
    }

    async fn check_code(&self, phone: &str, code: &str) -> Result<CheckOutcome, OtpError> {
        if phone.trim().is_empty() || code.trim().is_empty() {
            return Err(OtpError::MissingCode);
        }
        let to = normalize_phone(phone);

        match self.provider.check_verification(&to, code.trim()).await {
            Ok(check) if check.is_approved() => {
                info!(to = %to, "Phone verified");
                Ok(CheckOutcome {
                    status: check.status,
                    to,
                })
            }
            Ok(check) => {
                warn!(to = %to, status = %check.status, "Verification check not approved");
                Err(OtpError::Rejected {
                    status: check.status,
                })
            }
            Err(e) => {
                error!(to = %to, error = %e, "Error verifying OTP");
                Err(OtpError::from_check_failure(&e))
            }
        }
    }
}
