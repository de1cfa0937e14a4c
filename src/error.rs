//! Error types for the lead funnel.

use uuid::Uuid;

/// Top-level error type for the funnel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("OTP error: {0}")]
    Otp(#[from] OtpError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Quiz error: {0}")]
    Quiz(#[from] QuizError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// A failure reported by the hosted verification provider, before it is
/// classified into an [`OtpError`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("provider error (code {code:?}, http {http_status:?}): {message}")]
pub struct ProviderError {
    /// Provider-specific numeric error code, when the body carried one.
    pub code: Option<u32>,
    /// HTTP status returned by the provider, if a response was received.
    pub http_status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    /// A transport-level failure (no response from the provider).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            http_status: None,
            message: message.into(),
        }
    }
}

/// OTP gateway errors. The `Display` text is the fixed user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("Phone number is required")]
    MissingPhone,

    #[error("Phone number and code are required")]
    MissingCode,

    #[error("Invalid phone number. Please check and try again.")]
    InvalidPhone,

    #[error("Too many attempts. Please wait a few minutes and try again.")]
    RateLimited,

    #[error("Failed to send verification code. Please try again.")]
    SendFailed,

    #[error("Code expired. Please request a new code.")]
    CodeExpired,

    #[error("Invalid verification code.")]
    InvalidCode,

    #[error("Verification failed. Please try again.")]
    VerificationFailed,

    /// The provider answered the check, but with a status other than `approved`.
    #[error("Invalid code. Please try again.")]
    Rejected { status: String },
}

impl OtpError {
    /// HTTP status code this error maps to at the handler boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::SendFailed | Self::VerificationFailed => 500,
            _ => 400,
        }
    }
}

/// A field failed local validation. Never fatal; the user stays on the step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {placeholder}")]
pub struct ValidationError {
    /// Field name, e.g. `"zip"`.
    pub field: &'static str,
    /// Transient inline message shown in place of the cleared input.
    pub placeholder: String,
}

/// Lead dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Lead record incomplete, missing: {}", missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    #[error("Webhook {sink} failed: {reason}")]
    Webhook { sink: String, reason: String },
}

/// Quiz state machine errors.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Refused(String),

    #[error("{0}")]
    Otp(#[from] OtpError),

    #[error("Failed to submit lead: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Action {action} is not valid at step {step}")]
    InvalidAction { step: String, action: String },

    #[error("Submission already in progress")]
    AlreadySubmitting,

    #[error("Quiz session {0} not found")]
    SessionNotFound(Uuid),
}

/// Result type alias for the funnel.
pub type Result<T> = std::result::Result<T, Error>;
