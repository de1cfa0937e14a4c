//! Per-field input validation.
//!
//! Failures never abort the quiz: they produce a [`ValidationError`] whose
//! placeholder replaces the cleared input until the visitor retries.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::otp::phone::has_min_digits;

static PERSON_OR_PLACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]{2,50}$").unwrap());
static ZIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{5}$").unwrap());
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static OTP_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6}$").unwrap());

/// A free-text quiz input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    City,
    Zip,
    Email,
    Phone,
    Code,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::City => "city",
            Self::Zip => "zip",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Code => "code",
        }
    }

    /// Placeholder shown in an untouched input.
    pub fn default_placeholder(&self) -> &'static str {
        match self {
            Self::Name => "Enter your name",
            Self::City => "Enter your city",
            Self::Zip => "Enter zip code",
            Self::Email => "your@email.com",
            Self::Phone => "(540) 123-4567",
            Self::Code => "Enter 6-digit code",
        }
    }

    fn empty_placeholder(&self) -> &'static str {
        match self {
            Self::Name => "Please enter your name",
            Self::City => "Please enter your city",
            Self::Zip => "Please enter your zip code",
            Self::Email => "Please enter a valid email",
            Self::Phone => "Please enter your phone number",
            Self::Code => "Enter 6-digit code",
        }
    }

    fn error(&self, placeholder: &str) -> ValidationError {
        ValidationError {
            field: self.as_str(),
            placeholder: placeholder.to_string(),
        }
    }

    /// Validate `raw` for this field. Returns the trimmed value on success.
    pub fn validate(&self, raw: &str) -> Result<String, ValidationError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(self.error(self.empty_placeholder()));
        }

        let ok = match self {
            Self::Name | Self::City => PERSON_OR_PLACE.is_match(value),
            Self::Zip => ZIP.is_match(value),
            Self::Email => EMAIL.is_match(value),
            Self::Phone => has_min_digits(value),
            Self::Code => OTP_CODE.is_match(value),
        };
        if ok {
            return Ok(value.to_string());
        }

        let too_short = value.chars().count() < 2;
        let placeholder = match self {
            Self::Name if too_short => "Name must be at least 2 characters",
            Self::Name => "Please enter a valid name (letters only)",
            Self::City if too_short => "City must be at least 2 characters",
            Self::City => "Please enter a valid city name",
            Self::Zip => "Enter a valid 5-digit zip code",
            Self::Email => "Enter a valid email (e.g. you@email.com)",
            Self::Phone => "Enter a valid 10-digit phone number",
            Self::Code => "Enter 6-digit code",
        };
        Err(self.error(placeholder))
    }
}
