//! A/B variant bucketing.
//!
//! A visitor keeps whatever variant they were first assigned; the client
//! stores it and hands it back on later visits.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Presentation bucket for the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbVariant {
    A,
    B,
}

impl AbVariant {
    /// Parse a stored variant. Anything other than `A`/`B` is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            _ => None,
        }
    }

    /// Keep a valid existing assignment, otherwise draw a fresh 50/50 bucket.
    pub fn assign(existing: Option<&str>) -> Self {
        Self::assign_with(existing, &mut rand::thread_rng())
    }

    pub fn assign_with<R: Rng + ?Sized>(existing: Option<&str>, rng: &mut R) -> Self {
        if let Some(variant) = existing.and_then(Self::parse) {
            tracing::debug!(variant = %variant, "Returning visitor");
            return variant;
        }
        let variant = if rng.gen_bool(0.5) { Self::A } else { Self::B };
        tracing::info!(variant = %variant, "New visitor assigned to variant");
        variant
    }

    /// Variant B shows the before/after image.
    pub fn shows_before_after_image(&self) -> bool {
        matches!(self, Self::B)
    }
}

impl std::fmt::Display for AbVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}
