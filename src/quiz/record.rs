//! The lead record accumulated across quiz steps.

use serde::{Deserialize, Serialize};

use crate::variant::AbVariant;

/// Answers collected so far. Empty strings mean "not answered yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Homeowner answer (`"yes"` once past the first step).
    pub homeowner: String,
    pub project_type: String,
    pub name: String,
    pub city: String,
    pub zip: String,
    pub email: String,
    pub phone: String,
    pub phone_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ab_variant: Option<AbVariant>,
}

impl LeadRecord {
    pub fn with_variant(variant: AbVariant) -> Self {
        Self {
            ab_variant: Some(variant),
            ..Default::default()
        }
    }

    /// Names of required fields that are blank after trimming.
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("city", &self.city),
            ("zip", &self.zip),
            ("email", &self.email),
            ("phone", &self.phone),
            ("project_type", &self.project_type),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }
}
