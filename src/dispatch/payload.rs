//! Wire shape of a lead sent to the webhooks.

use serde::Serialize;

use crate::quiz::record::LeadRecord;

/// Flattened, trimmed lead. Field order matches the form fields sent to the
/// spreadsheet backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadPayload {
    pub name: String,
    pub project_type: String,
    pub city: String,
    pub zip: String,
    pub email: String,
    pub phone: String,
    /// `"yes"` or `"no"`.
    pub phone_verified: String,
    /// `"A"`, `"B"`, or `"unknown"`.
    pub ab_variant: String,
}

impl LeadPayload {
    pub fn from_record(record: &LeadRecord) -> Self {
        Self {
            name: record.name.trim().to_string(),
            project_type: record.project_type.clone(),
            city: record.city.trim().to_string(),
            zip: record.zip.trim().to_string(),
            email: record.email.trim().to_string(),
            phone: record.phone.trim().to_string(),
            phone_verified: if record.phone_verified { "yes" } else { "no" }.to_string(),
            ab_variant: record
                .ab_variant
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    /// `(name, value)` pairs for form encoding.
    pub fn form_fields(&self) -> [(&'static str, &str); 8] {
        [
            ("name", self.name.as_str()),
            ("project_type", self.project_type.as_str()),
            ("city", self.city.as_str()),
            ("zip", self.zip.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("phone_verified", self.phone_verified.as_str()),
            ("ab_variant", self.ab_variant.as_str()),
        ]
    }
}
