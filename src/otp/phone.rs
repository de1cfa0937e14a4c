//! Phone number helpers.
//!
//! Normalization is a heuristic aimed at US numbers: it never rejects input
//! and will happily produce a malformed E.164 string for international or
//! garbage input. The provider is the one that reports malformed numbers.

/// Strip everything that is not an ASCII digit.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a phone number to an E.164-like string.
///
/// - 10 digits: assumed domestic, prefixed with `+1`.
/// - 11 digits starting with the trunk digit `1`: prefixed with `+`.
/// - anything else: prefixed with `+` verbatim.
pub fn normalize_phone(raw: &str) -> String {
    let digits = digits_only(raw);
    if digits.len() == 10 {
        format!("+1{digits}")
    } else {
        format!("+{digits}")
    }
}

/// Whether the input carries at least 10 digits once non-digits are removed.
pub fn has_min_digits(raw: &str) -> bool {
    digits_only(raw).len() >= 10
}

/// Format a 10-digit number as `(555) 123-4567` for display. Other inputs are
/// returned unchanged.
pub fn format_phone_display(raw: &str) -> String {
    let digits = digits_only(raw);
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        raw.to_string()
    }
}
