//! Input validation functions
//!
//! Uses the `validator` crate for email syntax; everything else is
//! presence checking.

use validator::ValidateEmail;

/// Names of the fields that are absent or blank after trimming.
pub fn missing_fields<'a>(fields: &[(&'a str, Option<&str>)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect()
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    if !email.validate_email() {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Usernames are stored and looked up lowercase.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Blank optional inputs count as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
