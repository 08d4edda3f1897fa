use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+|[0-9])[0-9]{9,15}$").expect("valid phone regex"));

/// Lowercase and trim an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Email validation
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(anyhow!("Email cannot be empty"));
    }

    if email.len() > 255 {
        return Err(anyhow!("Email cannot be longer than 255 characters"));
    }

    if !EMAIL_RE.is_match(email) {
        return Err(anyhow!("Invalid email format"));
    }

    Ok(())
}

/// Display name validation
pub fn validate_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(anyhow!("Name cannot be empty"));
    }

    if !(2..=50).contains(&len) {
        return Err(anyhow!("Name must be between 2 and 50 characters"));
    }

    Ok(())
}

/// Phone numbers may contain spaces, parentheses and dashes as separators
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-'))
        .collect();
    PHONE_RE.is_match(&digits)
}

pub fn validate_phone(phone: &str) -> Result<()> {
    if !is_valid_phone(phone) {
        return Err(anyhow!("Invalid phone number format"));
    }
    Ok(())
}

/// Catalog text fields must not be blank
pub fn validate_required(value: &str, field_name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{} cannot be empty", field_name));
    }
    Ok(())
}
