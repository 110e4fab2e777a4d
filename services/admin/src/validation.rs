//! Input validation utilities
//!
//! These checks are advisory: they spare the backend obviously bad input,
//! but the backend's own answer remains authoritative.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Minimum length of a club name
pub const MIN_CLUB_NAME_LENGTH: usize = 3;

/// Minimum length of a password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// One refused field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All refused fields of one form submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a single check against `field`
    pub fn check(&mut self, field: &'static str, outcome: Result<(), String>) -> &mut Self {
        if let Err(message) = outcome {
            self.errors.push(FieldError { field, message });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message recorded for `field`, if any
    pub fn field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok` when no field was refused
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate that a field is not blank
pub fn validate_required(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    Ok(())
}

/// Validate the trimmed length of a field
pub fn validate_min_length(label: &str, value: &str, min: usize) -> Result<(), String> {
    if value.trim().chars().count() < min {
        return Err(format!(
            "{} must be at least {} characters long",
            label, min
        ));
    }
    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();

    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate an email that may be left empty
pub fn validate_optional_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Ok(());
    }
    validate_email(email)
}

/// Validate a phone number that may be left empty
pub fn validate_optional_phone(phone: &str) -> Result<(), String> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Ok(());
    }

    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^\+?[0-9 ()-]{7,20}$").expect("Failed to compile phone regex")
    });

    if !regex.is_match(phone) {
        return Err("Invalid phone number".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

/// Validate that `name` does not already appear among `existing`
///
/// Names are compared trimmed and case-insensitively.
pub fn validate_unique_name<'a>(
    label: &str,
    name: &str,
    existing: impl IntoIterator<Item = &'a str>,
) -> Result<(), String> {
    let wanted = normalize_name(name);
    if existing
        .into_iter()
        .any(|other| normalize_name(other) == wanted)
    {
        return Err(format!("A {} named \"{}\" already exists", label, name.trim()));
    }
    Ok(())
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
