/// Input validators
///
/// Every value that reaches a store goes through one of these first.
/// Each validator returns the normalized (trimmed) value on success.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 100;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MIN_PHONE_LENGTH: usize = 6;
const MAX_PHONE_LENGTH: usize = 32;
const MIN_PHONE_DIGITS: usize = 6;
const MAX_NOTES_LENGTH: usize = 2000;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap();

    // digits, spaces, and the usual separators; "x" for extensions
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9 ().x-]+$").unwrap();
}

/// Validates an email address: length, RFC 5322 simplified format, and a
/// local part of at most 64 characters.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email"));
    }

    Ok(trimmed.to_string())
}

/// Validates a login handle. Usernames appear in verification URLs, so only
/// URL-safe characters are allowed.
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username"));
    }

    if trimmed.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort("username", MIN_USERNAME_LENGTH));
    }

    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username", MAX_USERNAME_LENGTH));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username"));
    }

    Ok(trimmed.to_string())
}

/// Validates a person's first or last name.
pub fn is_valid_name(field: &'static str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field, MAX_NAME_LENGTH));
    }

    if has_suspicious_name_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent(field));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_phone(phone: &str) -> Result<String, ValidationError> {
    let trimmed = phone.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("phone_number"));
    }

    if trimmed.len() < MIN_PHONE_LENGTH {
        return Err(ValidationError::TooShort("phone_number", MIN_PHONE_LENGTH));
    }

    if trimmed.len() > MAX_PHONE_LENGTH {
        return Err(ValidationError::TooLong("phone_number", MAX_PHONE_LENGTH));
    }

    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if !PHONE_REGEX.is_match(trimmed) || digits < MIN_PHONE_DIGITS {
        return Err(ValidationError::InvalidFormat("phone_number"));
    }

    Ok(trimmed.to_string())
}

/// Birth dates must not lie after `today`.
pub fn is_valid_birth_date(birth_date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if birth_date > today {
        return Err(ValidationError::InFuture("birth_date"));
    }
    Ok(birth_date)
}

/// Free-text notes. Empty notes collapse to `None`.
pub fn is_valid_notes(notes: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong("additional_data", MAX_NOTES_LENGTH));
    }

    if notes.contains('\0') {
        return Err(ValidationError::SuspiciousContent("additional_data"));
    }

    Ok(Some(notes.to_string()))
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    if let Some(at_pos) = email.find('@') {
        if at_pos > 64 {
            return true;
        }
    }

    email.matches('@').count() != 1 || email.contains('\0')
}

fn has_suspicious_name_patterns(name: &str) -> bool {
    if name.chars().any(|c| c.is_control()) {
        return true;
    }

    // Excessive special characters
    let special_char_count = name
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '-' | '.' | '\''))
        .count();

    special_char_count > 3
}
