use super::{MAX_PHONE_LENGTH, ValidationError};

pub fn validate_required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }

    validate_optional_text(field, Some(trimmed), max)
}

pub fn validate_optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) if value.trim().chars().count() > max => {
            Err(ValidationError::TooLong { field, max })
        }
        _ => Ok(()),
    }
}

/// Optional phone number: digits plus `+ - ( ) .` and spaces, at least 6 digits.
pub fn validate_phone(phone: Option<&str>) -> Result<(), ValidationError> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(());
    };

    if phone.len() > MAX_PHONE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "Phone",
            max: MAX_PHONE_LENGTH,
        });
    }

    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' '));
    let digits = phone.chars().filter(char::is_ascii_digit).count();

    if !allowed || digits < 6 {
        return Err(ValidationError::PhoneInvalidFormat);
    }

    Ok(())
}
