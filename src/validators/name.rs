use super::{MAX_NAME_LENGTH, ValidationError};

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Required("Name"));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "Name",
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}
