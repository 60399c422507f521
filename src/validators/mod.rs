//! Field checks for the public submission forms.
//!
//! Each check returns a [`ValidationError`] whose `Display` text is what the
//! client sees in the joined "Validation failed: ..." message.

pub mod email;
pub mod name;
pub mod text;

pub use email::validate_email;
pub use name::validate_name;
pub use text::{validate_optional_text, validate_phone, validate_required_text};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_MESSAGE_LENGTH: usize = 5000;
pub const MAX_SHORT_TEXT_LENGTH: usize = 200;
pub const MAX_PHONE_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required(&'static str),
    TooLong { field: &'static str, max: usize },
    EmailInvalidFormat,
    PhoneInvalidFormat,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "{field} is required"),
            Self::TooLong { field, max } => {
                write!(f, "{field} is too long (max {max} characters)")
            }
            Self::EmailInvalidFormat => write!(f, "Invalid email format"),
            Self::PhoneInvalidFormat => write!(f, "Invalid phone number"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Runs every check and keeps the messages of those that failed.
pub fn collect_errors<I>(checks: I) -> Vec<String>
where
    I: IntoIterator<Item = Result<(), ValidationError>>,
{
    checks
        .into_iter()
        .filter_map(Result::err)
        .map(|err| err.to_string())
        .collect()
}
