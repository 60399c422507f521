use serde::{Deserialize, Serialize};

use crate::submissions::Submission;
use crate::{SecretString, SiteError};

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: SecretString,
}

// Response DTOs

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmissionCreatedResponse {
    pub success: bool,
    pub message: String,
    pub data: Submission,
}

#[derive(Debug, Serialize)]
pub struct SubmissionListResponse {
    pub success: bool,
    pub data: Vec<Submission>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub data: Submission,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

impl From<&SiteError> for ErrorResponse {
    fn from(err: &SiteError) -> Self {
        let (error, code) = match err {
            SiteError::NotConfigured(_) => (err.to_string(), "NOT_CONFIGURED"),
            SiteError::TooManyRequests { .. } => (
                "Too many requests. Please try again later.".to_owned(),
                "RATE_LIMITED",
            ),
            SiteError::Unauthorized => (err.to_string(), "UNAUTHORIZED"),
            SiteError::Validation(_) => (err.to_string(), "VALIDATION_ERROR"),
            SiteError::InvalidParameters(_) => (err.to_string(), "INVALID_PARAMETERS"),
            SiteError::DatastoreUnavailable => (err.to_string(), "DATABASE_NOT_CONFIGURED"),
            SiteError::NotFound => (err.to_string(), "NOT_FOUND"),
            SiteError::Database(_) => (INTERNAL_ERROR_MESSAGE.to_owned(), "DATABASE_ERROR"),
            SiteError::Crypto(_) | SiteError::Internal(_) => {
                (INTERNAL_ERROR_MESSAGE.to_owned(), "INTERNAL_ERROR")
            }
        };

        ErrorResponse {
            success: false,
            error,
            code: code.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_details_are_not_exposed() {
        let body = ErrorResponse::from(&SiteError::Database("relation \"x\" missing".to_owned()));
        assert_eq!(body.error, INTERNAL_ERROR_MESSAGE);
        assert_eq!(body.code, "DATABASE_ERROR");
        assert!(!body.success);
    }

    #[test]
    fn test_validation_message_is_joined() {
        let body = ErrorResponse::from(&SiteError::Validation(vec![
            "Name is required".to_owned(),
            "Message is required".to_owned(),
        ]));
        assert_eq!(
            body.error,
            "Validation failed: Name is required, Message is required"
        );
    }

    #[test]
    fn test_login_request_tolerates_missing_password() {
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(req.password.is_empty());
    }
}
