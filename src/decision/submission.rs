use super::{
    DecisionBody, STATUS_BAD_REQUEST, STATUS_OK, STATUS_SERVICE_UNAVAILABLE,
    STATUS_TOO_MANY_REQUESTS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionGateInputs<'a> {
    pub is_rate_allowed: bool,
    pub retry_after_seconds: u64,
    pub validation_errors: &'a [String],
    pub is_database_configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionGateDecision {
    pub status: u16,
    /// `None` means go ahead and write.
    pub body: Option<DecisionBody>,
    pub retry_after_seconds: Option<u64>,
}

impl SubmissionGateDecision {
    pub fn should_proceed(&self) -> bool {
        self.status == STATUS_OK && self.body.is_none()
    }

    fn deny(status: u16, body: DecisionBody) -> Self {
        Self {
            status,
            body: Some(body),
            retry_after_seconds: None,
        }
    }
}

/// Decides whether a public form submission may be written.
///
/// 429 throttled, then 400 with the joined field errors, then 503 when no
/// datastore is wired in, else 200 with no body. Persisting the record and
/// sending the notification are left to the caller.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", ret))]
pub fn evaluate_submission_gate(inputs: SubmissionGateInputs<'_>) -> SubmissionGateDecision {
    if !inputs.is_rate_allowed {
        return SubmissionGateDecision {
            retry_after_seconds: Some(inputs.retry_after_seconds),
            ..SubmissionGateDecision::deny(
                STATUS_TOO_MANY_REQUESTS,
                DecisionBody::error("Too many requests. Please try again later.", "RATE_LIMITED"),
            )
        };
    }

    if !inputs.validation_errors.is_empty() {
        return SubmissionGateDecision::deny(
            STATUS_BAD_REQUEST,
            DecisionBody::error(
                format!("Validation failed: {}", inputs.validation_errors.join(", ")),
                "VALIDATION_ERROR",
            ),
        );
    }

    if !inputs.is_database_configured {
        return SubmissionGateDecision::deny(
            STATUS_SERVICE_UNAVAILABLE,
            DecisionBody::error("Database not configured", "DATABASE_NOT_CONFIGURED"),
        );
    }

    SubmissionGateDecision {
        status: STATUS_OK,
        body: None,
        retry_after_seconds: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors() -> Vec<String> {
        vec!["Name is required".to_owned(), "Invalid email format".to_owned()]
    }

    #[test]
    fn test_rate_limit_wins_over_everything() {
        let errors = errors();
        let none: Vec<String> = Vec::new();
        for validation_errors in [&errors[..], &none[..]] {
            for is_database_configured in [false, true] {
                let decision = evaluate_submission_gate(SubmissionGateInputs {
                    is_rate_allowed: false,
                    retry_after_seconds: 42,
                    validation_errors,
                    is_database_configured,
                });
                assert_eq!(decision.status, 429);
                assert_eq!(decision.retry_after_seconds, Some(42));
                assert!(!decision.should_proceed());
            }
        }
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let errors = errors();
        for is_database_configured in [false, true] {
            let decision = evaluate_submission_gate(SubmissionGateInputs {
                is_rate_allowed: true,
                retry_after_seconds: 0,
                validation_errors: &errors,
                is_database_configured,
            });
            assert_eq!(decision.status, 400);
            let body = decision.body.unwrap();
            assert_eq!(
                body.error.as_deref(),
                Some("Validation failed: Name is required, Invalid email format")
            );
            assert_eq!(body.code, Some("VALIDATION_ERROR"));
        }
    }

    #[test]
    fn test_missing_database_is_503() {
        let decision = evaluate_submission_gate(SubmissionGateInputs {
            is_rate_allowed: true,
            retry_after_seconds: 0,
            validation_errors: &[],
            is_database_configured: false,
        });
        assert_eq!(decision.status, 503);
        assert_eq!(
            decision.body.unwrap().error.as_deref(),
            Some("Database not configured")
        );
    }

    #[test]
    fn test_clean_submission_proceeds() {
        let decision = evaluate_submission_gate(SubmissionGateInputs {
            is_rate_allowed: true,
            retry_after_seconds: 0,
            validation_errors: &[],
            is_database_configured: true,
        });
        assert_eq!(decision.status, 200);
        assert!(decision.body.is_none());
        assert!(decision.should_proceed());
    }
}
