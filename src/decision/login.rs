use super::{
    DecisionBody, STATUS_OK, STATUS_SERVICE_UNAVAILABLE, STATUS_TOO_MANY_REQUESTS,
    STATUS_UNAUTHORIZED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginInputs {
    pub is_configured: bool,
    pub is_rate_allowed: bool,
    pub retry_after_seconds: u64,
    pub is_password_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDecision {
    pub status: u16,
    pub body: DecisionBody,
    pub should_create_session: bool,
    /// Set only on 429.
    pub retry_after_seconds: Option<u64>,
}

impl LoginDecision {
    fn deny(status: u16, body: DecisionBody) -> Self {
        Self {
            status,
            body,
            should_create_session: false,
            retry_after_seconds: None,
        }
    }
}

/// Decides the outcome of an admin login attempt.
///
/// 503 unconfigured, then 429 throttled, then 401 bad password, else 200
/// with a session to create.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", ret))]
pub fn evaluate_admin_login(inputs: LoginInputs) -> LoginDecision {
    if !inputs.is_configured {
        return LoginDecision::deny(
            STATUS_SERVICE_UNAVAILABLE,
            DecisionBody::error("Authentication not configured", "NOT_CONFIGURED"),
        );
    }

    if !inputs.is_rate_allowed {
        return LoginDecision {
            retry_after_seconds: Some(inputs.retry_after_seconds),
            ..LoginDecision::deny(
                STATUS_TOO_MANY_REQUESTS,
                DecisionBody::error(
                    "Too many login attempts. Please try again later.",
                    "RATE_LIMITED",
                ),
            )
        };
    }

    if !inputs.is_password_valid {
        return LoginDecision::deny(
            STATUS_UNAUTHORIZED,
            DecisionBody::error("Invalid credentials", "INVALID_CREDENTIALS"),
        );
    }

    LoginDecision {
        status: STATUS_OK,
        body: DecisionBody::success(),
        should_create_session: true,
        retry_after_seconds: None,
    }
}
