use crate::SiteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAccessInputs {
    pub is_configured: bool,
    pub is_rate_allowed: bool,
    pub retry_after_seconds: u64,
    pub is_session_valid: bool,
}

/// Gate for every protected admin action, ordered like the login engine:
/// unconfigured, throttled, unauthenticated, then allowed.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", ret))]
pub fn evaluate_admin_access(inputs: AdminAccessInputs) -> Result<(), SiteError> {
    if !inputs.is_configured {
        return Err(SiteError::NotConfigured("Authentication".to_owned()));
    }

    if !inputs.is_rate_allowed {
        return Err(SiteError::TooManyRequests {
            retry_after: inputs.retry_after_seconds,
        });
    }

    if !inputs.is_session_valid {
        return Err(SiteError::Unauthorized);
    }

    Ok(())
}
