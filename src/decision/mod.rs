//! Pure gate engines.
//!
//! Each engine takes a handful of already-computed facts (is the server
//! configured, did the limiter allow this request, did the password match)
//! and returns the single HTTP outcome for the request. They do no I/O and
//! never fail; callers gather the inputs and apply the outputs.
//!
//! Rule order is fixed and first match wins. A misconfigured server answers
//! 503 before anything else, and a throttled client gets 429 before its
//! credentials or payload are judged, so a throttled caller learns nothing
//! about whether its password was right.

mod admin_access;
mod login;
mod submission;

use serde::Serialize;

pub use admin_access::{AdminAccessInputs, evaluate_admin_access};
pub use login::{LoginDecision, LoginInputs, evaluate_admin_login};
pub use submission::{SubmissionGateDecision, SubmissionGateInputs, evaluate_submission_gate};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;
pub const STATUS_SERVICE_UNAVAILABLE: u16 = 503;

/// JSON body produced by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionBody {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl DecisionBody {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>, code: &'static str) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            code: Some(code),
        }
    }
}
