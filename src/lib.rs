//! Admin session and abuse-gating core for the makerspace website.
//!
//! The crate owns the decision logic behind the admin dashboard and the public
//! submission forms:
//!
//! - [`rate_limit`]: per-process fixed-window limiter with a background sweeper
//! - [`crypto`]: constant-time credential comparison and HMAC helpers
//! - [`session`]: stateless, signed, expiring admin session tokens
//! - [`decision`]: pure engines turning gate inputs into HTTP outcomes
//! - [`submissions`]: public form payloads, validation and the storage contract
//! - [`api`]: the axum surface (feature `axum_api`)

pub mod clock;
pub mod config;
pub mod crypto;
pub mod decision;
pub mod rate_limit;
pub mod secret;
pub mod session;
pub mod submissions;
pub mod validators;

pub mod api;

#[cfg(feature = "sqlx_postgres")]
pub mod postgres;

use std::fmt;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AdminSecrets, EnvSecretSource, SecretSource, SiteConfig, StaticSecretSource};
pub use rate_limit::{FixedWindowLimiter, Limit, RateLimitDecision, RateLimiters};
pub use secret::SecretString;
pub use session::SessionTokenCodec;
pub use submissions::{
    InMemorySubmissionRepository, LoggingNotifier, NewSubmission, Notifier, Submission,
    SubmissionKind, SubmissionQuery, SubmissionRepository, SubmissionStatus, SubmissionUpdate,
};

#[cfg(any(test, feature = "mocks"))]
pub use submissions::{MockSubmissionRepository, RecordingNotifier};

/// Errors surfaced by the admin and submission paths.
///
/// Every variant maps to exactly one HTTP status in
/// [`api::axum::AppError`](crate::api). Messages are safe to log; the HTTP
/// layer decides what reaches the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteError {
    /// Required secrets are absent or too weak.
    NotConfigured(String),
    TooManyRequests {
        retry_after: u64,
    },
    Unauthorized,
    Validation(Vec<String>),
    InvalidParameters(String),
    /// No datastore is wired into this process.
    DatastoreUnavailable,
    NotFound,
    Database(String),
    Crypto(String),
    Internal(String),
}

impl std::error::Error for SiteError {}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteError::NotConfigured(what) => write!(f, "{what} not configured"),
            SiteError::TooManyRequests { retry_after } => {
                write!(f, "Too many requests, retry after {retry_after}s")
            }
            SiteError::Unauthorized => write!(f, "Unauthorized"),
            SiteError::Validation(errors) => {
                write!(f, "Validation failed: {}", errors.join(", "))
            }
            SiteError::InvalidParameters(msg) => write!(f, "Invalid parameters: {msg}"),
            SiteError::DatastoreUnavailable => write!(f, "Database not configured"),
            SiteError::NotFound => write!(f, "Not found"),
            SiteError::Database(msg) => write!(f, "Database error: {msg}"),
            SiteError::Crypto(msg) => write!(f, "Crypto error: {msg}"),
            SiteError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}
