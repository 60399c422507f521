//! Fixed-window rate limiting.
//!
//! Each use-case (login, admin API, public submissions) gets its own
//! [`FixedWindowLimiter`] so their counters never interfere. The limiters are
//! built once at startup in [`RateLimiters`] and handed to request handlers.

mod limit;
mod limiter;
mod sweeper;

use std::sync::Arc;

pub use limit::Limit;
pub use limiter::{FixedWindowLimiter, RateLimitDecision};
pub use sweeper::{SweeperHandle, spawn_sweeper};

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;

/// The process-wide set of limiters.
#[derive(Debug, Clone)]
pub struct RateLimiters {
    pub login: Arc<FixedWindowLimiter>,
    pub admin_api: Arc<FixedWindowLimiter>,
    pub submissions: Arc<FixedWindowLimiter>,
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            login: Arc::new(FixedWindowLimiter::with_clock(
                "login",
                config.login.clone(),
                Arc::clone(&clock),
            )),
            admin_api: Arc::new(FixedWindowLimiter::with_clock(
                "admin_api",
                config.admin_api.clone(),
                Arc::clone(&clock),
            )),
            submissions: Arc::new(FixedWindowLimiter::with_clock(
                "submissions",
                config.submissions.clone(),
                clock,
            )),
        }
    }

    /// Starts one sweeper per limiter. Keep the handles for the lifetime of
    /// the server; dropping them stops the sweeps.
    pub fn spawn_sweepers(&self) -> Vec<SweeperHandle> {
        [&self.login, &self.admin_api, &self.submissions]
            .into_iter()
            .map(|limiter| spawn_sweeper(Arc::clone(limiter)))
            .collect()
    }
}

pub fn login_key(client_ip: &str) -> String {
    format!("login:{client_ip}")
}

pub fn admin_key(client_ip: &str) -> String {
    format!("admin:{client_ip}")
}

pub fn submission_key(client_ip: &str) -> String {
    format!("submit:{client_ip}")
}
