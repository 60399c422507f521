use chrono::Duration;

/// Longest gap between two sweeps of expired records.
const MAX_SWEEP_INTERVAL_SECS: i64 = 5 * 60;

/// Request budget for one limiter: at most `max_requests` per `window`.
#[derive(Debug, Clone)]
pub struct Limit {
    pub(crate) max_requests: u32,
    pub(crate) window: Duration,
}

impl Limit {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    #[must_use]
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::minutes(1))
    }

    #[must_use]
    pub fn per_hour(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::hours(1))
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn window_secs(&self) -> u64 {
        u64::try_from(self.window.num_seconds()).unwrap_or(0)
    }

    /// `min(window, 5 minutes)`, never below one second.
    pub fn sweep_interval(&self) -> std::time::Duration {
        let secs = self
            .window
            .num_seconds()
            .clamp(1, MAX_SWEEP_INTERVAL_SECS);
        std::time::Duration::from_secs(u64::try_from(secs).unwrap_or(1))
    }
}
