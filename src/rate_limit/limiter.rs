use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::limit::Limit;
use crate::clock::{Clock, SystemClock};

/// Outcome of a single [`FixedWindowLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Zero when allowed, otherwise at least one.
    pub retry_after_seconds: u64,
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn is_limited(&self) -> bool {
        !self.allowed
    }
}

#[derive(Debug, Clone)]
struct WindowRecord {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Per-process fixed-window counter keyed by an opaque string.
///
/// A key's window opens on its first request and closes `window` later;
/// the next request after that opens a fresh window. Because windows are
/// fixed, a client can spend a full budget at the end of one window and
/// another at the start of the next, so up to twice the limit can land in a
/// short span around the boundary.
///
/// Counters are not shared between processes: N instances allow N times the
/// limit in aggregate.
///
/// # Example
///
/// ```rust
/// use makerspace_admin::rate_limit::{FixedWindowLimiter, Limit};
///
/// let limiter = FixedWindowLimiter::new("login", Limit::per_minute(2));
/// assert!(limiter.check("login:203.0.113.5").allowed);
/// assert!(limiter.check("login:203.0.113.5").allowed);
/// assert!(!limiter.check("login:203.0.113.5").allowed);
/// ```
pub struct FixedWindowLimiter {
    name: String,
    limit: Limit,
    clock: Arc<dyn Clock>,
    records: Mutex<HashMap<String, WindowRecord>>,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(name: impl Into<String>, limit: Limit) -> Self {
        Self::with_clock(name, limit, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(name: impl Into<String>, limit: Limit, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            limit,
            clock,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limit(&self) -> &Limit {
        &self.limit
    }

    /// Counts one request against `key` and decides whether it may proceed.
    ///
    /// The lookup, the comparison and the increment happen under a single
    /// lock guard with no await point in between.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let max = self.limit.max_requests;
        let mut records = self.lock();

        match records.get_mut(key) {
            Some(record) if record.reset_at > now => {
                if record.count >= max {
                    let retry_after_seconds = retry_after_secs(record.reset_at, now);

                    log::warn!(
                        target: "makerspace_admin",
                        "msg=\"rate limited\", limiter=\"{}\", retry_after={retry_after_seconds}",
                        self.name
                    );

                    RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        retry_after_seconds,
                    }
                } else {
                    record.count += 1;
                    RateLimitDecision {
                        allowed: true,
                        remaining: max.saturating_sub(record.count),
                        retry_after_seconds: 0,
                    }
                }
            }
            _ => {
                records.insert(
                    key.to_owned(),
                    WindowRecord {
                        count: 1,
                        reset_at: now + self.limit.window,
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: max.saturating_sub(1),
                    retry_after_seconds: 0,
                }
            }
        }
    }

    /// Requests left for `key` without counting one.
    pub fn remaining(&self, key: &str) -> u32 {
        let now = self.clock.now();
        let max = self.limit.max_requests;

        self.lock().get(key).map_or(max, |record| {
            if record.reset_at <= now {
                max
            } else {
                max.saturating_sub(record.count)
            }
        })
    }

    pub fn clear(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Drops every record whose window has closed. Returns how many went.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, record| record.reset_at > now);
        before.saturating_sub(records.len())
    }

    /// Number of tracked keys, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned map still holds valid counters; keep serving from it.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, WindowRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for FixedWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedWindowLimiter")
            .field("name", &self.name)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

/// `ceil((reset_at - now) / 1s)`, floored at one second.
fn retry_after_secs(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (reset_at - now).num_milliseconds().max(0);
    let secs = u64::try_from(millis).unwrap_or(0).div_ceil(1000);
    secs.max(1)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::clock::ManualClock;

    fn limiter_with_clock(limit: Limit) -> (FixedWindowLimiter, ManualClock) {
        let clock = ManualClock::default();
        let limiter = FixedWindowLimiter::with_clock("test", limit, Arc::new(clock.clone()));
        (limiter, clock)
    }

    #[test]
    fn test_allows_exactly_limit_requests() {
        let (limiter, _clock) = limiter_with_clock(Limit::per_minute(3));

        for i in 0..3 {
            let decision = limiter.check("login:203.0.113.5");
            assert!(decision.allowed, "Request {} should be allowed", i + 1);
            assert_eq!(decision.remaining, 2 - i);
            assert_eq!(decision.retry_after_seconds, 0);
        }

        let decision = limiter.check("login:203.0.113.5");
        assert!(decision.is_limited());
        assert_eq!(decision.remaining, 0);
        assert!(decision.retry_after_seconds >= 1);
    }

    #[test]
    fn test_retry_after_counts_down_and_rounds_up() {
        let (limiter, clock) = limiter_with_clock(Limit::per_minute(1));

        limiter.check("k");
        assert_eq!(limiter.check("k").retry_after_seconds, 60);

        clock.advance(Duration::milliseconds(59_500));
        assert_eq!(limiter.check("k").retry_after_seconds, 1);

        clock.advance(Duration::milliseconds(499));
        assert_eq!(limiter.check("k").retry_after_seconds, 1);
    }

    #[test]
    fn test_window_reset_starts_new_count() {
        let (limiter, clock) = limiter_with_clock(Limit::per_minute(2));

        limiter.check("k");
        limiter.check("k");
        assert!(limiter.check("k").is_limited());

        clock.advance(Duration::minutes(1));

        let decision = limiter.check("k");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[test]
    fn test_boundary_burst_is_possible() {
        let (limiter, clock) = limiter_with_clock(Limit::per_minute(3));

        clock.advance(Duration::seconds(1));
        limiter.check("k");
        clock.advance(Duration::seconds(58));
        assert!(limiter.check("k").allowed);
        assert!(limiter.check("k").allowed);

        clock.advance(Duration::seconds(2));
        for _ in 0..3 {
            assert!(limiter.check("k").allowed);
        }
        assert!(limiter.check("k").is_limited());
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _clock) = limiter_with_clock(Limit::per_minute(1));

        assert!(limiter.check("login:198.51.100.1").allowed);
        assert!(limiter.check("login:198.51.100.1").is_limited());
        assert!(limiter.check("login:198.51.100.2").allowed);
    }

    #[test]
    fn test_limiters_do_not_share_counts() {
        let clock = Arc::new(ManualClock::default());
        let login = FixedWindowLimiter::with_clock("login", Limit::per_minute(1), clock.clone());
        let submit = FixedWindowLimiter::with_clock("submit", Limit::per_minute(1), clock);

        assert!(login.check("203.0.113.5").allowed);
        assert!(login.check("203.0.113.5").is_limited());
        assert!(submit.check("203.0.113.5").allowed);
    }

    #[test]
    fn test_remaining_does_not_count() {
        let (limiter, clock) = limiter_with_clock(Limit::per_minute(5));

        assert_eq!(limiter.remaining("k"), 5);
        limiter.check("k");
        limiter.check("k");
        assert_eq!(limiter.remaining("k"), 3);
        assert_eq!(limiter.remaining("k"), 3);

        clock.advance(Duration::minutes(2));
        assert_eq!(limiter.remaining("k"), 5);
    }

    #[test]
    fn test_clear() {
        let (limiter, _clock) = limiter_with_clock(Limit::per_minute(1));

        limiter.check("k");
        assert!(limiter.check("k").is_limited());

        limiter.clear("k");
        assert!(limiter.check("k").allowed);
    }

    #[test]
    fn test_sweep_expired_removes_only_closed_windows() {
        let (limiter, clock) = limiter_with_clock(Limit::per_minute(5));

        limiter.check("old");
        clock.advance(Duration::seconds(30));
        limiter.check("fresh");
        clock.advance(Duration::seconds(31));

        assert_eq!(limiter.len(), 2);
        assert_eq!(limiter.sweep_expired(), 1);
        assert_eq!(limiter.len(), 1);
        assert_eq!(limiter.remaining("fresh"), 4);
    }

    #[test]
    fn test_concurrent_checks_never_exceed_limit() {
        let limiter = Arc::new(FixedWindowLimiter::new("test", Limit::per_minute(50)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..25)
                        .filter(|_| limiter.check("shared").allowed)
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }
}
