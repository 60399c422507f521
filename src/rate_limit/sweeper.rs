use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::limiter::FixedWindowLimiter;

/// Background task that periodically drops expired rate-limit records.
///
/// Correctness never depends on it: [`FixedWindowLimiter::check`] treats a
/// closed window as absent. The sweep only bounds memory when many distinct
/// keys pass through. Dropping the handle stops the task.
#[derive(Debug)]
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns a sweeper ticking every [`Limit::sweep_interval`](super::Limit::sweep_interval).
///
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper(limiter: Arc<FixedWindowLimiter>) -> SweeperHandle {
    let period = limiter.limit().sweep_interval();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let swept = limiter.sweep_expired();
            if swept > 0 {
                log::debug!(
                    target: "makerspace_admin",
                    "msg=\"rate limit records swept\", limiter=\"{}\", swept={swept}",
                    limiter.name()
                );
            }
        }
    });

    SweeperHandle { task }
}
