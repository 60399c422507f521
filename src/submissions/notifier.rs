use async_trait::async_trait;

use super::types::Submission;
use crate::SiteError;

/// Tells staff a new submission arrived. Failures never fail the request.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, submission: &Submission) -> Result<(), SiteError>;
}

/// Writes one log line per submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, submission: &Submission) -> Result<(), SiteError> {
        log::info!(
            target: "makerspace_admin",
            "msg=\"new submission\", id={}, type=\"{}\"",
            submission.id,
            submission.kind
        );
        Ok(())
    }
}
