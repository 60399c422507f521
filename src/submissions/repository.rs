use async_trait::async_trait;

use super::types::{NewSubmission, Submission, SubmissionQuery, SubmissionUpdate};
use crate::SiteError;

/// Storage for public form submissions.
///
/// `update` and `delete` return [`SiteError::NotFound`] for an unknown id.
/// Backend failures surface as [`SiteError::Database`].
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn insert(&self, submission: &NewSubmission) -> Result<Submission, SiteError>;

    /// Newest first.
    async fn list(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, SiteError>;

    async fn update(&self, id: i64, update: &SubmissionUpdate) -> Result<Submission, SiteError>;

    async fn delete(&self, id: i64) -> Result<(), SiteError>;
}
