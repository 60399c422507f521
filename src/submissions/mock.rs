#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::memory_store::InMemorySubmissionRepository;
use super::notifier::Notifier;
use super::repository::SubmissionRepository;
use super::types::{NewSubmission, Submission, SubmissionQuery, SubmissionUpdate};
use crate::SiteError;

/// In-memory repository whose calls can be made to fail on demand.
#[derive(Clone, Default)]
pub struct MockSubmissionRepository {
    inner: InMemorySubmissionRepository,
    fail: Arc<AtomicBool>,
}

impl MockSubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following call returns [`SiteError::Database`].
    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn check(&self) -> Result<(), SiteError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SiteError::Database("mock failure".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl SubmissionRepository for MockSubmissionRepository {
    async fn insert(&self, submission: &NewSubmission) -> Result<Submission, SiteError> {
        self.check()?;
        self.inner.insert(submission).await
    }

    async fn list(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, SiteError> {
        self.check()?;
        self.inner.list(query).await
    }

    async fn update(&self, id: i64, update: &SubmissionUpdate) -> Result<Submission, SiteError> {
        self.check()?;
        self.inner.update(id, update).await
    }

    async fn delete(&self, id: i64) -> Result<(), SiteError> {
        self.check()?;
        self.inner.delete(id).await
    }
}

/// Keeps every notified submission; optionally fails after recording.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub notified: Arc<Mutex<Vec<Submission>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn count(&self) -> usize {
        self.notified.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, submission: &Submission) -> Result<(), SiteError> {
        self.notified.lock().unwrap().push(submission.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(SiteError::Internal("notification failed".to_owned()));
        }
        Ok(())
    }
}
