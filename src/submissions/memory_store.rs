use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::repository::SubmissionRepository;
use super::types::{NewSubmission, Submission, SubmissionQuery, SubmissionUpdate};
use crate::SiteError;
use crate::clock::{Clock, SystemClock};

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    rows: Vec<Submission>,
}

/// Process-local submission store. Contents are lost on restart.
#[derive(Clone)]
pub struct InMemorySubmissionRepository {
    store: Arc<Mutex<Store>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemorySubmissionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InMemorySubmissionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySubmissionRepository")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn insert(&self, submission: &NewSubmission) -> Result<Submission, SiteError> {
        let now = self.clock.now();
        let mut store = self.lock();
        store.next_id += 1;

        let row = Submission {
            id: store.next_id,
            kind: submission.kind(),
            status: Default::default(),
            name: submission.name().trim().to_owned(),
            email: submission.email().trim().to_owned(),
            details: submission.details(),
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };
        store.rows.push(row.clone());

        Ok(row)
    }

    async fn list(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, SiteError> {
        let store = self.lock();
        let mut rows: Vec<Submission> = store
            .rows
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        drop(store);

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn update(&self, id: i64, update: &SubmissionUpdate) -> Result<Submission, SiteError> {
        let now = self.clock.now();
        let mut store = self.lock();
        let row = store
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(SiteError::NotFound)?;

        update.apply(row, now);
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), SiteError> {
        let mut store = self.lock();
        let before = store.rows.len();
        store.rows.retain(|row| row.id != id);

        if store.rows.len() == before {
            return Err(SiteError::NotFound);
        }

        Ok(())
    }
}
