//! Public form submissions: payloads, validation and the storage contract.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`NewSubmission`] | Student, support or contact payload |
//! | [`Submission`] | Stored record with triage status |
//! | [`SubmissionRepository`] | Insert, list, update and delete |
//! | [`Notifier`] | Staff notification on insert |
//!
//! Enable the `mocks` feature for [`MockSubmissionRepository`] and
//! [`RecordingNotifier`].

mod memory_store;
mod notifier;
mod repository;
mod types;

#[cfg(any(test, feature = "mocks"))]
mod mock;

pub use memory_store::InMemorySubmissionRepository;
pub use notifier::{LoggingNotifier, Notifier};
pub use repository::SubmissionRepository;
pub use types::{
    ContactMessage, DEFAULT_PAGE_SIZE, ListParams, MAX_PAGE_SIZE, NewSubmission, StudentApplication,
    Submission, SubmissionKind, SubmissionQuery, SubmissionStatus, SubmissionUpdate,
    SupportRequest,
};

#[cfg(any(test, feature = "mocks"))]
pub use mock::{MockSubmissionRepository, RecordingNotifier};
