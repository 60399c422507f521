use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use super::{admin, cors, handlers, middleware};
use crate::clock::{Clock, SystemClock};
use crate::config::{SecretSource, SiteConfig};
use crate::rate_limit::RateLimiters;
use crate::submissions::{LoggingNotifier, Notifier, SubmissionRepository};

/// Shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub secrets: Arc<dyn SecretSource>,
    pub config: Arc<SiteConfig>,
    pub limiters: RateLimiters,
    pub clock: Arc<dyn Clock>,
    /// `None` when no datastore is wired in; submission writes answer 503.
    pub submissions: Option<Arc<dyn SubmissionRepository>>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(secrets: Arc<dyn SecretSource>, config: SiteConfig) -> Self {
        Self::with_clock(secrets, config, Arc::new(SystemClock))
    }

    /// Limiters and token checks all read time from `clock`.
    pub fn with_clock(
        secrets: Arc<dyn SecretSource>,
        config: SiteConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secrets,
            limiters: RateLimiters::with_clock(&config.rate_limit, Arc::clone(&clock)),
            config: Arc::new(config),
            clock,
            submissions: None,
            notifier: Arc::new(LoggingNotifier),
        }
    }

    #[must_use]
    pub fn with_submissions(mut self, repo: Arc<dyn SubmissionRepository>) -> Self {
        self.submissions = Some(repo);
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("limiters", &self.limiters)
            .field("has_submissions", &self.submissions.is_some())
            .finish_non_exhaustive()
    }
}

/// `/admin/auth` and the protected `/admin/submissions` routes.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/auth",
            post(handlers::login)
                .delete(handlers::logout)
                .get(handlers::auth_status),
        )
        .route("/admin/submissions", get(admin::list_submissions))
        .route(
            "/admin/submissions/{id}",
            patch(admin::update_submission).delete(admin::delete_submission),
        )
}

/// Public form endpoints.
pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/submissions/student", post(handlers::submit_student))
        .route("/submissions/support", post(handlers::submit_support))
        .route("/submissions/contact", post(handlers::submit_contact))
}

/// The full application: routes, request ids, 5xx logging and CORS.
pub fn router(state: AppState) -> Router {
    let cors = cors::layer(&state.config.allowed_origins);

    let mut app = Router::new()
        .merge(admin_routes())
        .merge(submission_routes())
        .layer(axum::middleware::from_fn(middleware::log_server_errors))
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    app
}
