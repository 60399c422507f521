//! Protected submission management. Every handler takes an
//! [`AdminSession`], so the admin gate has already run.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use super::error::AppError;
use super::middleware::{AdminSession, ValidatedJson};
use super::routes::AppState;
use crate::SiteError;
use crate::api::{SubmissionListResponse, SubmissionResponse};
use crate::decision::DecisionBody;
use crate::submissions::{ListParams, SubmissionQuery, SubmissionRepository, SubmissionUpdate};

fn repository(state: &AppState) -> Result<&Arc<dyn SubmissionRepository>, AppError> {
    state
        .submissions
        .as_ref()
        .ok_or(AppError(SiteError::DatastoreUnavailable))
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError(SiteError::InvalidParameters(format!("invalid id '{raw}'"))))
}

/// GET /admin/submissions?type=&status=&limit=&offset=
pub async fn list_submissions(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let repo = repository(&state)?;
    let query = SubmissionQuery::from_params(&params)?;
    let data = repo.list(&query).await?;

    Ok(Json(SubmissionListResponse {
        success: true,
        data,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// PATCH /admin/submissions/{id}
pub async fn update_submission(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<SubmissionUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let repo = repository(&state)?;
    let id = parse_id(&id)?;
    update.validate()?;

    let data = repo.update(id, &update).await?;

    log::info!(
        target: "makerspace_admin",
        "msg=\"submission updated\", id={id}, status=\"{}\", ip=\"{}\"",
        data.status,
        session.client_ip
    );

    Ok(Json(SubmissionResponse {
        success: true,
        data,
    }))
}

/// DELETE /admin/submissions/{id}
pub async fn delete_submission(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let repo = repository(&state)?;
    let id = parse_id(&id)?;

    repo.delete(id).await?;

    log::info!(
        target: "makerspace_admin",
        "msg=\"submission deleted\", id={id}, ip=\"{}\"",
        session.client_ip
    );

    Ok(Json(DecisionBody::success()))
}
