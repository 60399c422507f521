//! HTTP handlers for admin authentication and the public forms.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::{RETRY_AFTER, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use super::error::AppError;
use super::middleware::{ClientIp, has_valid_session, rejection_message};
use super::routes::AppState;
use crate::api::{AuthStatusResponse, LoginRequest, SubmissionCreatedResponse};
use crate::crypto::verify_credential;
use crate::decision::{
    DecisionBody, LoginInputs, STATUS_UNAUTHORIZED, SubmissionGateInputs, evaluate_admin_login,
    evaluate_submission_gate,
};
use crate::rate_limit::{login_key, submission_key};
use crate::session::{removal_cookie, session_cookie};
use crate::submissions::{
    ContactMessage, NewSubmission, StudentApplication, SupportRequest,
};
use crate::{SessionTokenCodec, SiteError};

/// Renders an engine decision: status, JSON body and an optional
/// `Retry-After`.
fn decision_response(status: u16, body: DecisionBody, retry_after: Option<u64>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(body)).into_response();

    if let Some(seconds) = retry_after {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(seconds));
    }

    response
}

fn cookie_header(cookie: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(cookie)
        .map_err(|_| AppError(SiteError::Internal("cookie is not a valid header".to_owned())))
}

/// Admin login.
///
/// POST /admin/auth
#[cfg_attr(feature = "tracing", tracing::instrument(name = "admin_login", skip_all))]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let secrets = state.secrets.load();
    let is_configured = secrets.is_configured();
    let rate = state.limiters.login.check(&login_key(&client_ip));

    // Only compare once every earlier gate has passed. An unreadable body
    // counts as a wrong password.
    let is_password_valid = is_configured
        && rate.allowed
        && payload.as_ref().is_ok_and(|Json(body)| {
            secrets.admin_password.as_ref().is_some_and(|configured| {
                verify_credential(body.password.expose_secret(), configured.expose_secret())
            })
        });

    let decision = evaluate_admin_login(LoginInputs {
        is_configured,
        is_rate_allowed: rate.allowed,
        retry_after_seconds: rate.retry_after_seconds,
        is_password_valid,
    });

    if !decision.should_create_session {
        if decision.status == STATUS_UNAUTHORIZED {
            if let Err(rejection) = &payload {
                log::debug!(
                    target: "makerspace_admin",
                    "msg=\"login body rejected\", reason=\"{}\"",
                    rejection_message(rejection)
                );
            }
            log::warn!(
                target: "makerspace_admin",
                "msg=\"admin login failed\", ip=\"{client_ip}\""
            );
        }
        return Ok(decision_response(
            decision.status,
            decision.body,
            decision.retry_after_seconds,
        ));
    }

    let lifetime = state.config.session_lifetime;
    let token = SessionTokenCodec::from_secrets(&secrets, lifetime)?
        .with_clock(state.clock.clone())
        .create_token()?;
    let cookie = session_cookie(&secrets.cookie_name, &token, lifetime, secrets.production);

    log::info!(target: "makerspace_admin", "msg=\"admin login\", ip=\"{client_ip}\"");

    let mut response = decision_response(decision.status, decision.body, None);
    response
        .headers_mut()
        .insert(SET_COOKIE, cookie_header(&cookie)?);
    Ok(response)
}

/// Clears the session cookie. Always succeeds.
///
/// DELETE /admin/auth
pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    let secrets = state.secrets.load();
    let cookie = removal_cookie(&secrets.cookie_name, secrets.production);

    let mut response = (StatusCode::OK, Json(DecisionBody::success())).into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, cookie_header(&cookie)?);
    Ok(response)
}

/// GET /admin/auth
pub async fn auth_status(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let secrets = state.secrets.load();
    let authenticated = has_valid_session(&state, &secrets, &headers);

    Json(AuthStatusResponse { authenticated })
}

/// POST /submissions/student
pub async fn submit_student(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<StudentApplication>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = payload.map(|Json(body)| NewSubmission::Student(body));
    submit(state, client_ip, payload).await
}

/// POST /submissions/support
pub async fn submit_support(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<SupportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = payload.map(|Json(body)| NewSubmission::Support(body));
    submit(state, client_ip, payload).await
}

/// POST /submissions/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<ContactMessage>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = payload.map(|Json(body)| NewSubmission::Contact(body));
    submit(state, client_ip, payload).await
}

/// The body is parsed before the gate runs but its rejection is only
/// reported after the rate check, so throttled callers always see 429.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(state, payload)))]
async fn submit(
    state: AppState,
    client_ip: String,
    payload: Result<NewSubmission, JsonRejection>,
) -> Result<Response, AppError> {
    let rate = state.limiters.submissions.check(&submission_key(&client_ip));

    let (submission, validation_errors) = match payload {
        Ok(submission) => {
            let errors = submission.validate();
            (Some(submission), errors)
        }
        Err(rejection) => (None, vec![rejection_message(&rejection)]),
    };

    let decision = evaluate_submission_gate(SubmissionGateInputs {
        is_rate_allowed: rate.allowed,
        retry_after_seconds: rate.retry_after_seconds,
        validation_errors: &validation_errors,
        is_database_configured: state.submissions.is_some(),
    });

    if let Some(body) = decision.body {
        return Ok(decision_response(
            decision.status,
            body,
            decision.retry_after_seconds,
        ));
    }

    let (Some(repo), Some(submission)) = (state.submissions.as_ref(), submission) else {
        return Err(AppError(SiteError::Internal(
            "submission gate passed without a payload or datastore".to_owned(),
        )));
    };

    let stored = repo.insert(&submission).await?;

    if let Err(err) = state.notifier.notify(&stored).await {
        log::warn!(
            target: "makerspace_admin",
            "msg=\"notification failed\", id={}, error=\"{err}\"",
            stored.id
        );
    }

    Ok((
        StatusCode::OK,
        Json(SubmissionCreatedResponse {
            success: true,
            message: "Submission received".to_owned(),
            data: stored,
        }),
    )
        .into_response())
}
