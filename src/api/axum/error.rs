use axum::Json;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::SiteError;
use crate::api::ErrorResponse;

/// converts `SiteError` into appropriate HTTP responses
#[derive(Debug)]
pub struct AppError(pub SiteError);

impl From<SiteError> for AppError {
    fn from(err: SiteError) -> Self {
        Self(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SiteError::NotConfigured(_) | SiteError::DatastoreUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SiteError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            SiteError::Unauthorized => StatusCode::UNAUTHORIZED,
            SiteError::Validation(_) | SiteError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            SiteError::NotFound => StatusCode::NOT_FOUND,
            SiteError::Database(_) | SiteError::Crypto(_) | SiteError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            log::error!(target: "makerspace_admin", "msg=\"request failed\", error=\"{}\"", self.0);
        }

        let mut response = (status, Json(ErrorResponse::from(&self.0))).into_response();

        if let SiteError::TooManyRequests { retry_after } = self.0 {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        }

        response
    }
}
