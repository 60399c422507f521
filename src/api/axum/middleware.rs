use std::net::SocketAddr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, MatchedPath, Request};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;
use serde::de::DeserializeOwned;

use super::error::AppError;
use super::routes::AppState;
use crate::config::AdminSecrets;
use crate::decision::{AdminAccessInputs, evaluate_admin_access};
use crate::rate_limit::admin_key;
use crate::session::cookie_value;
use crate::{SessionTokenCodec, SiteError};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Best guess at the caller's address for rate-limit keys.
///
/// Proxy headers are trusted as sent: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then `CF-Connecting-IP`, then the socket peer.
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded_for = header_str(headers, &X_FORWARDED_FOR)
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());

    forwarded_for
        .or_else(|| header_str(headers, &X_REAL_IP))
        .or_else(|| header_str(headers, &CF_CONNECTING_IP))
        .map(ToOwned::to_owned)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_owned())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn peer_addr(parts: &Parts) -> Option<SocketAddr> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Caller address as computed by [`extract_client_ip`].
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(extract_client_ip(&parts.headers, peer_addr(parts))))
    }
}

/// True when the request carries a session cookie that verifies under the
/// current secrets. Always false when authentication is not configured.
pub(crate) fn has_valid_session(state: &AppState, secrets: &AdminSecrets, headers: &HeaderMap) -> bool {
    if !secrets.is_configured() {
        return false;
    }

    let Some(token) = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|raw| cookie_value(raw, &secrets.cookie_name))
    else {
        return false;
    };

    match SessionTokenCodec::from_secrets(secrets, state.config.session_lifetime) {
        Ok(codec) => codec.with_clock(state.clock.clone()).verify_token(token),
        Err(_) => false,
    }
}

/// A request that passed the admin gate: configured, within the admin API
/// limit and carrying a valid session cookie.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub client_ip: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secrets = state.secrets.load();
        let client_ip = extract_client_ip(&parts.headers, peer_addr(parts));
        let rate = state.limiters.admin_api.check(&admin_key(&client_ip));

        let is_session_valid = rate.allowed && has_valid_session(state, &secrets, &parts.headers);

        evaluate_admin_access(AdminAccessInputs {
            is_configured: secrets.is_configured(),
            is_rate_allowed: rate.allowed,
            retry_after_seconds: rate.retry_after_seconds,
            is_session_valid,
        })
        .map_err(AppError)?;

        Ok(AdminSession { client_ip })
    }
}

/// `Json<T>` whose rejection is a 400 `ErrorResponse` instead of plain text.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(AppError(SiteError::InvalidParameters(rejection_message(
                &rejection,
            )))),
        }
    }
}

pub(crate) fn rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => "expected a JSON body".to_owned(),
        JsonRejection::JsonSyntaxError(_) => "malformed JSON".to_owned(),
        JsonRejection::JsonDataError(_) => "unexpected JSON shape".to_owned(),
        _ => "unreadable request body".to_owned(),
    }
}

/// Logs every 5xx with request id, route, client ip and status.
pub async fn log_server_errors(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path().to_owned(), |path| path.as_str().to_owned());
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = extract_client_ip(req.headers(), peer);
    let method = req.method().clone();

    let response = next.run(req).await;

    let status = response.status();
    if status.is_server_error() {
        log::error!(
            target: "makerspace_admin",
            "msg=\"server error\", request_id=\"{request_id}\", method=\"{method}\", route=\"{route}\", ip=\"{client_ip}\", status={}",
            status.as_u16()
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.5, 10.0.0.1"),
            ("x-real-ip", "198.51.100.7"),
        ]);
        assert_eq!(extract_client_ip(&map, None), "203.0.113.5");
    }

    #[test]
    fn test_header_fallback_order() {
        let map = headers(&[("x-real-ip", "198.51.100.7"), ("cf-connecting-ip", "192.0.2.1")]);
        assert_eq!(extract_client_ip(&map, None), "198.51.100.7");

        let map = headers(&[("cf-connecting-ip", "192.0.2.1")]);
        assert_eq!(extract_client_ip(&map, None), "192.0.2.1");
    }

    #[test]
    fn test_peer_then_unknown() {
        let peer: SocketAddr = "192.0.2.44:51234".parse().unwrap();
        assert_eq!(extract_client_ip(&HeaderMap::new(), Some(peer)), "192.0.2.44");
        assert_eq!(extract_client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_blank_forwarded_for_is_skipped() {
        let map = headers(&[("x-forwarded-for", " "), ("x-real-ip", "198.51.100.7")]);
        assert_eq!(extract_client_ip(&map, None), "198.51.100.7");
    }
}
