//! CORS for the admin and submission API, using tower-http.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

/// Credentialed CORS for the configured origins, or `None` when the list is
/// empty and the API is served same-origin only.
///
/// Unparseable origins are skipped.
pub fn layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_origins_means_no_layer() {
        assert!(layer(&[]).is_none());
        assert!(layer(&["not a header\nvalue".to_owned()]).is_none());
    }

    #[test]
    fn test_origins_build_layer() {
        assert!(layer(&["https://makerspace.example".to_owned()]).is_some());
    }
}
