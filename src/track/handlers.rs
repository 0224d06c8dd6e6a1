use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use tracing::error;

use crate::visits::{resolve_client_ip, RecordError, Recorder, VisitMetadata};

pub struct TrackState {
    pub recorder: Recorder,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            details: None,
            slug: None,
        }
    }
}

impl IntoResponse for RecordError {
    fn into_response(self) -> Response {
        match self {
            RecordError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("No slug provided")),
            )
                .into_response(),
            RecordError::PersistenceFailure { slug, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to record visit".to_string(),
                    details: Some(details),
                    slug: Some(slug),
                }),
            )
                .into_response(),
        }
    }
}

/// Record a visit for the slug at the end of the request path.
///
/// Mounted as the router fallback so any path shape reaches it; `OPTIONS` is
/// answered earlier by the CORS middleware.
pub async fn track_visit(
    State(state): State<Arc<TrackState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let ip_info = resolve_client_ip(&headers);
    let slug = slug_from_path(uri.path());

    match state
        .recorder
        .record(slug, ip_info, VisitMetadata::from_headers(&headers))
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Text after the final `/`; empty for `/` or a trailing slash
pub fn slug_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Response for a panic caught while handling a request
pub fn internal_failure(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = %message, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal Server Error")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_path() {
        assert_eq!(slug_from_path("/track/my-link"), "my-link");
        assert_eq!(slug_from_path("/functions/v1/track/abc123"), "abc123");
        assert_eq!(slug_from_path("/my-link"), "my-link");
        assert_eq!(slug_from_path("/track/"), "");
        assert_eq!(slug_from_path("/"), "");
        assert_eq!(slug_from_path(""), "");
    }

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let response = RecordError::InvalidRequest.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_persistence_failure_maps_to_server_error() {
        let response = RecordError::PersistenceFailure {
            slug: "gone".to_string(),
            details: "no tracking link matches slug 'gone'".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
