use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::links::{create_with_generated_slug, is_valid_slug, MAX_SLUG_LENGTH};
use crate::models::{CreateLinkRequest, LinkResponse, VisitWithLink};
use crate::storage::{Storage, StorageError};

const MAX_PAGE_SIZE: i64 = 500;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub track_base_url: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl ListQuery {
    fn bounds(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_PAGE_SIZE), self.offset.max(0))
    }
}

/// Create a new tracking link
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Name cannot be empty"));
    }

    let created_by = payload.created_by.as_deref();

    let result = match payload.slug.as_deref().map(str::trim) {
        Some(slug) => {
            if !is_valid_slug(slug) {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!(
                        "Slug must be 1-{MAX_SLUG_LENGTH} characters of lowercase letters, digits or '-'"
                    ),
                ));
            }
            state.storage.create_link(name, slug, created_by).await
        }
        None => create_with_generated_slug(state.storage.as_ref(), name, created_by).await,
    };

    match result {
        Ok(link) => {
            info!(slug = %link.slug, name = %link.name, "created tracking link");
            Ok((
                StatusCode::CREATED,
                Json(LinkResponse::new(link, &state.track_base_url)),
            ))
        }
        Err(StorageError::Conflict) => Err(api_error(StatusCode::CONFLICT, "Slug already in use")),
        Err(e) => {
            error!(error = %e, "failed to create tracking link");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create link: {}", e),
            ))
        }
    }
}

/// Get a tracking link by slug
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<LinkResponse>, ApiError> {
    match state.storage.get_link(&slug).await {
        Ok(Some(link)) => Ok(Json(LinkResponse::new(link, &state.track_base_url))),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Link not found")),
        Err(e) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to get link: {}", e),
        )),
    }
}

/// Delete a tracking link together with its visits
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    match state.storage.delete_link(&slug).await {
        Ok(true) => {
            info!(slug = %slug, "deleted tracking link");
            Ok(Json(SuccessResponse {
                message: "Link deleted successfully".to_string(),
            }))
        }
        Ok(false) => Err(api_error(StatusCode::NOT_FOUND, "Link not found")),
        Err(e) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to delete link: {}", e),
        )),
    }
}

/// List tracking links, newest first
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LinkResponse>>, ApiError> {
    let (limit, offset) = query.bounds();
    match state.storage.list_links(limit, offset).await {
        Ok(links) => Ok(Json(
            links
                .into_iter()
                .map(|link| LinkResponse::new(link, &state.track_base_url))
                .collect(),
        )),
        Err(e) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to list links: {}", e),
        )),
    }
}

/// List visits across all links, newest first
pub async fn list_visits(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<VisitWithLink>>, ApiError> {
    let (limit, offset) = query.bounds();
    state
        .storage
        .list_visits(limit, offset)
        .await
        .map(Json)
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list visits: {}", e),
            )
        })
}

/// List visits recorded against one link, newest first
pub async fn list_link_visits(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<VisitWithLink>>, ApiError> {
    match state.storage.get_link(&slug).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(api_error(StatusCode::NOT_FOUND, "Link not found")),
        Err(e) => {
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to get link: {}", e),
            ))
        }
    }

    let (limit, offset) = query.bounds();
    state
        .storage
        .list_visits_for_link(&slug, limit, offset)
        .await
        .map(Json)
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list visits: {}", e),
            )
        })
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}
