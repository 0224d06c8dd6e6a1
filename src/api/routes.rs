use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::storage::Storage;

use super::handlers::{
    create_link, delete_link, get_link, health_check, list_link_visits, list_links, list_visits,
    AppState,
};

pub fn create_api_router(storage: Arc<dyn Storage>, track_base_url: String) -> Router {
    let state = Arc::new(AppState {
        storage,
        track_base_url,
    });

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/links", get(list_links).post(create_link))
        .route("/links/{slug}", get(get_link).delete(delete_link))
        .route("/links/{slug}/visits", get(list_link_visits))
        .route("/visits", get(list_visits))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
}
