use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::storage::Storage;
use crate::visits::Recorder;

use super::handlers::{internal_failure, track_visit, TrackState};
use super::middleware::cors;

pub fn create_track_router(storage: Arc<dyn Storage>) -> Router {
    let state = Arc::new(TrackState {
        recorder: Recorder::new(storage),
    });

    with_boundary(Router::new().fallback(track_visit)).with_state(state)
}

/// Wrap a router so every request ends in a response carrying CORS headers,
/// including requests whose handler panics.
pub fn with_boundary<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(internal_failure))
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
}
