//! Route definitions for composition runs.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::compose;
use crate::state::AppState;

/// Compose routes mounted at `/compose/runs`.
///
/// ```text
/// POST   /                 -> start_run
/// GET    /{id}             -> get_run
/// DELETE /{id}             -> delete_run
/// GET    /{id}/events      -> run_events (SSE)
/// POST   /{id}/output      -> choose_output
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(compose::start_run))
        .route("/{id}", get(compose::get_run).delete(compose::delete_run))
        .route("/{id}/events", get(compose::run_events))
        .route("/{id}/output", post(compose::choose_output))
}
