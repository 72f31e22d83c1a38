pub mod auth;
pub mod catalog;
pub mod compose;
pub mod editor;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      username/password login
/// /auth/passkey/register/options                   passkey registration challenge
/// /auth/passkey/register                           passkey registration
/// /auth/passkey/login/options                      passkey login challenge
/// /auth/passkey/login                              passkey login
///
/// /stores                                          list stores
/// /catalogs/{id}/categories                        list categories
/// /categories/{id}/products                        list products
/// /products/{id}/skus                              list SKUs
/// /widgets?page_type=&layout_id=                   data widgets
/// /layouts?page_type=                              stored layout template
///
/// /editor/sessions                                 open (POST)
/// /editor/sessions/{id}                            snapshot, close
/// /editor/sessions/{id}/edits                      apply an edit (POST)
/// /editor/sessions/{id}/undo                       undo (POST)
/// /editor/sessions/{id}/redo                       redo (POST)
/// /editor/sessions/{id}/save                       explicit save (POST)
/// /editor/sessions/{id}/designer                   designer details (POST)
/// /editor/sessions/{id}/complete                   mark complete (POST)
/// /editor/sessions/{id}/template                   load stored template (POST)
/// /editor/sessions/{id}/publish-layout             publish as template (POST)
///
/// /compose/runs                                    start a run (POST)
/// /compose/runs/{id}                               snapshot, discard
/// /compose/runs/{id}/events                        progress (SSE)
/// /compose/runs/{id}/output                        choose output (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(catalog::router())
        .nest("/editor/sessions", editor::router())
        .nest("/compose/runs", compose::router())
}
