//! Route definitions for canvas editor sessions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::editor;
use crate::state::AppState;

/// Editor routes mounted at `/editor/sessions`.
///
/// ```text
/// POST   /                        -> open_session
/// GET    /{id}                    -> get_session
/// DELETE /{id}                    -> close_session
/// POST   /{id}/edits              -> apply_edit
/// POST   /{id}/undo               -> undo
/// POST   /{id}/redo               -> redo
/// POST   /{id}/save               -> save
/// POST   /{id}/designer           -> record_designer
/// POST   /{id}/complete           -> mark_complete
/// POST   /{id}/template           -> load_template
/// POST   /{id}/publish-layout     -> publish_layout
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(editor::open_session))
        .route(
            "/{id}",
            get(editor::get_session).delete(editor::close_session),
        )
        .route("/{id}/edits", post(editor::apply_edit))
        .route("/{id}/undo", post(editor::undo))
        .route("/{id}/redo", post(editor::redo))
        .route("/{id}/save", post(editor::save))
        .route("/{id}/designer", post(editor::record_designer))
        .route("/{id}/complete", post(editor::mark_complete))
        .route("/{id}/template", post(editor::load_template))
        .route("/{id}/publish-layout", post(editor::publish_layout))
}
