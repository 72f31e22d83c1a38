//! Handlers for canvas editor sessions.
//!
//! A session is opened on an existing canvas (loaded from the CMS backend)
//! or on a new one, and lives until it is closed. Edits, undo and redo are
//! applied in memory and persisted by the session's debounced saver; save,
//! complete and close write through immediately.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use vitrine_client::autosave::AutoSaver;
use vitrine_client::editor::{EditReport, EditorSession, EditorSnapshot, SaveReceipt};
use vitrine_core::canvas::Canvas;
use vitrine_core::designer::DesignerInfo;
use vitrine_core::edit::Edit;
use vitrine_core::error::CoreError;
use vitrine_core::types::EntityId;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Upstream;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /editor/sessions`.
///
/// Either `canvas_id` (open an existing canvas) or `page_type` (create a
/// new one) must be given.
#[derive(Debug, Deserialize)]
pub struct OpenSession {
    pub canvas_id: Option<EntityId>,
    pub title: Option<String>,
    pub page_type: Option<String>,
}

/// Body of `POST /editor/sessions/{id}/publish-layout`.
#[derive(Debug, Default, Deserialize)]
pub struct PublishLayout {
    /// Existing template to overwrite; a new one is created when absent.
    pub layout_id: Option<EntityId>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    #[serde(flatten)]
    pub snapshot: EditorSnapshot,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub report: EditReport,
    pub session: EditorSnapshot,
}

#[derive(Debug, Serialize)]
pub struct HistoryMove {
    pub moved: bool,
    pub session: EditorSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub receipt: SaveReceipt,
    pub session: EditorSnapshot,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub changed: bool,
    pub session: EditorSnapshot,
}

const DEFAULT_TITLE: &str = "Untitled page";

/// POST /api/v1/editor/sessions
pub async fn open_session(
    State(state): State<AppState>,
    Upstream(api): Upstream,
    Json(input): Json<OpenSession>,
) -> AppResult<impl IntoResponse> {
    let canvas = match input.canvas_id {
        Some(canvas_id) => api.get_canvas(&canvas_id).await?,
        None => {
            let page_type = input.page_type.ok_or_else(|| {
                AppError::BadRequest("Either canvas_id or page_type is required".into())
            })?;
            let title = input.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
            Canvas::new(title, &page_type, &state.registry)?
        }
    };

    let saver = AutoSaver::spawn(Arc::new(api), state.config.autosave_debounce());
    let session = EditorSession::open(
        canvas,
        Arc::clone(&state.registry),
        saver,
        state.config.history_limit,
    );
    let snapshot = session.snapshot();
    let (id, _) = state.editors.insert(session).await;

    tracing::info!(
        session_id = %id,
        canvas_id = %snapshot.canvas.id,
        page_type = %snapshot.canvas.page_type,
        "Editor session opened",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SessionView { id, snapshot },
        }),
    ))
}

/// GET /api/v1/editor/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.editors.get(&id).await?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(DataResponse {
        data: SessionView { id, snapshot },
    }))
}

/// DELETE /api/v1/editor/sessions/{id}
///
/// Writes any pending auto-save, then discards the session.
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let session = state.editors.remove(&id).await?;
    session.lock().await.flush().await?;

    tracing::info!(session_id = %id, "Editor session closed");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/editor/sessions/{id}/edits
pub async fn apply_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<Edit>,
) -> AppResult<impl IntoResponse> {
    let session = state.editors.get(&id).await?;
    let mut session = session.lock().await;
    let report = session.apply(&edit)?;
    Ok(Json(DataResponse {
        data: EditResponse {
            report,
            session: session.snapshot(),
        },
    }))
}

/// POST /api/v1/editor/sessions/{id}/undo
pub async fn undo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.editors.get(&id).await?;
    let mut session = session.lock().await;
    let moved = session.undo();
    Ok(Json(DataResponse {
        data: HistoryMove {
            moved,
            session: session.snapshot(),
        },
    }))
}

/// POST /api/v1/editor/sessions/{id}/redo
pub async fn redo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.editors.get(&id).await?;
    let mut session = session.lock().await;
    let moved = session.redo();
    Ok(Json(DataResponse {
        data: HistoryMove {
            moved,
            session: session.snapshot(),
        },
    }))
}

/// POST /api/v1/editor/sessions/{id}/save
///
/// Writes the displayed canvas now. The receipt says whether the designer
/// details form should be shown.
pub async fn save(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.editors.get(&id).await?;
    let mut session = session.lock().await;
    let receipt = session.save().await?;
    Ok(Json(DataResponse {
        data: SaveResponse {
            receipt,
            session: session.snapshot(),
        },
    }))
}

/// POST /api/v1/editor/sessions/{id}/designer
pub async fn record_designer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(info): Json<DesignerInfo>,
) -> AppResult<impl IntoResponse> {
    let session = state.editors.get(&id).await?;
    let mut session = session.lock().await;
    session.record_designer(info).await?;

    tracing::info!(session_id = %id, canvas_id = %session.canvas_id(), "Designer details captured");

    Ok(Json(DataResponse {
        data: session.snapshot(),
    }))
}

/// POST /api/v1/editor/sessions/{id}/complete
pub async fn mark_complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.editors.get(&id).await?;
    let mut session = session.lock().await;
    let changed = session.mark_complete().await?;
    Ok(Json(DataResponse {
        data: CompleteResponse {
            changed,
            session: session.snapshot(),
        },
    }))
}

/// POST /api/v1/editor/sessions/{id}/template
///
/// Replace the canvas zones with the template stored for its page type.
pub async fn load_template(
    State(state): State<AppState>,
    Upstream(api): Upstream,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.editors.get(&id).await?;
    let page_type = session.lock().await.page_type().to_string();
    let document = api
        .layout_by_page_type(&page_type)
        .await?
        .ok_or_else(|| CoreError::not_found("Layout", page_type.as_str()))?;

    let mut session = session.lock().await;
    session.apply_template(&document)?;
    Ok(Json(DataResponse {
        data: session.snapshot(),
    }))
}

/// POST /api/v1/editor/sessions/{id}/publish-layout
///
/// Store the canvas zones as the backend layout template for its page
/// type, overwriting `layout_id` when given.
pub async fn publish_layout(
    State(state): State<AppState>,
    Upstream(api): Upstream,
    Path(id): Path<String>,
    body: Option<Json<PublishLayout>>,
) -> AppResult<impl IntoResponse> {
    let input = body.map(|Json(input)| input).unwrap_or_default();
    let session = state.editors.get(&id).await?;
    let document = session
        .lock()
        .await
        .layout_document(input.layout_id.clone());

    let (status, saved) = match &input.layout_id {
        Some(layout_id) => (StatusCode::OK, api.update_layout(layout_id, &document).await?),
        None => (StatusCode::CREATED, api.create_layout(&document).await?),
    };

    tracing::info!(
        session_id = %id,
        page_type = %saved.page_type,
        layout_id = ?saved.id,
        "Layout template published",
    );

    Ok((status, Json(DataResponse { data: saved })))
}
