//! Handlers for composition runs.
//!
//! Starting a run validates the store/page selection, opens the CMS
//! backend's progress stream and relays wizard snapshots to the browser as
//! server-sent events. Deleting a run, or dropping its last event relay,
//! closes the upstream stream.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::future::ready;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;
use vitrine_core::composer::{ComposePhase, ComposerWizard, OutputAction};
use vitrine_core::types::EntityId;

use crate::error::AppResult;
use crate::middleware::auth::Upstream;
use crate::response::DataResponse;
use crate::sessions::ComposeRun;
use crate::state::AppState;

/// Body of `POST /compose/runs`.
#[derive(Debug, Deserialize)]
pub struct StartRun {
    pub store_id: EntityId,
    pub canvas_ids: Vec<EntityId>,
}

/// Body of `POST /compose/runs/{id}/output`.
#[derive(Debug, Deserialize)]
pub struct ChooseOutput {
    pub action: OutputAction,
}

#[derive(Debug, Serialize)]
pub struct RunView {
    pub id: String,
    pub wizard: ComposerWizard,
    pub available_outputs: Vec<OutputAction>,
}

impl RunView {
    fn new(id: String, wizard: ComposerWizard) -> Self {
        Self {
            available_outputs: wizard.available_outputs(),
            id,
            wizard,
        }
    }
}

/// POST /api/v1/compose/runs
pub async fn start_run(
    State(state): State<AppState>,
    Upstream(api): Upstream,
    Json(input): Json<StartRun>,
) -> AppResult<impl IntoResponse> {
    let run = ComposeRun::start(&api, input.store_id, input.canvas_ids).await?;
    let wizard = run.snapshot().await;
    let (id, _) = state.compose_runs.insert(run).await;

    tracing::info!(
        run_id = %id,
        store_id = ?wizard.store_id(),
        canvas_count = wizard.canvas_ids().len(),
        "Compose run started",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: RunView::new(id, wizard),
        }),
    ))
}

/// GET /api/v1/compose/runs/{id}
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let run = state.compose_runs.get(&id).await?;
    let wizard = run.snapshot().await;
    Ok(Json(DataResponse {
        data: RunView::new(id, wizard),
    }))
}

/// GET /api/v1/compose/runs/{id}/events
///
/// Streams a `wizard` event with the current snapshot, then one per change.
/// The stream ends after the run fails, after an output is chosen, or when
/// the run is deleted. Disconnecting the last relay tears the run down.
pub async fn run_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let relay = state.compose_runs.attach(&id).await?;
    let stream = WatchStream::new(relay.run().subscribe())
        .take_until(relay.run().closed())
        .scan(false, |finished, wizard| {
            if *finished {
                return ready(None);
            }
            *finished = is_final(&wizard);
            ready(Some(wizard))
        });
    let stream = stream.map(move |wizard| {
        let event = Event::default().event("wizard");
        let event = event
            .json_data(RunView::new(relay.id().to_string(), wizard))
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to serialize wizard snapshot");
                Event::default().event("error").data("serialization failed")
            });
        Ok::<_, Infallible>(event)
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// No later snapshot can change what the browser shows.
fn is_final(wizard: &ComposerWizard) -> bool {
    wizard.phase() == ComposePhase::Error || wizard.output().is_some()
}

/// POST /api/v1/compose/runs/{id}/output
pub async fn choose_output(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ChooseOutput>,
) -> AppResult<impl IntoResponse> {
    let run = state.compose_runs.get(&id).await?;
    let wizard = run.choose_output(input.action).await?;

    tracing::info!(run_id = %id, output = input.action.label(), "Compose output chosen");

    Ok(Json(DataResponse {
        data: RunView::new(id, wizard),
    }))
}

/// DELETE /api/v1/compose/runs/{id}
pub async fn delete_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.compose_runs.remove(&id).await?;
    tracing::info!(run_id = %id, "Compose run discarded");
    Ok(StatusCode::NO_CONTENT)
}
