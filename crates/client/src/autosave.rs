//! Debounced canvas persistence.
//!
//! Every edit schedules a save of the latest canvas; a burst of schedules
//! within the quiet window produces exactly one write of the last state
//! (trailing edge). Writes are issued by one background task per saver, so
//! they reach the store in the order they were scheduled, each tagged with
//! a monotonically increasing revision.
//!
//! Failed auto-saves are logged and dropped. [`AutoSaver::flush`] and
//! [`AutoSaver::save_now`] return the failure to the caller instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use vitrine_core::canvas::Canvas;
use vitrine_core::types::Timestamp;

use crate::api::{ApiError, CmsApi};

/// Default quiet window before a scheduled save is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Where canvases are written.
#[async_trait]
pub trait CanvasStore: Send + Sync + 'static {
    /// Write `canvas` as the state at `revision`.
    async fn save_canvas(&self, canvas: &Canvas, revision: u64) -> Result<(), ApiError>;
}

#[async_trait]
impl CanvasStore for CmsApi {
    async fn save_canvas(&self, canvas: &Canvas, revision: u64) -> Result<(), ApiError> {
        self.put_canvas(canvas, revision).await
    }
}

/// Errors returned by explicit saves.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Failed to save canvas: {0}")]
    Store(#[from] ApiError),

    #[error("Autosave task is no longer running")]
    Stopped,
}

/// Observable outcome of the most recent write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStatus {
    /// A save is scheduled but not yet written.
    pub pending: bool,
    /// Revision of the last successful write.
    pub saved_revision: Option<u64>,
    pub last_saved_at: Option<Timestamp>,
    /// Message of the last failed write; cleared by the next success.
    pub last_error: Option<String>,
}

enum Command {
    Schedule {
        canvas: Canvas,
        revision: u64,
    },
    Flush {
        reply: oneshot::Sender<Result<(), SaveError>>,
    },
    SaveNow {
        canvas: Canvas,
        revision: u64,
        reply: oneshot::Sender<Result<(), SaveError>>,
    },
}

/// Handle to a per-session debounce task.
///
/// Dropping the handle stops the task after writing whatever is pending.
pub struct AutoSaver {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
}

impl AutoSaver {
    /// Spawn the background task. Must be called within a tokio runtime.
    pub fn spawn(store: Arc<dyn CanvasStore>, window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::default());
        tokio::spawn(run(store, window, rx, status_tx));
        Self { tx, status }
    }

    /// Schedule a save of `canvas`, restarting the quiet window.
    pub fn schedule(&self, canvas: Canvas, revision: u64) {
        if self.tx.send(Command::Schedule { canvas, revision }).is_err() {
            tracing::warn!(revision, "Autosave task stopped, edit not scheduled");
        }
    }

    /// Write any pending save now and wait for it.
    pub async fn flush(&self) -> Result<(), SaveError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Flush { reply })
            .map_err(|_| SaveError::Stopped)?;
        rx.await.map_err(|_| SaveError::Stopped)?
    }

    /// Cancel any pending save and write `canvas` immediately.
    pub async fn save_now(&self, canvas: Canvas, revision: u64) -> Result<(), SaveError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::SaveNow {
                canvas,
                revision,
                reply,
            })
            .map_err(|_| SaveError::Stopped)?;
        rx.await.map_err(|_| SaveError::Stopped)?
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }
}

// ---- background task ----

struct Pending {
    canvas: Canvas,
    revision: u64,
    deadline: Instant,
}

async fn run(
    store: Arc<dyn CanvasStore>,
    window: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<SaveStatus>,
) {
    let mut pending: Option<Pending> = None;

    loop {
        let deadline = pending.as_ref().map(|p| p.deadline);
        let command = tokio::select! {
            command = rx.recv() => command,
            _ = sleep_until(deadline) => {
                if let Some(due) = pending.take() {
                    if let Err(e) = write(store.as_ref(), &status, due.canvas, due.revision).await {
                        tracing::warn!(error = %e, "Autosave failed, change kept locally only");
                    }
                }
                continue;
            }
        };

        match command {
            Some(Command::Schedule { canvas, revision }) => {
                pending = Some(Pending {
                    canvas,
                    revision,
                    deadline: Instant::now() + window,
                });
                status.send_modify(|s| s.pending = true);
            }
            Some(Command::Flush { reply }) => {
                let result = match pending.take() {
                    Some(due) => write(store.as_ref(), &status, due.canvas, due.revision).await,
                    None => Ok(()),
                };
                let _ = reply.send(result);
            }
            Some(Command::SaveNow {
                canvas,
                revision,
                reply,
            }) => {
                pending = None;
                let result = write(store.as_ref(), &status, canvas, revision).await;
                let _ = reply.send(result);
            }
            None => {
                if let Some(due) = pending.take() {
                    if let Err(e) = write(store.as_ref(), &status, due.canvas, due.revision).await {
                        tracing::warn!(error = %e, "Final autosave failed");
                    }
                }
                tracing::debug!("Autosave task stopped");
                return;
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn write(
    store: &dyn CanvasStore,
    status: &watch::Sender<SaveStatus>,
    canvas: Canvas,
    revision: u64,
) -> Result<(), SaveError> {
    let result = store.save_canvas(&canvas, revision).await;
    match &result {
        Ok(()) => {
            tracing::debug!(canvas_id = %canvas.id, revision, "Canvas saved");
            status.send_modify(|s| {
                s.pending = false;
                s.saved_revision = Some(revision);
                s.last_saved_at = Some(chrono::Utc::now());
                s.last_error = None;
            });
        }
        Err(e) => {
            let message = e.to_string();
            status.send_modify(|s| {
                s.pending = false;
                s.last_error = Some(message);
            });
        }
    }
    Ok(result?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
