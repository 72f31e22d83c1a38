//! One open canvas: history, edit application and persistence.
//!
//! An [`EditorSession`] owns the undo/redo stack of canvas snapshots and the
//! debounced saver for that canvas. Every applied edit, undo and redo moves
//! the displayed canvas and schedules a save of it; refused edits change
//! nothing and record nothing.
//!
//! Completion status and designer details live beside the history, not in
//! it: undo and redo move content only.

use std::sync::Arc;

use serde::Serialize;
use vitrine_core::canvas::{Canvas, CanvasStatus};
use vitrine_core::designer::DesignerInfo;
use vitrine_core::edit::{apply_edit, Edit, EditOutcome};
use vitrine_core::error::CoreError;
use vitrine_core::history::{History, HistoryInfo};
use vitrine_core::layout_template::{to_layout_document, zones_from_template, LayoutDocument};
use vitrine_core::registry::WidgetRegistry;
use vitrine_core::types::{EntityId, Timestamp};
use vitrine_core::widget_config::{unpersisted_slots, widget_config, SlotKey, WidgetConfig};

use crate::autosave::{AutoSaver, SaveError, SaveStatus};

/// Errors from session operations that both validate and persist.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

/// What happened to a submitted edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditReport {
    pub applied: bool,
    /// Why a structural guard refused the edit.
    pub reason: Option<String>,
    pub revision: u64,
}

/// Result of an explicit save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub revision: u64,
    /// The designer details form should be shown now.
    pub designer_required: bool,
}

/// Everything a client needs to render the editor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub canvas: Canvas,
    pub widget_config: WidgetConfig,
    pub unpersisted_slots: Vec<SlotKey>,
    pub history: HistoryInfo,
    pub save: SaveStatus,
    pub revision: u64,
}

pub struct EditorSession {
    /// Content snapshots. Their `status` and `designer` fields are ignored.
    history: History<Canvas>,
    registry: Arc<WidgetRegistry>,
    saver: AutoSaver,
    revision: u64,
    /// The designer gate was already offered for this canvas.
    gate_offered: bool,
    status: CanvasStatus,
    designer: Option<DesignerInfo>,
    /// Last metadata change, so undo never moves `updated_at` behind it.
    stamped_at: Timestamp,
}

impl EditorSession {
    /// Start editing `canvas`. The loaded state becomes history entry zero
    /// and is not written back.
    pub fn open(
        canvas: Canvas,
        registry: Arc<WidgetRegistry>,
        saver: AutoSaver,
        history_limit: usize,
    ) -> Self {
        let gate_offered = canvas.designer.is_some();
        let status = canvas.status;
        let designer = canvas.designer.clone();
        let stamped_at = canvas.updated_at;
        let mut history = History::with_limit(history_limit);
        history.record(canvas);
        Self {
            history,
            registry,
            saver,
            revision: 0,
            gate_offered,
            status,
            designer,
            stamped_at,
        }
    }

    /// The displayed canvas: the current history entry plus session metadata.
    pub fn canvas(&self) -> Canvas {
        let mut canvas = self.entry().clone();
        canvas.status = self.status;
        canvas.designer = self.designer.clone();
        canvas.updated_at = canvas.updated_at.max(self.stamped_at);
        canvas
    }

    pub fn canvas_id(&self) -> &str {
        &self.entry().id
    }

    pub fn page_type(&self) -> &str {
        &self.entry().page_type
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn history_info(&self) -> HistoryInfo {
        self.history.info()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saver.status()
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        let canvas = self.canvas();
        let widget_config = widget_config(&canvas.rows);
        EditorSnapshot {
            unpersisted_slots: unpersisted_slots(&widget_config),
            widget_config,
            canvas,
            history: self.history.info(),
            save: self.saver.status(),
            revision: self.revision,
        }
    }

    // ---- editing ----

    /// Apply one edit to the displayed canvas.
    pub fn apply(&mut self, edit: &Edit) -> Result<EditReport, CoreError> {
        match apply_edit(self.entry(), edit, &self.registry)? {
            EditOutcome::Applied(next) => {
                self.commit(next);
                tracing::debug!(
                    canvas_id = %self.canvas_id(),
                    op = edit.name(),
                    revision = self.revision,
                    "Edit applied",
                );
                Ok(EditReport {
                    applied: true,
                    reason: None,
                    revision: self.revision,
                })
            }
            EditOutcome::Refused { reason } => {
                tracing::debug!(
                    canvas_id = %self.canvas_id(),
                    op = edit.name(),
                    %reason,
                    "Edit refused",
                );
                Ok(EditReport {
                    applied: false,
                    reason: Some(reason),
                    revision: self.revision,
                })
            }
        }
    }

    /// Step back one entry. Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        self.history.undo();
        self.schedule_current();
        true
    }

    /// Step forward one entry. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        self.history.redo();
        self.schedule_current();
        true
    }

    /// Replace the canvas zones with a backend layout template.
    pub fn apply_template(&mut self, document: &LayoutDocument) -> Result<(), CoreError> {
        if document.page_type != self.page_type() {
            return Err(CoreError::Validation(format!(
                "Template is for '{}' pages, canvas is '{}'",
                document.page_type,
                self.page_type()
            )));
        }
        let zones = zones_from_template(document, &self.registry)?;
        let mut next = self.entry().clone();
        next.zones = zones;
        next.touch();
        self.commit(next);
        Ok(())
    }

    /// The displayed canvas as a layout template.
    pub fn layout_document(&self, layout_id: Option<EntityId>) -> LayoutDocument {
        to_layout_document(self.entry(), layout_id)
    }

    // ---- persistence ----

    /// Write the displayed canvas now.
    ///
    /// The first explicit save of a canvas without designer details asks
    /// for them; the form is offered only once.
    pub async fn save(&mut self) -> Result<SaveReceipt, SaveError> {
        self.saver.save_now(self.canvas(), self.revision).await?;
        let designer_required = !self.gate_offered;
        self.gate_offered = true;
        tracing::info!(
            canvas_id = %self.canvas_id(),
            revision = self.revision,
            designer_required,
            "Canvas saved explicitly",
        );
        Ok(SaveReceipt {
            revision: self.revision,
            designer_required,
        })
    }

    /// Attach designer details to the canvas and persist them.
    pub async fn record_designer(&mut self, info: DesignerInfo) -> Result<(), SessionError> {
        info.validate()?;
        if self.designer.is_some() {
            return Err(CoreError::Conflict(
                "Designer details were already captured for this canvas".into(),
            )
            .into());
        }
        self.designer = Some(info);
        self.gate_offered = true;
        self.persist_metadata().await?;
        Ok(())
    }

    /// Flush pending work, then mark the canvas complete and write it.
    ///
    /// Returns `false` when the canvas was already complete.
    pub async fn mark_complete(&mut self) -> Result<bool, SaveError> {
        self.saver.flush().await?;
        if self.status == CanvasStatus::Complete {
            return Ok(false);
        }
        self.status = CanvasStatus::Complete;
        self.persist_metadata().await?;
        tracing::info!(canvas_id = %self.canvas_id(), "Canvas marked complete");
        Ok(true)
    }

    /// Write any pending auto-save.
    pub async fn flush(&self) -> Result<(), SaveError> {
        self.saver.flush().await
    }

    /// End the session, writing any pending auto-save first.
    pub async fn close(self) -> Result<(), SaveError> {
        self.saver.flush().await
    }

    // ---- private helpers ----

    fn entry(&self) -> &Canvas {
        self.history
            .current()
            .expect("editor history always holds the loaded canvas")
    }

    fn commit(&mut self, next: Canvas) {
        self.history.record(next);
        self.schedule_current();
    }

    fn schedule_current(&mut self) {
        self.revision += 1;
        self.saver.schedule(self.canvas(), self.revision);
    }

    /// Write a status or designer change now, outside the history.
    async fn persist_metadata(&mut self) -> Result<(), SaveError> {
        self.stamped_at = chrono::Utc::now();
        self.revision += 1;
        self.saver.save_now(self.canvas(), self.revision).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
