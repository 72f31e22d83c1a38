//! Composition wizard state machine.
//!
//! The wizard walks `Start → Progress → Complete`, with `Error` as an
//! absorbing state reachable from `Progress`. Progress is driven by
//! [`ComposeEvent`]s read from the backend's server-push stream; the
//! transport lives in the client crate, this module only decides what each
//! event does to the wizard.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Stream events
// ---------------------------------------------------------------------------

/// Status carried by a compose stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposeStatus {
    Progress,
    Completed,
    Error,
}

/// Visual hint attached to a stream event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeVisual {
    #[serde(rename = "type", default)]
    pub visual_type: Option<String>,
    /// Percent complete, 0..=100.
    #[serde(default)]
    pub progress: Option<f64>,
    /// Any further fields the backend sends along.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One message from the compose event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeEvent {
    pub status: ComposeStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub visual: ComposeVisual,
}

impl ComposeEvent {
    pub fn progress(percent: f64, message: impl Into<String>) -> Self {
        Self {
            status: ComposeStatus::Progress,
            message: message.into(),
            visual: ComposeVisual {
                progress: Some(percent),
                ..Default::default()
            },
        }
    }

    pub fn completed(message: impl Into<String>) -> Self {
        Self {
            status: ComposeStatus::Completed,
            message: message.into(),
            visual: ComposeVisual::default(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ComposeStatus::Error,
            message: message.into(),
            visual: ComposeVisual::default(),
        }
    }
}

/// Parse a compose stream `data:` payload.
pub fn parse_event(text: &str) -> Result<ComposeEvent, serde_json::Error> {
    serde_json::from_str(text)
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

/// Wizard phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposePhase {
    Start,
    Progress,
    Complete,
    Error,
}

impl ComposePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Progress => "progress",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    /// `true` once the event stream has been closed for this run.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Output actions offered once composition completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputAction {
    InlineCode,
    StandaloneCode,
    DeployStaging,
    DownloadZip,
}

impl OutputAction {
    pub const ALL: [OutputAction; 4] = [
        Self::InlineCode,
        Self::StandaloneCode,
        Self::DeployStaging,
        Self::DownloadZip,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::InlineCode => "Inline Code",
            Self::StandaloneCode => "Standalone Code",
            Self::DeployStaging => "Deploy to Staging",
            Self::DownloadZip => "Download ZIP",
        }
    }
}

/// What the stream should be opened for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposeTarget {
    pub store_id: EntityId,
    pub canvas_ids: Vec<EntityId>,
}

impl ComposeTarget {
    /// Value of the `canvas_id` query parameter (ids joined by commas).
    pub fn canvas_param(&self) -> String {
        self.canvas_ids.join(",")
    }
}

/// Effect of feeding one event into the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventEffect {
    /// Progress/message updated; keep reading.
    Updated,
    /// The run finished; the caller must close the stream.
    Completed,
    /// The run failed; the caller must close the stream.
    Failed,
    /// The wizard was not in `Progress`; nothing changed.
    Ignored,
}

impl EventEffect {
    pub fn closes_stream(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Full wizard state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposerWizard {
    phase: ComposePhase,
    store_id: Option<EntityId>,
    canvas_ids: Vec<EntityId>,
    progress: f64,
    message: String,
    error: Option<String>,
    output: Option<OutputAction>,
}

impl Default for ComposerWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposerWizard {
    pub fn new() -> Self {
        Self {
            phase: ComposePhase::Start,
            store_id: None,
            canvas_ids: Vec::new(),
            progress: 0.0,
            message: String::new(),
            error: None,
            output: None,
        }
    }

    pub fn phase(&self) -> ComposePhase {
        self.phase
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn output(&self) -> Option<OutputAction> {
        self.output
    }

    pub fn store_id(&self) -> Option<&str> {
        self.store_id.as_deref()
    }

    pub fn canvas_ids(&self) -> &[EntityId] {
        &self.canvas_ids
    }

    // ---- Start ----

    /// Select the single store to compose for.
    pub fn select_store(&mut self, store_id: impl Into<EntityId>) -> Result<(), CoreError> {
        self.require_phase(ComposePhase::Start, "select a store")?;
        let store_id = store_id.into();
        if store_id.trim().is_empty() {
            return Err(CoreError::Validation("Store id must not be empty".into()));
        }
        self.store_id = Some(store_id);
        Ok(())
    }

    /// Replace the selected canvases. Duplicates are dropped, order kept.
    pub fn select_canvases(&mut self, canvas_ids: Vec<EntityId>) -> Result<(), CoreError> {
        self.require_phase(ComposePhase::Start, "select canvases")?;
        let mut unique: Vec<EntityId> = Vec::with_capacity(canvas_ids.len());
        for id in canvas_ids {
            if !id.trim().is_empty() && !unique.contains(&id) {
                unique.push(id);
            }
        }
        self.canvas_ids = unique;
        Ok(())
    }

    /// Add or remove one canvas from the selection.
    pub fn toggle_canvas(&mut self, canvas_id: impl Into<EntityId>) -> Result<(), CoreError> {
        self.require_phase(ComposePhase::Start, "select canvases")?;
        let canvas_id = canvas_id.into();
        match self.canvas_ids.iter().position(|id| *id == canvas_id) {
            Some(position) => {
                self.canvas_ids.remove(position);
            }
            None => self.canvas_ids.push(canvas_id),
        }
        Ok(())
    }

    /// `true` when a store and at least one canvas are selected.
    pub fn can_begin(&self) -> bool {
        self.phase == ComposePhase::Start && self.store_id.is_some() && !self.canvas_ids.is_empty()
    }

    /// Move to `Progress` and return what the stream must be opened for.
    pub fn begin(&mut self) -> Result<ComposeTarget, CoreError> {
        self.require_phase(ComposePhase::Start, "begin composition")?;
        let store_id = self
            .store_id
            .clone()
            .ok_or_else(|| CoreError::Validation("Select a store before composing".into()))?;
        if self.canvas_ids.is_empty() {
            return Err(CoreError::Validation(
                "Select at least one page before composing".into(),
            ));
        }
        self.phase = ComposePhase::Progress;
        self.progress = 0.0;
        self.message.clear();
        Ok(ComposeTarget {
            store_id,
            canvas_ids: self.canvas_ids.clone(),
        })
    }

    // ---- Progress ----

    /// Feed one stream event into the wizard.
    ///
    /// Only has an effect while in `Progress`; once the stream has closed
    /// further events are ignored.
    pub fn apply_event(&mut self, event: &ComposeEvent) -> EventEffect {
        if self.phase != ComposePhase::Progress {
            return EventEffect::Ignored;
        }
        match event.status {
            ComposeStatus::Progress => {
                self.message = event.message.clone();
                if let Some(progress) = event.visual.progress {
                    self.progress = progress;
                }
                EventEffect::Updated
            }
            ComposeStatus::Completed => {
                self.message = event.message.clone();
                self.progress = 100.0;
                self.phase = ComposePhase::Complete;
                EventEffect::Completed
            }
            ComposeStatus::Error => {
                self.fail(event.message.clone());
                EventEffect::Failed
            }
        }
    }

    /// Transport-level failure of the stream; treated like an error event.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.phase == ComposePhase::Progress {
            let message = message.into();
            self.message = message.clone();
            self.error = Some(message);
            self.phase = ComposePhase::Error;
        }
    }

    // ---- Complete ----

    /// Output actions currently selectable.
    pub fn available_outputs(&self) -> Vec<OutputAction> {
        if self.phase == ComposePhase::Complete && self.output.is_none() {
            OutputAction::ALL.to_vec()
        } else {
            Vec::new()
        }
    }

    /// Choose the output for this run. Terminal: only one choice per run.
    pub fn choose_output(&mut self, action: OutputAction) -> Result<(), CoreError> {
        self.require_phase(ComposePhase::Complete, "choose an output")?;
        if let Some(chosen) = self.output {
            return Err(CoreError::Conflict(format!(
                "Output '{}' was already chosen for this run",
                chosen.label()
            )));
        }
        self.output = Some(action);
        Ok(())
    }

    /// Discard all wizard state and return to `Start`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn require_phase(&self, expected: ComposePhase, action: &str) -> Result<(), CoreError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Cannot {action} while the wizard is in the '{}' state",
                self.phase.as_str()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
