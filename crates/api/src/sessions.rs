//! In-memory registries of open editor sessions and compose runs.
//!
//! Both are thread-safe via interior `RwLock`s and are shared through
//! [`crate::state::AppState`]. Each editor session sits behind its own
//! `Mutex`, so edits to one canvas are applied one at a time in arrival
//! order while other sessions proceed independently.
//!
//! A compose run lives until it is deleted or until the last browser relay
//! of its progress is dropped, whichever comes first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex, RwLock};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use vitrine_client::api::CmsApi;
use vitrine_client::compose::{drive, ComposeSubscription};
use vitrine_client::editor::EditorSession;
use vitrine_core::composer::{ComposerWizard, OutputAction};
use vitrine_core::error::CoreError;
use vitrine_core::types::EntityId;

use crate::error::AppResult;

pub type SharedSession = Arc<Mutex<EditorSession>>;

// ---------------------------------------------------------------------------
// Editor sessions
// ---------------------------------------------------------------------------

pub struct EditorSessions {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl Default for EditorSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSessions {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a session under a fresh id.
    pub async fn insert(&self, session: EditorSession) -> (String, SharedSession) {
        let id = uuid::Uuid::new_v4().to_string();
        let shared = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::clone(&shared));
        (id, shared)
    }

    pub async fn get(&self, id: &str) -> Result<SharedSession, CoreError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("EditorSession", id))
    }

    /// Unregister a session. The caller is responsible for closing it.
    pub async fn remove(&self, id: &str) -> Result<SharedSession, CoreError> {
        self.sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| CoreError::not_found("EditorSession", id))
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Flush every open session. Used during graceful shutdown.
    pub async fn flush_all(&self) {
        let sessions: Vec<(String, SharedSession)> = self
            .sessions
            .write()
            .await
            .drain()
            .collect();
        for (id, session) in sessions {
            if let Err(e) = session.lock().await.flush().await {
                tracing::warn!(session_id = %id, error = %e, "Failed to flush editor session");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Compose runs
// ---------------------------------------------------------------------------

/// One composition run and the task reading its upstream stream.
pub struct ComposeRun {
    wizard: Arc<Mutex<ComposerWizard>>,
    updates: Arc<watch::Sender<ComposerWizard>>,
    /// Cancels the upstream reader. Also fired when the run finishes.
    cancel: CancellationToken,
    /// Fired only when the run is torn down.
    closed: CancellationToken,
    /// Open browser relays, see [`RelayGuard`].
    relays: AtomicUsize,
}

impl ComposeRun {
    /// Validate the selection, open the upstream stream and start reading.
    ///
    /// Selection errors are reported before any network call.
    pub async fn start(
        api: &CmsApi,
        store_id: EntityId,
        canvas_ids: Vec<EntityId>,
    ) -> AppResult<Self> {
        let mut wizard = ComposerWizard::new();
        wizard.select_store(store_id)?;
        wizard.select_canvases(canvas_ids)?;
        let target = wizard.begin()?;

        let mut subscription = ComposeSubscription::open(api, &target).await?;
        let cancel = subscription.cancel_token();
        let (tx, _) = watch::channel(wizard.clone());
        let updates = Arc::new(tx);
        let wizard = Arc::new(Mutex::new(wizard));

        let driven = Arc::clone(&wizard);
        let tx = Arc::clone(&updates);
        tokio::spawn(async move {
            drive(&driven, &mut subscription, |w| {
                tx.send_replace(w.clone());
            })
            .await;
        });

        Ok(Self {
            wizard,
            updates,
            cancel,
            closed: CancellationToken::new(),
            relays: AtomicUsize::new(0),
        })
    }

    pub async fn snapshot(&self) -> ComposerWizard {
        self.wizard.lock().await.clone()
    }

    /// Receiver of wizard snapshots, updated after every applied event and
    /// after an output is chosen.
    pub fn subscribe(&self) -> watch::Receiver<ComposerWizard> {
        self.updates.subscribe()
    }

    pub async fn choose_output(&self, action: OutputAction) -> Result<ComposerWizard, CoreError> {
        let mut wizard = self.wizard.lock().await;
        wizard.choose_output(action)?;
        self.updates.send_replace(wizard.clone());
        Ok(wizard.clone())
    }

    /// Close the upstream stream and end every relay. No cancel is sent
    /// to the backend.
    pub fn close(&self) {
        self.cancel.cancel();
        self.closed.cancel();
    }

    /// Resolves once the run is torn down.
    pub fn closed(&self) -> WaitForCancellationFutureOwned {
        self.closed.clone().cancelled_owned()
    }
}

impl Drop for ComposeRun {
    fn drop(&mut self) {
        self.close();
    }
}

/// Held by each open browser relay of a run.
///
/// Dropping the last guard closes the upstream stream and unregisters the
/// run, unless another relay attached in the meantime.
pub struct RelayGuard {
    runs: Arc<ComposeRuns>,
    id: String,
    run: Arc<ComposeRun>,
}

impl RelayGuard {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn run(&self) -> &ComposeRun {
        &self.run
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        if self.run.relays.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        let runs = Arc::clone(&self.runs);
        let id = std::mem::take(&mut self.id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if runs.release(&id).await {
                        tracing::info!(run_id = %id, "Compose run closed with its last relay");
                    }
                });
            }
            Err(_) => self.run.close(),
        }
    }
}

pub struct ComposeRuns {
    runs: RwLock<HashMap<String, Arc<ComposeRun>>>,
}

impl Default for ComposeRuns {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposeRuns {
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, run: ComposeRun) -> (String, Arc<ComposeRun>) {
        let id = uuid::Uuid::new_v4().to_string();
        let run = Arc::new(run);
        self.runs.write().await.insert(id.clone(), Arc::clone(&run));
        (id, run)
    }

    pub async fn get(&self, id: &str) -> Result<Arc<ComposeRun>, CoreError> {
        self.runs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("ComposeRun", id))
    }

    /// Register a browser relay of run `id`.
    pub async fn attach(self: &Arc<Self>, id: &str) -> Result<RelayGuard, CoreError> {
        let run = self.get(id).await?;
        run.relays.fetch_add(1, Ordering::AcqRel);
        Ok(RelayGuard {
            runs: Arc::clone(self),
            id: id.to_string(),
            run,
        })
    }

    /// Tear a run down, closing its stream.
    pub async fn remove(&self, id: &str) -> Result<(), CoreError> {
        let run = self
            .runs
            .write()
            .await
            .remove(id)
            .ok_or_else(|| CoreError::not_found("ComposeRun", id))?;
        run.close();
        Ok(())
    }

    /// Remove run `id` if no relay is attached. Returns whether it was removed.
    async fn release(&self, id: &str) -> bool {
        let mut runs = self.runs.write().await;
        let idle = runs
            .get(id)
            .is_some_and(|run| run.relays.load(Ordering::Acquire) == 0);
        if !idle {
            return false;
        }
        if let Some(run) = runs.remove(id) {
            run.close();
        }
        true
    }

    pub async fn count(&self) -> usize {
        self.runs.read().await.len()
    }

    pub async fn close_all(&self) {
        for (_, run) in self.runs.write().await.drain() {
            run.close();
        }
    }
}
