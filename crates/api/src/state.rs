use std::sync::Arc;

use vitrine_client::api::CmsApi;
use vitrine_core::registry::WidgetRegistry;

use crate::config::ServerConfig;
use crate::sessions::{ComposeRuns, EditorSessions};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Unauthenticated CMS client; handlers derive per-request clients from it.
    pub cms: CmsApi,
    /// Page types, their zones and allowed component types.
    pub registry: Arc<WidgetRegistry>,
    /// Open editor sessions.
    pub editors: Arc<EditorSessions>,
    /// Active composition runs.
    pub compose_runs: Arc<ComposeRuns>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let cms = CmsApi::new(config.cms_api_url.clone());
        Self {
            config: Arc::new(config),
            cms,
            registry: Arc::new(WidgetRegistry::builtin()),
            editors: Arc::new(EditorSessions::new()),
            compose_runs: Arc::new(ComposeRuns::new()),
        }
    }
}
