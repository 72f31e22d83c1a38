use std::time::Duration;

use vitrine_client::autosave::DEFAULT_DEBOUNCE;
use vitrine_core::history::DEFAULT_HISTORY_LIMIT;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against a CMS
/// backend on `localhost:8000`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the CMS backend.
    pub cms_api_url: String,
    /// Quiet window before an edit is auto-saved.
    pub autosave_debounce_ms: u64,
    /// Maximum undo entries kept per editor session.
    pub history_limit: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `CMS_API_URL`          | `http://localhost:8000`    |
    /// | `AUTOSAVE_DEBOUNCE_MS` | `1000`                     |
    /// | `HISTORY_LIMIT`        | `500`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let cms_api_url =
            std::env::var("CMS_API_URL").unwrap_or_else(|_| "http://localhost:8000".into());

        let autosave_debounce_ms: u64 = std::env::var("AUTOSAVE_DEBOUNCE_MS")
            .map(|v| v.parse().expect("AUTOSAVE_DEBOUNCE_MS must be a valid u64"))
            .unwrap_or(DEFAULT_DEBOUNCE.as_millis() as u64);

        let history_limit: usize = std::env::var("HISTORY_LIMIT")
            .map(|v| v.parse().expect("HISTORY_LIMIT must be a valid usize"))
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            cms_api_url,
            autosave_debounce_ms,
            history_limit,
        }
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}
