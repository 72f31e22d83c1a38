//! HTTP, SSE and persistence plumbing for the Vitrine console.
//!
//! Wraps the CMS backend's REST API, decodes its server-sent compose
//! progress stream, coalesces canvas writes behind a trailing-edge
//! debounce, and ties those together with the core history in an
//! [`editor::EditorSession`].

pub mod api;
pub mod auth;
pub mod autosave;
pub mod compose;
pub mod editor;
pub mod sse;
