//! Vitrine domain core.
//!
//! Pure data model and state transitions for the storefront composition
//! console: canvases, layout rows, zones, component instances, the widget
//! registry, edit operations, the undo/redo history stack and the
//! composition wizard. Nothing in this crate performs I/O, so it is shared
//! by the HTTP client layer and the console server alike.

pub mod canvas;
pub mod catalog;
pub mod component;
pub mod composer;
pub mod designer;
pub mod edit;
pub mod error;
pub mod history;
pub mod layout;
pub mod layout_template;
pub mod registry;
pub mod types;
pub mod widget_config;
pub mod zone;
