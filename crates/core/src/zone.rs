//! Named component containers belonging to a page type.

use serde::{Deserialize, Serialize};

use crate::component::{renumber, ComponentInstance};
use crate::error::CoreError;

/// How a zone arranges its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneLayout {
    #[default]
    Row,
    Column,
    Grid,
    Custom,
}

impl ZoneLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Column => "column",
            Self::Grid => "grid",
            Self::Custom => "custom",
        }
    }
}

/// A named container (e.g. `header`, `mainLeft`, `footer`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub name: String,
    pub page_type: String,
    /// Components in rendering order; `order` always equals the position.
    #[serde(default)]
    pub components: Vec<ComponentInstance>,
    /// Component types that may be dropped here. Empty means any type.
    #[serde(default)]
    pub allowed_types: Vec<String>,
    #[serde(default)]
    pub layout: ZoneLayout,
    /// Column count when `layout` is [`ZoneLayout::Grid`].
    #[serde(default)]
    pub grid_columns: Option<u32>,
}

impl Zone {
    pub fn new(name: impl Into<String>, page_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page_type: page_type.into(),
            components: Vec::new(),
            allowed_types: Vec::new(),
            layout: ZoneLayout::default(),
            grid_columns: None,
        }
    }

    /// Returns `true` if a component of `component_type` may be placed here.
    pub fn allows(&self, component_type: &str) -> bool {
        self.allowed_types.is_empty() || self.allowed_types.iter().any(|t| t == component_type)
    }

    /// Position of the component with `component_id`, if present.
    pub fn position_of(&self, component_id: &str) -> Option<usize> {
        self.components.iter().position(|c| c.id == component_id)
    }

    /// Insert at `index` (clamped to the list length) and renumber.
    pub fn insert(&mut self, index: usize, component: ComponentInstance) {
        let index = index.min(self.components.len());
        self.components.insert(index, component);
        renumber(&mut self.components);
    }

    /// Remove the component with `component_id` and renumber.
    pub fn remove(&mut self, component_id: &str) -> Result<ComponentInstance, CoreError> {
        let position = self
            .position_of(component_id)
            .ok_or_else(|| CoreError::not_found("Component", component_id))?;
        let removed = self.components.remove(position);
        renumber(&mut self.components);
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
