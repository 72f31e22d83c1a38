//! The canvas aggregate: the unit of persistence and of undo/redo.

use serde::{Deserialize, Serialize};

use crate::designer::DesignerInfo;
use crate::error::CoreError;
use crate::layout::LayoutRow;
use crate::registry::WidgetRegistry;
use crate::types::{next_timestamp_id, EntityId, Timestamp};
use crate::zone::Zone;

/// Authoring status of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasStatus {
    #[default]
    Draft,
    Complete,
}

impl CanvasStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Complete => "complete",
        }
    }
}

/// A storefront page under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub id: EntityId,
    pub title: String,
    pub page_type: String,
    #[serde(default)]
    pub zones: Vec<Zone>,
    /// Grid rows used by the layout designer.
    #[serde(default)]
    pub rows: Vec<LayoutRow>,
    #[serde(default)]
    pub status: CanvasStatus,
    /// Captured on the first explicit save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designer: Option<DesignerInfo>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Canvas {
    /// Create an empty canvas with the registry's zones for `page_type`.
    pub fn new(
        title: impl Into<String>,
        page_type: &str,
        registry: &WidgetRegistry,
    ) -> Result<Self, CoreError> {
        let title = title.into();
        validate_title(&title)?;
        let zones = registry.blank_zones(page_type)?;
        let now = chrono::Utc::now();
        Ok(Self {
            id: format!("canvas-{}", next_timestamp_id()),
            title,
            page_type: page_type.to_string(),
            zones,
            rows: Vec::new(),
            status: CanvasStatus::Draft,
            designer: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn zone(&self, name: &str) -> Result<&Zone, CoreError> {
        self.zones
            .iter()
            .find(|z| z.name == name)
            .ok_or_else(|| CoreError::not_found("Zone", name))
    }

    pub fn zone_mut(&mut self, name: &str) -> Result<&mut Zone, CoreError> {
        self.zones
            .iter_mut()
            .find(|z| z.name == name)
            .ok_or_else(|| CoreError::not_found("Zone", name))
    }

    pub fn row(&self, index: usize) -> Result<&LayoutRow, CoreError> {
        self.rows.get(index).ok_or_else(|| {
            CoreError::Validation(format!(
                "Row {index} is out of range (canvas has {} rows)",
                self.rows.len()
            ))
        })
    }

    pub fn row_mut(&mut self, index: usize) -> Result<&mut LayoutRow, CoreError> {
        let len = self.rows.len();
        self.rows.get_mut(index).ok_or_else(|| {
            CoreError::Validation(format!(
                "Row {index} is out of range (canvas has {len} rows)"
            ))
        })
    }

    /// Total number of components across zones and row slots.
    pub fn component_count(&self) -> usize {
        let in_zones: usize = self.zones.iter().map(|z| z.components.len()).sum();
        let in_rows = self
            .rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .filter(|c| c.component.is_some())
            .count();
        in_zones + in_rows
    }

    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}

/// Maximum length of a canvas title.
pub const MAX_TITLE_LEN: usize = 200;

/// Validate a canvas title: non-blank and at most [`MAX_TITLE_LEN`] chars.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Canvas title must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Canvas title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
