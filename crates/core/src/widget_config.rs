//! Slot-keyed widget map used by the layout designer.
//!
//! The map is derived from a canvas's rows: every column holding a widget
//! contributes an entry keyed by `"{row}-{column}"`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::layout::LayoutRow;
use crate::types::EntityId;

/// `(row, column)` position of a layout slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub row: usize,
    pub column: usize,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.column)
    }
}

impl FromStr for SlotKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Validation(format!("Invalid slot key '{s}', expected 'row-column'"));
        let (row, column) = s.split_once('-').ok_or_else(invalid)?;
        Ok(Self {
            row: row.parse().map_err(|_| invalid())?,
            column: column.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for SlotKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The widget bound to one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWidget {
    #[serde(rename = "type")]
    pub widget_type: String,
    /// Durable backend id; `None` until the fragment was persisted.
    pub id: Option<EntityId>,
}

/// `slotKey → { type, id }` for every occupied slot.
pub type WidgetConfig = BTreeMap<SlotKey, SlotWidget>;

/// Derive the widget map from layout rows.
pub fn widget_config(rows: &[LayoutRow]) -> WidgetConfig {
    rows.iter()
        .enumerate()
        .flat_map(|(row, layout_row)| {
            layout_row
                .columns
                .iter()
                .enumerate()
                .filter_map(move |(column, slot)| {
                    slot.component.as_ref().map(|component| {
                        (
                            SlotKey { row, column },
                            SlotWidget {
                                widget_type: component.component_type.clone(),
                                id: slot.fragment_id.clone(),
                            },
                        )
                    })
                })
        })
        .collect()
}

/// Slots holding a widget that has not been persisted yet.
pub fn unpersisted_slots(config: &WidgetConfig) -> Vec<SlotKey> {
    config
        .iter()
        .filter(|(_, widget)| widget.id.is_none())
        .map(|(key, _)| *key)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
