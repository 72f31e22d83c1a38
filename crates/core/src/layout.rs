//! Layout rows and columns for the grid-style page designer.
//!
//! A row is an ordered list of columns whose widths are integer
//! percentages. Rows created by adding or removing columns always sum to
//! exactly [`FULL_WIDTH`].

use serde::{Deserialize, Serialize};

use crate::component::ComponentInstance;
use crate::types::EntityId;

/// Total width of a row, in percent.
pub const FULL_WIDTH: u32 = 100;

/// One column slot in a layout row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Width as an integer percentage of the row.
    pub width: u32,
    /// Component bound to this slot, if any.
    #[serde(default)]
    pub component: Option<ComponentInstance>,
    /// Durable id of the backing fragment, `None` until the backend
    /// assigned one.
    #[serde(default)]
    pub fragment_id: Option<EntityId>,
}

impl Column {
    /// An empty column of the given width.
    pub fn with_width(width: u32) -> Self {
        Self {
            width,
            component: None,
            fragment_id: None,
        }
    }
}

/// A horizontal band of columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutRow {
    pub columns: Vec<Column>,
}

/// Why a structural row edit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRefusal {
    /// A row must always keep at least one column.
    LastColumn,
}

impl RowRefusal {
    pub fn reason(self) -> &'static str {
        match self {
            Self::LastColumn => "a row must keep at least one column",
        }
    }
}

impl LayoutRow {
    /// Build a row from caller-supplied widths. Widths are taken as-is.
    pub fn from_widths(widths: &[u32]) -> Self {
        Self {
            columns: widths.iter().copied().map(Column::with_width).collect(),
        }
    }

    /// Sum of all column widths.
    pub fn total_width(&self) -> u32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    /// Append a column and split the row evenly.
    pub fn add_column(&mut self) {
        self.columns.push(Column::with_width(0));
        self.redistribute();
    }

    /// Remove the column at `index` and split the remaining width evenly.
    ///
    /// Refused when the row has a single column. `index` must be in range;
    /// callers check bounds before calling.
    pub fn remove_column(&mut self, index: usize) -> Result<Column, RowRefusal> {
        if self.columns.len() <= 1 {
            return Err(RowRefusal::LastColumn);
        }
        let removed = self.columns.remove(index);
        self.redistribute();
        Ok(removed)
    }

    fn redistribute(&mut self) {
        let widths = even_widths(self.columns.len());
        for (column, width) in self.columns.iter_mut().zip(widths) {
            column.width = width;
        }
    }
}

/// Split [`FULL_WIDTH`] across `count` columns.
///
/// Every column gets `FULL_WIDTH / count`; the first `FULL_WIDTH % count`
/// columns get one extra percent, so the result always sums to exactly
/// [`FULL_WIDTH`]. Returns an empty vector for `count == 0`.
pub fn even_widths(count: usize) -> Vec<u32> {
    if count == 0 {
        return Vec::new();
    }
    let n = count as u32;
    let base = FULL_WIDTH / n;
    let remainder = (FULL_WIDTH - base * n) as usize;
    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
