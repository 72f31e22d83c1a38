//! Linear undo/redo history of owned snapshots.
//!
//! Every recorded entry is an owned value moved into the stack; accessors
//! only hand out shared references, so an entry can never be mutated after
//! it was recorded. Recording while the cursor is behind the newest entry
//! discards the redo branch (no branching timeline).

use serde::Serialize;

/// Default maximum number of entries kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// Undo/redo stack with a cursor pointing at the displayed entry.
///
/// Invariant: `cursor < entries.len()` whenever `entries` is non-empty.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    cursor: usize,
    limit: usize,
}

/// Serializable summary of the stack position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryInfo {
    pub cursor: usize,
    pub len: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl<T> History<T> {
    /// Create an empty history with [`DEFAULT_HISTORY_LIMIT`].
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create an empty history that keeps at most `limit` entries (min 1).
    ///
    /// When the limit is exceeded the oldest entries are evicted.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record a new snapshot after the cursor.
    ///
    /// Entries after the cursor are discarded, the snapshot is appended and
    /// the cursor moves to it. Recording into an empty history makes the
    /// snapshot entry zero.
    pub fn record(&mut self, snapshot: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one entry. At entry zero this is a no-op.
    ///
    /// Returns the entry now at the cursor, or `None` if empty.
    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        self.current()
    }

    /// Step forward one entry, if a redo branch exists.
    ///
    /// Returns the entry now at the cursor, or `None` if empty.
    pub fn redo(&mut self) -> Option<&T> {
        if self.can_redo() {
            self.cursor += 1;
        }
        self.current()
    }

    /// The displayed entry.
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor < self.entries.len() - 1
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from the oldest to the newest, including any redo branch.
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn info(&self) -> HistoryInfo {
        HistoryInfo {
            cursor: self.cursor,
            len: self.entries.len(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
