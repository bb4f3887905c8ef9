// src/services/history.rs
//
// Bounded back/forward navigation list with a cursor.
//
// Invariant: 0 <= cursor < len whenever the history is non-empty.
// Pushing while the cursor is not at the tail abandons the stale forward
// branch. When the cap is reached the oldest entry is dropped and the
// cursor shifts down, preserving relative position.

use crate::domain::Artwork;

pub const HISTORY_CAP: usize = 20;

#[derive(Debug)]
pub struct HistoryState {
    records: Vec<Artwork>,
    cursor: Option<usize>,
    cap: usize,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self::new(HISTORY_CAP)
    }
}

impl HistoryState {
    pub fn new(cap: usize) -> Self {
        assert!(cap > 0, "history cap must be positive");
        Self {
            records: Vec::new(),
            cursor: None,
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The record currently displayed.
    pub fn current(&self) -> Option<&Artwork> {
        self.cursor.map(|c| &self.records[c])
    }

    pub fn has_next(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.records.len())
    }

    pub fn has_prev(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    /// The forward-history record, if any (replay candidate).
    pub fn peek_next(&self) -> Option<&Artwork> {
        match self.cursor {
            Some(c) if c + 1 < self.records.len() => self.records.get(c + 1),
            _ => None,
        }
    }

    /// The backward neighbor, if any.
    pub fn peek_prev(&self) -> Option<&Artwork> {
        match self.cursor {
            Some(c) if c > 0 => self.records.get(c - 1),
            _ => None,
        }
    }

    pub fn records(&self) -> &[Artwork] {
        &self.records
    }

    /// Append a newly displayed record.
    ///
    /// Truncates the forward branch if the cursor is not at the tail, then
    /// enforces the cap by dropping the oldest entry.
    pub fn push(&mut self, artwork: Artwork) {
        if let Some(c) = self.cursor {
            self.records.truncate(c + 1);
        }
        self.records.push(artwork);
        if self.records.len() > self.cap {
            self.records.remove(0);
        }
        self.cursor = Some(self.records.len() - 1);
    }

    /// Replay forward without any resolution. Returns None at the tail.
    pub fn step_forward(&mut self) -> Option<&Artwork> {
        match self.cursor {
            Some(c) if c + 1 < self.records.len() => {
                self.cursor = Some(c + 1);
                self.records.get(c + 1)
            }
            _ => None,
        }
    }

    /// Step back. Returns None at the origin.
    pub fn step_backward(&mut self) -> Option<&Artwork> {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                self.records.get(c - 1)
            }
            _ => None,
        }
    }

    /// Drop everything; used on filter change.
    pub fn reset(&mut self) {
        self.records.clear();
        self.cursor = None;
    }
}
