//! History
//!
//! Session history for partial navigations. Every pushed entry carries a
//! state with a monotonically increasing index.

use serde::{Deserialize, Serialize};
use url::Url;

/// State stored with each entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub index: u64,
}

/// History entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: Url,
    pub state: Option<HistoryState>,
}

/// History manager
#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: u64,
}

impl History {
    /// Start with one entry whose state is `{ index: 0 }`
    pub fn new(initial_url: Url) -> Self {
        Self {
            entries: vec![HistoryEntry {
                url: initial_url,
                state: Some(HistoryState { index: 0 }),
            }],
            index: 0,
        }
    }

    /// Push a new entry with the next index
    pub fn push_state(&mut self, url: Url) -> HistoryState {
        self.index += 1;
        let state = HistoryState { index: self.index };
        self.entries.push(HistoryEntry { url, state: Some(state) });
        state
    }

    /// Get current entry
    pub fn current(&self) -> &HistoryEntry {
        // Never empty: `new` seeds the first entry
        &self.entries[self.entries.len() - 1]
    }

    /// Get history length
    pub fn length(&self) -> usize {
        self.entries.len()
    }
}
