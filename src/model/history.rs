use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Entries kept for backend context; older ones are dropped on push.
pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub player_action: String,
    pub narrator_response: String,
}

impl HistoryEntry {
    pub fn new(player_action: impl Into<String>, narrator_response: impl Into<String>) -> Self {
        Self {
            player_action: player_action.into(),
            narrator_response: narrator_response.into(),
        }
    }

    /// Two-line form embedded in prompts.
    pub fn serialize(&self) -> String {
        format!(
            "Player: {}\nNarrator: {}",
            self.player_action, self.narrator_response
        )
    }
}

/// Rolling buffer of the most recent turns, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Up to `n` newest entries, in chronological order.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
