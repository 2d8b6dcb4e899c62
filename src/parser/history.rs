use chrono::{DateTime, Local};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: String,
    pub added_at: DateTime<Local>,
}

/// Most-recent-first list of parsed page URLs without duplicates.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Adds `url` at the front unless it is already present.
    pub fn push(&mut self, url: &str) {
        if self.limit == 0 || self.entries.iter().any(|e| e.url == url) {
            return;
        }
        self.entries.push_front(HistoryEntry {
            url: url.to_string(),
            added_at: Local::now(),
        });
        self.entries.truncate(self.limit);
    }

    /// Entry by 1-based position, newest first.
    pub fn get(&self, position: usize) -> Option<&HistoryEntry> {
        position.checked_sub(1).and_then(|i| self.entries.get(i))
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

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
