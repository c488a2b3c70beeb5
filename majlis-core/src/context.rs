use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::patterns::normalize;

/// Maximum number of triggers kept in the rolling history.
pub const CONTEXT_CAPACITY: usize = 10;

/// Bounded FIFO of recent triggers for one meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::with_capacity(CONTEXT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, trigger: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(trigger.into());
    }

    /// True if any remembered trigger contains any of `keywords`.
    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        self.entries.iter().any(|entry| {
            let entry = normalize(entry);
            keywords.iter().any(|k| entry.contains(&normalize(k)))
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
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
