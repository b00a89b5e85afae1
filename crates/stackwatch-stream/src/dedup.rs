//! Per-session event deduplication

use stackwatch_cloud::StackEvent;
use std::collections::HashSet;

/// Event ids already emitted in one stream session
///
/// Owned by exactly one session and dropped with it. There is no eviction:
/// the set lives as long as the session does.
#[derive(Debug, Default)]
pub struct SeenEvents {
    seen: HashSet<String>,
}

impl SeenEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event; true only the first time its id shows up
    pub fn admit(&mut self, event: &StackEvent) -> bool {
        if self.seen.contains(&event.event_id) {
            return false;
        }
        self.seen.insert(event.event_id.clone())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
