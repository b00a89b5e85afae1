//! Stream session configuration

use std::time::Duration;

/// Pause between poll cycles while a stack is still in progress
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Sleep between two poll cycles of a non-terminal stack
    pub poll_interval: Duration,
}

impl StreamConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
