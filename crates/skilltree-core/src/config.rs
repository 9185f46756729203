use crate::command_log::DEFAULT_HISTORY_CAPACITY;
use serde::{Deserialize, Serialize};

/// Tunables for a [`ProgressionEngine`](crate::engine::ProgressionEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unlock records kept for undo. Clamped to at least 1.
    pub history_capacity: usize,
    /// Delivered events kept in the bus log. 0 disables the log.
    pub event_log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            event_log_capacity: 64,
        }
    }
}
