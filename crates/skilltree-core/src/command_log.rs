//! Bounded history of unlock operations.
//!
//! Records are appended at the back. When the log is full the oldest record
//! is evicted from the front. Undo always pops from the back, so the most
//! recent unlock is always undoable regardless of how many were evicted.

use crate::id::SkillId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of records kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Lifecycle of a recorded unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    Executed,
    Undone,
}

/// One unlock operation, kept so it can be reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// The skill that was unlocked.
    pub skill: SkillId,
    /// Player XP observed immediately before the unlock.
    pub xp_before: u32,
    pub status: CommandStatus,
}

impl CommandRecord {
    pub fn executed(skill: SkillId, xp_before: u32) -> Self {
        Self {
            skill,
            xp_before,
            status: CommandStatus::Executed,
        }
    }
}

/// FIFO ring of [`CommandRecord`]s with a fixed capacity.
#[derive(Debug, Clone)]
pub struct CommandLog {
    records: VecDeque<CommandRecord>,
    capacity: usize,
    /// Total records pushed out of the front since creation.
    evicted: u64,
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl CommandLog {
    /// Create an empty log. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Append a record. If full, the oldest record is evicted and returned.
    pub fn push(&mut self, record: CommandRecord) -> Option<CommandRecord> {
        let evicted = if self.records.len() == self.capacity {
            self.evicted += 1;
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(record);
        evicted
    }

    /// Remove and return the most recently appended record.
    pub fn pop_latest(&mut self) -> Option<CommandRecord> {
        self.records.pop_back()
    }

    pub fn latest(&self) -> Option<&CommandRecord> {
        self.records.back()
    }

    /// Records from oldest to newest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &CommandRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
