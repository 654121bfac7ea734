//! # Emergency log collaborator.
//!
//! Persistence is external; the bridge only needs an append-only sink.
//! [`InMemoryEmergencyLog`] is the process-local implementation used by the
//! demos and tests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::detection::EmergencyLogEntry;
use crate::error::LogError;

/// Append-only emergency history.
#[async_trait]
pub trait EmergencyLog: Send + Sync + 'static {
    /// Appends one entry.
    async fn append(&self, entry: EmergencyLogEntry) -> Result<(), LogError>;

    /// Entries, newest first.
    async fn recent(&self) -> Result<Vec<EmergencyLogEntry>, LogError>;

    /// Drops the whole history.
    async fn clear(&self) -> Result<(), LogError>;
}

/// Bounded in-memory log. The oldest entry is evicted when full.
pub struct InMemoryEmergencyLog {
    entries: Mutex<VecDeque<EmergencyLogEntry>>,
    capacity: usize,
    reject: Option<String>,
}

impl InMemoryEmergencyLog {
    /// Default number of retained entries.
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Creates a log with [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY).
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a log retaining at most `capacity` entries (min 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            reject: None,
        }
    }

    /// A log that refuses every append with [`LogError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            reject: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryEmergencyLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmergencyLog for InMemoryEmergencyLog {
    async fn append(&self, entry: EmergencyLogEntry) -> Result<(), LogError> {
        if let Some(reason) = &self.reject {
            return Err(LogError::Unavailable(reason.clone()));
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_back();
        }
        entries.push_front(entry);
        Ok(())
    }

    async fn recent(&self) -> Result<Vec<EmergencyLogEntry>, LogError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.iter().cloned().collect())
    }

    async fn clear(&self) -> Result<(), LogError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
