//! Audit event types and EventBus
//!
//! Batch runs publish their progress here so a front end can render it live
//! without sharing the item list.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::BatchStatus;

/// Audit events
///
/// Serializable so a front end can forward them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuditEvent {
    /// A batch run started; all items were reset to Pending
    BatchStarted {
        total: usize,
        /// True when every item is analyzed with the shared placeholder payload
        placeholder_payload: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An item moved to Processing
    BatchItemStarted {
        index: usize,
        item_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An item reached a terminal status
    BatchItemFinished {
        index: usize,
        item_id: String,
        status: BatchStatus,
        /// The stored verdict was the relay's canned fallback
        degraded: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress after an item finished
    BatchProgress {
        completed: usize,
        total: usize,
        /// Rounded to the nearest whole percent
        percent: u8,
    },

    /// The run finished
    BatchCompleted {
        completed: usize,
        failed: usize,
        degraded: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Broadcast channel for audit events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AuditEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AuditEvent) {
        let _ = self.tx.send(event);
    }
}

/// Percent of `completed` over `total`, rounded half up
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (completed.min(total) as f64 / total as f64 * 100.0).round();
    percent as u8
}
