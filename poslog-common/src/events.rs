//! Event types for the review session
//!
//! The correction session controller emits [`ReviewEvent`]s on an [`EventBus`]
//! so that views and loggers can follow a session without touching its state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Direction of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// Review session events
///
/// Serialized with a `type` tag so they can be written as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewEvent {
    /// Session created over a store of `item_count` items
    SessionStarted {
        session_id: Uuid,
        item_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// The cursor moved to a new item
    ItemSelected {
        session_id: Uuid,
        index: usize,
        solved: bool,
    },

    /// A manual tag was written
    TagChanged {
        session_id: Uuid,
        index: usize,
        token: usize,
        tag: Option<String>,
        solved: bool,
    },

    /// Navigation found no further target in `direction`
    ///
    /// The view decides whether to save and exit or restart at the first item.
    EndOfReview {
        session_id: Uuid,
        direction: Direction,
    },

    /// Manual tags were written to `output`
    SessionSaved {
        session_id: Uuid,
        output: PathBuf,
        unsolved: Vec<usize>,
        timestamp: DateTime<Utc>,
    },

    /// Session reached its terminal state
    SessionEnded {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus for [`ReviewEvent`]s
///
/// Cloning the bus shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ReviewEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per receiver
    ///
    /// # Examples
    ///
    /// ```
    /// use poslog_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ReviewEvent,
    ) -> Result<usize, broadcast::error::SendError<ReviewEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ReviewEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
