//! Error types used by the busvisor runtime and event handlers.
//!
//! This module defines two main error types:
//!
//! - [`BusError`] — errors raised by the bus itself (capacity, locking, publish).
//! - [`HandlerError`] — errors raised by individual handler invocations.
//!
//! [`BusError`] provides helper methods (`as_label`, `as_message`) for
//! logging/metrics. None of these errors are fatal: a failed publish or
//! subscribe leaves prior bus state unchanged and is the caller's
//! responsibility to retry or ignore.

use std::time::Duration;
use thiserror::Error;

use crate::events::EventId;

/// # Errors produced by the bus runtime.
///
/// These represent bounded-resource exhaustion or synchronization timeouts,
/// never corruption: every variant leaves the bus state exactly as it was
/// before the failing call.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// The event table is full; no slot is left for a new event id.
    #[error("event table full ({capacity} events)")]
    EventTableFull {
        /// Configured maximum number of distinct events.
        capacity: usize,
    },

    /// The subscriber list of one event reached its configured capacity.
    #[error("subscriber list full for event {event_id:#010x} ({capacity} subscribers)")]
    SubscribersFull {
        /// Event whose list is full.
        event_id: EventId,
        /// Configured per-event subscriber capacity.
        capacity: usize,
    },

    /// All pooled workers are busy; the deferred delivery was dropped.
    #[error("no free worker, deferred delivery dropped")]
    WorkersBusy,

    /// The registry mutex could not be taken within the bounded wait.
    #[error("registry lock not acquired within {timeout:?}")]
    LockTimeout {
        /// The configured lock acquisition timeout.
        timeout: Duration,
    },

    /// The bus queue stayed full for the whole push timeout.
    #[error("publish timed out after {timeout:?} (queue full)")]
    PublishTimeout {
        /// The configured queue push timeout.
        timeout: Duration,
    },

    /// The bus is shut down; the queue no longer accepts messages.
    #[error("bus queue closed")]
    QueueClosed,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use busvisor::BusError;
    ///
    /// let err = BusError::WorkersBusy;
    /// assert_eq!(err.as_label(), "bus_workers_busy");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::EventTableFull { .. } => "bus_event_table_full",
            BusError::SubscribersFull { .. } => "bus_subscribers_full",
            BusError::WorkersBusy => "bus_workers_busy",
            BusError::LockTimeout { .. } => "bus_lock_timeout",
            BusError::PublishTimeout { .. } => "bus_publish_timeout",
            BusError::QueueClosed => "bus_queue_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Error returned by a handler invocation.
///
/// Handlers report failures through this type; the bus logs them and keeps
/// delivering to the remaining subscribers. A failing handler never aborts
/// a delivery.
#[derive(Error, Debug)]
#[error("handler failed: {reason}")]
pub struct HandlerError {
    /// Human-readable failure description.
    pub reason: String,
}

impl HandlerError {
    /// Creates a handler error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
