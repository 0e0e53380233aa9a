//! Published message model.
//!
//! A [`Message`] is what `publish` enqueues: the target event id plus an
//! owned copy of the caller's payload. The payload handle is refcounted
//! ([`Bytes`]), so the buffer is released exactly once — when the last
//! delivery path (inline direct subscribers, or the final worker of a
//! hand-off chain) drops its handle.

use bytes::Bytes;

/// Integer identifier of a published event.
pub type EventId = u32;

/// Queue insertion discipline for `publish`.
///
/// - [`Priority::High`] inserts at the **front** of the bus queue.
/// - [`Priority::Low`] inserts at the **back**.
///
/// Low-priority messages keep FIFO order; each High insert lands at the
/// front, so queued High messages drain newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Urgent: delivered before any queued low-priority message.
    High,
    /// Normal: delivered in arrival order after pending high-priority items.
    Low,
}

/// A published event waiting on the bus queue.
///
/// Owns the publish-time copy of the payload. Cloning the handle is cheap
/// (refcount bump) and never duplicates the buffer.
#[derive(Debug, Clone)]
pub struct Message {
    /// Target event id.
    pub event_id: EventId,
    /// Owned payload copy; may be empty.
    pub payload: Bytes,
}

impl Message {
    /// Creates a message owning a copy of `data`.
    pub fn new(event_id: EventId, data: &[u8]) -> Self {
        Self {
            event_id,
            payload: Bytes::copy_from_slice(data),
        }
    }
}
