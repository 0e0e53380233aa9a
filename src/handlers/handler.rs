//! # Core handler trait
//!
//! [`Handle`] is the extension point for plugging consumers into the bus.
//! A handler is registered against one event id (or as the wildcard) and is
//! invoked once per matching delivery.
//!
//! ## Contract
//! - Direct handlers run **inline** on the dispatch task; they delay every
//!   later direct subscriber of the same message, so keep them short.
//! - Indirect handlers run on a pooled worker under the configured latency
//!   budget; exceeding it triggers a hand-off of the remaining subscriber
//!   list but never interrupts the running invocation.
//! - The same handler instance (`Arc` identity) can be registered at most
//!   once per event and once as the wildcard; re-registering is a no-op.
//! - Returning `Err` marks the invocation failed (logged); it does not stop
//!   delivery to other subscribers.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::HandlerError;
use crate::events::EventId;

/// Opaque application context handed to every handler invocation.
///
/// Set once at bus construction; handlers downcast it to whatever concrete
/// state the application shares across subscribers.
pub type AppContext = Arc<dyn Any + Send + Sync>;

/// Shared handle to a registered handler.
///
/// Identity (for duplicate detection and unsubscribe) is the `Arc` pointer:
/// two clones of the same `Arc` are the same subscriber, two separate
/// allocations are not, even if they wrap identical closures.
pub type HandlerRef = Arc<dyn Handle>;

/// Contract for event handlers.
///
/// Invoked from the dispatch task (direct) or a pooled worker (indirect).
/// Implementations should avoid blocking the async runtime (prefer async
/// I/O and cooperative waits).
#[async_trait]
pub trait Handle: Send + Sync + 'static {
    /// Handles a single delivery of `event_id`.
    ///
    /// # Parameters
    /// - `app`: the bus-wide application context (cheap `Arc` clone)
    /// - `event_id`: the published event id (wildcard handlers observe every id)
    /// - `payload`: the publish-time payload copy (cheap refcounted handle)
    async fn on_event(
        &self,
        app: AppContext,
        event_id: EventId,
        payload: Bytes,
    ) -> Result<(), HandlerError>;

    /// Human-readable name (for stats/logs).
    ///
    /// Used as the fallback when no explicit name is given at registration.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
