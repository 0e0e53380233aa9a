//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(AppContext, EventId, Bytes) -> Fut`,
//! producing a fresh future per invocation. State a subscriber needs across
//! invocations is captured in the closure (wrap it in `Arc<...>` explicitly
//! if shared).
//!
//! ## Example
//! ```rust
//! use busvisor::{AppContext, EventId, HandlerFn, HandlerRef, HandlerError};
//! use bytes::Bytes;
//!
//! let h: HandlerRef = HandlerFn::arc("audit", |_app: AppContext, id: EventId, payload: Bytes| async move {
//!     // write audit record for (id, payload)...
//!     let _ = (id, payload.len());
//!     Ok::<_, HandlerError>(())
//! });
//!
//! assert_eq!(h.name(), "audit");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::HandlerError;
use crate::events::EventId;
use crate::handlers::handler::{AppContext, Handle};

/// Function-backed handler implementation.
///
/// Wraps a closure that *creates* a new future per invocation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a
    /// [`HandlerRef`](crate::HandlerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared `Arc`.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Handle for HandlerFn<F>
where
    F: Fn(AppContext, EventId, Bytes) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn on_event(
        &self,
        app: AppContext,
        event_id: EventId,
        payload: Bytes,
    ) -> Result<(), HandlerError> {
        (self.f)(app, event_id, payload).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_closure_is_invoked_with_payload() {
        let seen = Arc::new(AtomicU32::new(0));
        let seen2 = Arc::clone(&seen);
        let h = HandlerFn::new("probe", move |_app: AppContext, id: EventId, payload: Bytes| {
            let seen = Arc::clone(&seen2);
            async move {
                assert_eq!(&payload[..], b"ping");
                seen.store(id, Ordering::SeqCst);
                Ok(())
            }
        });

        let app: AppContext = Arc::new(());
        h.on_event(app, 42, Bytes::from_static(b"ping"))
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[tokio::test]
    async fn test_app_context_downcast() {
        let h = HandlerFn::new("ctx", |app: AppContext, _id: EventId, _payload: Bytes| async move {
            let n = app.downcast_ref::<u64>().copied().unwrap_or(0);
            assert_eq!(n, 7);
            Ok(())
        });

        let app: AppContext = Arc::new(7u64);
        h.on_event(app, 1, Bytes::new()).await.unwrap();
    }
}
