//! # Event handlers for the busvisor runtime.
//!
//! This module provides the [`Handle`] trait — the capability object a
//! subscriber registers with the bus — and adapters for building handlers
//! from plain closures.
//!
//! ## Architecture
//! ```text
//! Delivery flow:
//!   publish ──► dispatch loop ──► direct handlers (inline, in order)
//!                     │
//!                     └──► worker pool ──► indirect handlers
//!                                          (supervised, hand-off on overrun)
//! ```
//!
//! ## Handler kinds
//! - **Direct** — invoked synchronously on the dispatch task; keep these short.
//! - **Indirect** — invoked on a pooled worker under the latency budget; a
//!   handler that overruns keeps running, but the rest of the subscriber
//!   list is handed to a fresh worker.
//!
//! ## Implementing custom handlers
//! ```no_run
//! use busvisor::{AppContext, EventId, Handle, HandlerError};
//! use async_trait::async_trait;
//! use bytes::Bytes;
//!
//! struct Metrics;
//!
//! #[async_trait]
//! impl Handle for Metrics {
//!     async fn on_event(
//!         &self,
//!         _app: AppContext,
//!         event_id: EventId,
//!         payload: Bytes,
//!     ) -> Result<(), HandlerError> {
//!         // increment a counter for event_id, inspect payload...
//!         let _ = (event_id, payload.len());
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "metrics"
//!     }
//! }
//! ```

mod handler;
mod handler_fn;

#[cfg(feature = "logging")]
mod log;

pub use handler::{AppContext, Handle, HandlerRef};
pub use handler_fn::HandlerFn;

#[cfg(feature = "logging")]
pub use log::LogHandler;
