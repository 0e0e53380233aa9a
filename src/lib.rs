//! # busvisor
//!
//! **Busvisor** is an in-process publish/subscribe event bus for
//! latency-sensitive async environments.
//!
//! Producers publish events by integer id with an optional binary payload;
//! consumers register handlers against an id (or against all events)
//! without producer/consumer coupling. The defining feature is the
//! **latency supervisor**: a fixed pool of workers executes deferred
//! deliveries, and a per-subscriber latency budget bounds how long one slow
//! consumer can delay the rest of the list — on overrun, the unfinished
//! remainder of the subscriber list is handed off to a fresh worker without
//! re-invoking or skipping anyone.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   publish(id, payload, prio)         publish(id, payload, prio)
//!            │                                   │
//!            └────────────┬──────────────────────┘
//!                         ▼
//!          ┌────────────────────────────┐
//!          │  priority queue (bounded)  │   High → front, Low → back
//!          └─────────────┬──────────────┘
//!                        ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  dispatch task                                            │
//! │  - resolves the event in the Registry (bounded lock)      │
//! │  - direct handlers: inline, in subscription order         │
//! │  - indirect handlers: one job to the worker pool          │
//! └──────┬──────────────────────────────┬─────────────────────┘
//!        ▼                              ▼
//!   direct handlers          ┌─────────────────────────┐
//!   (+ direct wildcard)      │ worker pool (fixed N)   │
//!        │                   │  worker₀  …  workerₙ    │
//!        │                   │  supervised: budget per │
//!        │                   │  invocation, hand-off   │
//!        │                   │  of the remainder on    │
//!        │                   │  overrun                │
//!        │                   └───────────┬─────────────┘
//!        └─────────► stats collector ◄───┘
//!                  (ring buffer + min/avg/max)
//! ```
//!
//! ### Delivery of one message
//! ```text
//! pop message
//!   ├─► resolve(id) → { direct subs, indirect subs, wildcard }
//!   ├─► indirect wildcard + indirect subs → Job{cursor: 0} → free worker
//!   │        worker:
//!   │          loop: advance cursor, arm budget, invoke handler
//!   │            ├─ returns in time  → record latency, next subscriber
//!   │            └─ budget exceeded  → repost Job{cursor} to another
//!   │               worker (payload moves with it), let the slow handler
//!   │               finish, record its latency, stop iterating
//!   ├─► direct subs invoked inline, in order, each latency recorded
//!   └─► direct wildcard invoked inline
//! ```
//!
//! ## Features
//! | Area            | Description                                               | Key types                          |
//! |-----------------|-----------------------------------------------------------|------------------------------------|
//! | **Handler API** | Register direct/indirect/wildcard consumers.              | [`Handle`], [`HandlerFn`]          |
//! | **Publishing**  | Two-priority bounded queue with a push timeout.           | [`Priority`], [`EventBus::publish`]|
//! | **Supervision** | Latency budget + hand-off on the fixed worker pool.       | [`BusConfig::latency_budget`]      |
//! | **Stats**       | Per-invocation latency ring with running aggregates.      | [`StatsSnapshot`]                  |
//! | **Errors**      | Typed capacity/locking/publish errors, never fatal.       | [`BusError`], [`HandlerError`]     |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogHandler`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use busvisor::{AppContext, BusConfig, EventBus, EventId, HandlerError, HandlerFn, HandlerRef, Priority};
//! use bytes::Bytes;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::builder(BusConfig::default()).build();
//!
//!     // A direct handler runs inline on the dispatch task.
//!     let fast: HandlerRef = HandlerFn::arc("fast", |_app: AppContext, id: EventId, p: Bytes| async move {
//!         println!("event {id:#x}, {} bytes", p.len());
//!         Ok::<_, HandlerError>(())
//!     });
//!     bus.subscribe_direct("fast", 0x10, &fast).await?;
//!
//!     // An indirect handler runs on the worker pool under the latency budget.
//!     let slow: HandlerRef = HandlerFn::arc("slow", |_app: AppContext, _id: EventId, _p: Bytes| async move {
//!         // heavy work here...
//!         Ok::<_, HandlerError>(())
//!     });
//!     bus.subscribe_indirect("slow", 0x10, &slow).await?;
//!
//!     bus.publish(0x10, b"payload", Priority::Low).await?;
//!
//!     bus.shutdown().await;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod handlers;

// ---- Public re-exports ----

pub use self::core::{BusBuilder, BusConfig, EventBus, StatsSample, StatsSnapshot};
pub use self::error::{BusError, HandlerError};
pub use self::events::{EventId, Message, Priority};
pub use self::handlers::{AppContext, Handle, HandlerFn, HandlerRef};

// Optional: expose a simple built-in logging handler (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use self::handlers::LogHandler;
