//! # EventBus: the public bus surface.
//!
//! [`EventBus`] owns the registry, the bus queue, the worker pool, and the
//! stats collector; its builder spawns the dispatch task and the fixed
//! worker tasks. Everything is sized at construction and torn down by
//! [`EventBus::shutdown`].
//!
//! ## High-level architecture
//! ```text
//! publish(id, data, prio) ──► [priority queue] ──► dispatch task
//!                                                      │
//!                     ┌────────────────────────────────┤
//!                     ▼                                ▼
//!              direct handlers                   worker pool job
//!              (inline, ordered)                 (indirect + wildcard)
//!                     │                                │
//!                     └──────────► stats ◄─────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use busvisor::{AppContext, BusConfig, EventBus, EventId, HandlerError, HandlerFn, HandlerRef, Priority};
//! use bytes::Bytes;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), busvisor::BusError> {
//!     let bus = EventBus::builder(BusConfig::default()).build();
//!
//!     let audit: HandlerRef = HandlerFn::arc("audit", |_app: AppContext, id: EventId, _p: Bytes| async move {
//!         println!("event {id:#010x}");
//!         Ok::<_, HandlerError>(())
//!     });
//!     bus.subscribe_direct("audit", 0x10, &audit).await?;
//!     bus.publish(0x10, b"hello", Priority::Low).await?;
//!
//!     bus.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::BusConfig;
use crate::core::dispatch;
use crate::core::pool::WorkerPool;
use crate::core::registry::Registry;
use crate::core::stats::{StatsCollector, StatsSnapshot};
use crate::core::worker::WorkerCtx;
use crate::error::BusError;
use crate::events::{EventId, Message, Priority, PriorityQueue, PushError};
use crate::handlers::{AppContext, HandlerRef};

/// Builder for constructing an [`EventBus`].
///
/// `build()` spawns tasks and therefore must run inside a tokio runtime.
pub struct BusBuilder {
    cfg: BusConfig,
    app: AppContext,
}

impl BusBuilder {
    /// Creates a builder with the given configuration and a unit context.
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            app: Arc::new(()),
        }
    }

    /// Sets the opaque application context handed to every handler.
    pub fn with_context(mut self, app: AppContext) -> Self {
        self.app = app;
        self
    }

    /// Builds the bus: spawns the worker pool and the dispatch task.
    pub fn build(self) -> EventBus {
        let cfg = self.cfg;
        let stats = Arc::new(StatsCollector::new(cfg.stats_depth_clamped()));
        let ctx = Arc::new(WorkerCtx {
            app: self.app,
            stats: Arc::clone(&stats),
            budget: cfg.latency_budget,
        });
        let token = CancellationToken::new();
        let (pool, workers) = WorkerPool::spawn(cfg.workers_clamped(), Arc::clone(&ctx), token.clone());
        let queue = Arc::new(PriorityQueue::new(cfg.queue_capacity_clamped()));
        let registry = Arc::new(Registry::new(&cfg));

        let dispatch = tokio::spawn(dispatch::run(
            Arc::clone(&queue),
            Arc::clone(&registry),
            pool,
            ctx,
            cfg.poll_period,
            token.clone(),
        ));
        EventBus {
            cfg,
            registry,
            queue,
            stats,
            token,
            dispatch,
            workers,
        }
    }
}

/// In-process publish/subscribe bus with latency-supervised delivery.
pub struct EventBus {
    cfg: BusConfig,
    registry: Arc<Registry>,
    queue: Arc<PriorityQueue<Message>>,
    stats: Arc<StatsCollector>,
    token: CancellationToken,
    dispatch: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl EventBus {
    /// Starts building a bus with the given configuration.
    pub fn builder(cfg: BusConfig) -> BusBuilder {
        BusBuilder::new(cfg)
    }

    /// Registers `handler` for `event_id`, invoked inline on the dispatch task.
    pub async fn subscribe_direct(
        &self,
        name: &str,
        event_id: EventId,
        handler: &HandlerRef,
    ) -> Result<(), BusError> {
        self.registry.subscribe(event_id, name, true, handler).await
    }

    /// Registers `handler` for `event_id`, invoked on the worker pool under
    /// the latency budget.
    pub async fn subscribe_indirect(
        &self,
        name: &str,
        event_id: EventId,
        handler: &HandlerRef,
    ) -> Result<(), BusError> {
        self.registry.subscribe(event_id, name, false, handler).await
    }

    /// Registers `handler` as the wildcard, invoked inline for every event.
    pub async fn subscribe_all_direct(&self, handler: &HandlerRef) -> Result<(), BusError> {
        self.registry.subscribe_all(true, handler).await
    }

    /// Registers `handler` as the wildcard, invoked on the worker pool for
    /// every event.
    pub async fn subscribe_all_indirect(&self, handler: &HandlerRef) -> Result<(), BusError> {
        self.registry.subscribe_all(false, handler).await
    }

    /// Removes `handler` from `event_id`'s subscriber list.
    ///
    /// Unknown ids and absent handlers are no-op successes.
    pub async fn unsubscribe(&self, event_id: EventId, handler: &HandlerRef) -> Result<(), BusError> {
        self.registry.unsubscribe(event_id, handler).await
    }

    /// Clears the wildcard slot if it holds `handler`.
    pub async fn unsubscribe_all(&self, handler: &HandlerRef) -> Result<(), BusError> {
        self.registry.unsubscribe_all(handler).await
    }

    /// Publishes `data` under `event_id`.
    ///
    /// Copies the caller's buffer and enqueues with the configured push
    /// timeout; on a full queue the copy is released and
    /// [`BusError::PublishTimeout`] returned. High priority jumps ahead of
    /// queued low-priority messages.
    pub async fn publish(
        &self,
        event_id: EventId,
        data: &[u8],
        prio: Priority,
    ) -> Result<(), BusError> {
        let msg = Message::new(event_id, data);
        match self.queue.push(msg, prio, self.cfg.push_timeout).await {
            Ok(()) => Ok(()),
            Err(PushError::Timeout(_msg)) => Err(BusError::PublishTimeout {
                timeout: self.cfg.push_timeout,
            }),
            Err(PushError::Closed(_msg)) => Err(BusError::QueueClosed),
        }
    }

    /// Returns a snapshot of the latency statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stops the bus: closes the queue, cancels the dispatch loop and the
    /// workers, and joins them.
    ///
    /// In-flight worker jobs finish their current handler; queued messages
    /// that were never dispatched are dropped.
    pub async fn shutdown(self) {
        self.queue.close();
        self.token.cancel();

        let _ = self.dispatch.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}
