//! # Global bus configuration.
//!
//! Provides [`BusConfig`] — centralized settings for the bus runtime.
//!
//! Every capacity and timeout the bus uses is fixed here at construction
//! time; nothing grows at runtime. Defaults mirror a small real-time
//! deployment: a handful of events, a fixed four-worker pool, and a 100 ms
//! per-subscriber latency budget.
//!
//! ## Field semantics
//! - Capacities (`max_events`, `max_subscribers`, `max_workers`,
//!   `queue_capacity`, `stats_depth`) are clamped to a minimum of 1 where a
//!   zero would produce an unusable bus.
//! - Timeouts bound every wait in the core; there is no unbounded blocking.

use std::time::Duration;

/// Global configuration for the bus runtime.
///
/// Defines:
/// - **Registry capacities**: event table size, per-event subscriber list size
/// - **Delivery**: worker pool size and per-subscriber latency budget
/// - **Queueing**: bus queue depth, publish push timeout, dispatch poll period
/// - **Bookkeeping**: subscriber name limit, stats ring depth, lock timeout
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Maximum number of distinct event ids the registry can hold.
    ///
    /// The table is an arena of fixed capacity; the first subscribe for an
    /// unseen id claims the next free slot. Exceeding this is
    /// [`BusError::EventTableFull`](crate::BusError::EventTableFull).
    pub max_events: usize,

    /// Maximum subscribers per event.
    ///
    /// Exceeding this is
    /// [`BusError::SubscribersFull`](crate::BusError::SubscribersFull).
    pub max_subscribers: usize,

    /// Number of pooled workers executing indirect deliveries.
    ///
    /// A hard cap on concurrently in-flight deferred deliveries; when all
    /// workers are busy a new deferred delivery is dropped (reported, not
    /// retried).
    pub max_workers: usize,

    /// Capacity of the bus queue between `publish` and the dispatch loop.
    pub queue_capacity: usize,

    /// How long `publish` waits for a free queue slot before failing.
    pub push_timeout: Duration,

    /// Poll period of the dispatch loop on the bus queue.
    ///
    /// Bounds how long the loop sleeps between wakeups when idle.
    pub poll_period: Duration,

    /// Per-subscriber latency budget for indirect deliveries.
    ///
    /// When an indirect handler runs past this budget, the remainder of the
    /// subscriber list is handed off to a fresh worker. The overrunning
    /// handler itself is never interrupted.
    pub latency_budget: Duration,

    /// Subscriber names longer than this are truncated at registration.
    pub name_limit: usize,

    /// Depth of the latency stats ring buffer.
    pub stats_depth: usize,

    /// Bounded wait for the registry mutex.
    ///
    /// Expiry surfaces as
    /// [`BusError::LockTimeout`](crate::BusError::LockTimeout) instead of
    /// blocking forever.
    pub lock_timeout: Duration,
}

impl BusConfig {
    /// Worker pool size clamped to a minimum of 1.
    #[inline]
    pub fn workers_clamped(&self) -> usize {
        self.max_workers.max(1)
    }

    /// Bus queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Stats ring depth clamped to a minimum of 1.
    #[inline]
    pub fn stats_depth_clamped(&self) -> usize {
        self.stats_depth.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `max_events = 8`
    /// - `max_subscribers = 16`
    /// - `max_workers = 4`
    /// - `queue_capacity = 8`
    /// - `push_timeout = 100ms`
    /// - `poll_period = 100ms`
    /// - `latency_budget = 100ms`
    /// - `name_limit = 16`
    /// - `stats_depth = 16`
    /// - `lock_timeout = 100ms`
    fn default() -> Self {
        Self {
            max_events: 8,
            max_subscribers: 16,
            max_workers: 4,
            queue_capacity: 8,
            push_timeout: Duration::from_millis(100),
            poll_period: Duration::from_millis(100),
            latency_budget: Duration::from_millis(100),
            name_limit: 16,
            stats_depth: 16,
            lock_timeout: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_enforce_minimums() {
        let cfg = BusConfig {
            max_workers: 0,
            queue_capacity: 0,
            stats_depth: 0,
            ..BusConfig::default()
        };
        assert_eq!(cfg.workers_clamped(), 1);
        assert_eq!(cfg.queue_capacity_clamped(), 1);
        assert_eq!(cfg.stats_depth_clamped(), 1);
    }

    #[test]
    fn test_defaults_are_bounded() {
        let cfg = BusConfig::default();
        assert!(cfg.push_timeout > Duration::ZERO);
        assert!(cfg.poll_period > Duration::ZERO);
        assert!(cfg.latency_budget > Duration::ZERO);
        assert!(cfg.lock_timeout > Duration::ZERO);
    }
}
