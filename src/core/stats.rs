//! # Latency statistics collector.
//!
//! One bus-wide collector records the execution latency of every handler
//! invocation (direct and indirect alike) into a fixed-depth ring buffer
//! and maintains running aggregates.
//!
//! ## Aggregates
//! - `min` / `max` latency, plus the name of the max holder
//! - a decayed average `avg' = (avg + sample) / 2` — lightweight
//!   exponential smoothing, intentionally not an arithmetic mean (no
//!   running count to store)
//!
//! The first recorded sample seeds min = max = avg.
//!
//! ## Rules
//! - Recording takes a short `std::sync::Mutex` critical section; callers
//!   are async tasks but never hold the guard across an await.
//! - [`StatsCollector::snapshot`] is read-only and returns owned data; its
//!   `recent` list is in insertion order, oldest first, overwritten FIFO
//!   once the ring is full.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::events::EventId;

/// One recorded handler invocation.
#[derive(Clone, Debug)]
pub struct StatsSample {
    /// Subscriber name as registered (bounded).
    pub name: Arc<str>,
    /// Event the invocation delivered.
    pub event_id: EventId,
    /// Wall-clock execution latency.
    pub latency: Duration,
}

/// Owned, read-only view of the collector state.
#[derive(Clone, Debug)]
pub struct StatsSnapshot {
    /// Smallest latency seen.
    pub min: Duration,
    /// Largest latency seen.
    pub max: Duration,
    /// Decayed average latency.
    pub avg: Duration,
    /// Name of the subscriber that produced `max`.
    pub max_holder: Arc<str>,
    /// The most recent samples, oldest first.
    pub recent: Vec<StatsSample>,
    /// False until the first sample is recorded.
    pub seeded: bool,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----> event bus stats:")?;
        writeln!(f, "\t- latency min = {} ms", self.min.as_millis())?;
        writeln!(f, "\t- latency max = {} ms", self.max.as_millis())?;
        writeln!(f, "\t- average latency = {} ms", self.avg.as_millis())?;
        writeln!(f, "\t- max latency subscriber = {}", self.max_holder)?;
        writeln!(f, "\t- last events:")?;
        for s in &self.recent {
            writeln!(
                f,
                "\t\t> subscriber: {} - event id = {:#010x} - latency = {} ms",
                s.name,
                s.event_id,
                s.latency.as_millis()
            )?;
        }
        Ok(())
    }
}

struct Inner {
    ring: Vec<StatsSample>,
    /// Next write position; wraps at `depth`.
    index: usize,
    /// Total samples recorded (saturating); tells wrap state.
    recorded: usize,
    min: Duration,
    max: Duration,
    avg: Duration,
    max_holder: Arc<str>,
}

/// Bus-wide latency collector backed by a fixed-depth ring.
pub(crate) struct StatsCollector {
    depth: usize,
    inner: Mutex<Inner>,
}

impl StatsCollector {
    /// Creates a collector with the given ring depth (clamped to >= 1).
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            depth,
            inner: Mutex::new(Inner {
                ring: Vec::with_capacity(depth),
                index: 0,
                recorded: 0,
                min: Duration::ZERO,
                max: Duration::ZERO,
                avg: Duration::ZERO,
                max_holder: Arc::from(""),
            }),
        }
    }

    /// Records one invocation latency.
    pub fn record(&self, name: &Arc<str>, event_id: EventId, latency: Duration) {
        let sample = StatsSample {
            name: Arc::clone(name),
            event_id,
            latency,
        };
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if inner.recorded == 0 {
            inner.min = latency;
            inner.max = latency;
            inner.avg = latency;
            inner.max_holder = Arc::clone(name);
        } else {
            if latency < inner.min {
                inner.min = latency;
            }
            if latency > inner.max {
                inner.max = latency;
                inner.max_holder = Arc::clone(name);
            }
            inner.avg = (inner.avg + latency) / 2;
        }

        let index = inner.index;
        if inner.ring.len() < self.depth {
            inner.ring.push(sample);
        } else {
            inner.ring[index] = sample;
        }
        inner.index = (index + 1) % self.depth;
        inner.recorded = inner.recorded.saturating_add(1);
    }

    /// Returns an owned view of the aggregates and recent samples.
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let recent = if inner.ring.len() < self.depth {
            inner.ring.clone()
        } else {
            // Ring is full: oldest sample sits at the write index.
            let (tail, head) = inner.ring.split_at(inner.index);
            head.iter().chain(tail.iter()).cloned().collect()
        };
        StatsSnapshot {
            min: inner.min,
            max: inner.max,
            avg: inner.avg,
            max_holder: Arc::clone(&inner.max_holder),
            recent,
            seeded: inner.recorded > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_sample_seeds_aggregates() {
        let stats = StatsCollector::new(4);
        stats.record(&name("a"), 1, ms(10));

        let snap = stats.snapshot();
        assert!(snap.seeded);
        assert_eq!(snap.min, ms(10));
        assert_eq!(snap.max, ms(10));
        assert_eq!(snap.avg, ms(10));
        assert_eq!(&*snap.max_holder, "a");
    }

    #[test]
    fn test_min_max_and_holder() {
        let stats = StatsCollector::new(8);
        stats.record(&name("a"), 1, ms(10));
        stats.record(&name("b"), 1, ms(50));
        stats.record(&name("c"), 1, ms(5));

        let snap = stats.snapshot();
        assert_eq!(snap.min, ms(5));
        assert_eq!(snap.max, ms(50));
        assert_eq!(&*snap.max_holder, "b");

        let order: Vec<_> = snap.recent.iter().map(|s| s.latency).collect();
        assert_eq!(order, vec![ms(10), ms(50), ms(5)]);
    }

    #[test]
    fn test_decayed_average() {
        let stats = StatsCollector::new(8);
        stats.record(&name("a"), 1, ms(10)); // avg = 10
        stats.record(&name("a"), 1, ms(50)); // avg = (10+50)/2 = 30
        stats.record(&name("a"), 1, ms(5)); // avg = (30+5)/2 = 17.5

        let snap = stats.snapshot();
        assert_eq!(snap.avg, Duration::from_micros(17_500));
    }

    #[test]
    fn test_ring_overwrites_fifo_when_full() {
        let stats = StatsCollector::new(3);
        for (i, lat) in [1u64, 2, 3, 4, 5].into_iter().enumerate() {
            stats.record(&name("s"), i as EventId, ms(lat));
        }

        let snap = stats.snapshot();
        let latencies: Vec<_> = snap.recent.iter().map(|s| s.latency).collect();
        // Depth 3, five samples recorded: the oldest two fell off.
        assert_eq!(latencies, vec![ms(3), ms(4), ms(5)]);
    }

    #[test]
    fn test_empty_snapshot_is_unseeded() {
        let stats = StatsCollector::new(3);
        let snap = stats.snapshot();
        assert!(!snap.seeded);
        assert!(snap.recent.is_empty());
    }

    #[test]
    fn test_display_renders_aggregates() {
        let stats = StatsCollector::new(3);
        stats.record(&name("slowpoke"), 0x42, ms(50));
        let rendered = stats.snapshot().to_string();
        assert!(rendered.contains("latency max = 50 ms"));
        assert!(rendered.contains("slowpoke"));
    }
}
