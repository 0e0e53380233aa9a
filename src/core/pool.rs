//! # Worker pool — fixed execution contexts for indirect deliveries.
//!
//! The pool is a fixed array of worker slots created at bus construction.
//! Each slot pairs an atomic busy flag with a single-slot queue feeding a
//! long-lived worker task. Nothing is spawned per delivery: bounding the
//! number of in-flight deferred deliveries is what makes the latency
//! guarantee hold.
//!
//! ## Architecture
//! ```text
//! post(job) ── linear scan, atomic claim ──► slot[i].tx ──► worker i
//!                                                             │
//! supervisor hand-off ── post(job @ cursor) ──► slot[j] ──► worker j
//! ```
//!
//! ## Rules
//! - **Atomic claim**: a slot is acquired with `compare_exchange` on its
//!   busy flag; claim and job assignment are never separated by a window
//!   another poster could win.
//! - **Exhaustion drops**: no free slot means the job is dropped and
//!   [`BusError::WorkersBusy`] returned — never queued, never retried.
//! - **Release after completion**: a worker clears its flag only after the
//!   job (including an overrunning handler it had to wait out) is done.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::registry::Entry;
use crate::core::worker::{self, WorkerCtx};
use crate::error::BusError;
use crate::events::EventId;

/// One deferred delivery: a snapshot sublist plus the resume cursor.
///
/// The sublist is captured at dispatch time, so a hand-off resumes exactly
/// where the canceled worker stopped even if the registry changed in the
/// meantime. Reposting a job moves the payload handle to the successor.
pub(crate) struct Job {
    /// Event being delivered.
    pub event_id: EventId,
    /// Indirect sublist for this delivery (wildcard first when present).
    pub subs: Arc<[Entry]>,
    /// Index of the next subscriber to invoke.
    pub cursor: usize,
    /// Owned payload handle for this delivery.
    pub payload: Bytes,
}

/// One pooled execution context.
struct WorkerSlot {
    /// True from atomic claim until the worker finishes the job.
    busy: AtomicBool,
    /// Single-slot queue feeding the worker task.
    tx: mpsc::Sender<Job>,
}

/// Fixed-size pool of workers; cheap to clone (shared slot table).
#[derive(Clone)]
pub(crate) struct WorkerPool {
    slots: Arc<[WorkerSlot]>,
}

impl WorkerPool {
    /// Creates the slot table and spawns `count` worker tasks (min 1).
    ///
    /// Workers run until `token` is cancelled; the returned handles join
    /// them at shutdown.
    pub fn spawn(
        count: usize,
        ctx: Arc<WorkerCtx>,
        token: CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let count = count.max(1);
        let mut slots = Vec::with_capacity(count);
        let mut receivers = Vec::with_capacity(count);

        for _ in 0..count {
            let (tx, rx) = mpsc::channel::<Job>(1);
            slots.push(WorkerSlot {
                busy: AtomicBool::new(false),
                tx,
            });
            receivers.push(rx);
        }

        let pool = Self {
            slots: slots.into(),
        };
        let handles = receivers
            .into_iter()
            .enumerate()
            .map(|(id, rx)| {
                tokio::spawn(worker::run(
                    id,
                    rx,
                    pool.clone(),
                    Arc::clone(&ctx),
                    token.clone(),
                ))
            })
            .collect();
        (pool, handles)
    }

    /// Assigns `job` to the first free worker.
    ///
    /// Linear scan with an atomic claim per slot. With every worker busy
    /// the job is dropped and [`BusError::WorkersBusy`] returned.
    pub fn post(&self, job: Job) -> Result<(), BusError> {
        let mut job = job;
        for slot in self.slots.iter() {
            if slot
                .busy
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                continue;
            }
            match slot.tx.try_send(job) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    // Worker gone or its queue occupied: release the claim
                    // and keep scanning.
                    slot.busy.store(false, Ordering::Release);
                    job = err.into_inner();
                }
            }
        }
        Err(BusError::WorkersBusy)
    }

    /// Marks worker `id` free again (called by the worker after a job).
    pub fn release(&self, id: usize) {
        self.slots[id].busy.store(false, Ordering::Release);
    }

    /// Number of currently busy workers.
    #[cfg(test)]
    pub fn busy_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.busy.load(Ordering::Acquire))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::config::BusConfig;
    use crate::core::stats::StatsCollector;
    use crate::error::HandlerError;
    use crate::handlers::{AppContext, HandlerFn, HandlerRef};

    fn ctx(budget: Duration) -> Arc<WorkerCtx> {
        Arc::new(WorkerCtx {
            app: Arc::new(()),
            stats: Arc::new(StatsCollector::new(BusConfig::default().stats_depth)),
            budget,
        })
    }

    fn entry(name: &'static str, handler: HandlerRef) -> Entry {
        Entry {
            name: Arc::from(name),
            direct: false,
            handler,
        }
    }

    fn job_of(subs: Vec<Entry>) -> Job {
        Job {
            event_id: 1,
            subs: subs.into(),
            cursor: 0,
            payload: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn test_post_fails_when_all_workers_busy() {
        let token = CancellationToken::new();
        let (pool, handles) = WorkerPool::spawn(2, ctx(Duration::from_secs(1)), token.clone());

        let gate = Arc::new(tokio::sync::Notify::new());
        for i in 0..2 {
            let gate = Arc::clone(&gate);
            let h: HandlerRef = HandlerFn::arc("blocker", move |_app: AppContext, _id: EventId, _p: Bytes| {
                let gate = Arc::clone(&gate);
                async move {
                    gate.notified().await;
                    Ok::<_, HandlerError>(())
                }
            });
            pool.post(job_of(vec![entry("blocker", h)]))
                .unwrap_or_else(|e| panic!("worker {i} should be free: {e}"));
        }

        // Let both workers pick up their jobs.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.busy_count(), 2);

        let h: HandlerRef = HandlerFn::arc("late", |_app: AppContext, _id: EventId, _p: Bytes| async move {
            Ok::<_, HandlerError>(())
        });
        let err = pool.post(job_of(vec![entry("late", h)])).unwrap_err();
        assert!(matches!(err, BusError::WorkersBusy));

        // Existing in-flight work is unaffected by the failed post.
        gate.notify_waiters();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.busy_count(), 0);

        token.cancel();
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_slot_freed_after_job_completes() {
        let token = CancellationToken::new();
        let (pool, handles) = WorkerPool::spawn(1, ctx(Duration::from_secs(1)), token.clone());

        let h: HandlerRef = HandlerFn::arc("quick", |_app: AppContext, _id: EventId, _p: Bytes| async move {
            Ok::<_, HandlerError>(())
        });
        pool.post(job_of(vec![entry("quick", h.clone())])).unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.busy_count(), 0);

        // The same slot is reusable.
        pool.post(job_of(vec![entry("quick", h)])).unwrap();

        token.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
