//! # Worker execution and the supervisor hand-off protocol.
//!
//! Each pooled worker iterates one job's subscriber sublist sequentially.
//! Every indirect invocation runs under a one-shot supervisor timer (the
//! configured latency budget). When a handler overruns the budget:
//!
//! 1. the worker is marked canceled for this job;
//! 2. if unprocessed subscribers remain, a new job resuming at the current
//!    cursor is posted to the pool — the payload handle moves to that
//!    successor;
//! 3. the overrunning handler keeps running to completion (it is never
//!    interrupted); its latency is recorded when it finally returns;
//! 4. the canceled worker stops iterating and frees its slot.
//!
//! ## Cursor discipline
//! The cursor advances **before** the handler is invoked, so a hand-off
//! fired mid-invocation resumes at the *next* subscriber — never a repeat,
//! never a skip. Across any number of hand-offs each subscriber in the
//! sublist runs exactly once, in list order.
//!
//! ## Worst-case latency
//! With budget `B`, subscriber `k` waits at most about `k × B` before it
//! starts, independent of how slow earlier handlers actually are. That soft
//! bound is the reason this module exists.
//!
//! ## Panic handling
//! Handler futures run under `catch_unwind` (the invocation is reported and
//! delivery continues); `AssertUnwindSafe` is used, so a handler that
//! panics while holding shared state can leave that state inconsistent.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::pool::{Job, WorkerPool};
use crate::core::registry::Entry;
use crate::core::stats::StatsCollector;
use crate::error::HandlerError;
use crate::events::EventId;
use crate::handlers::AppContext;

/// Shared invocation context: what every handler call needs.
pub(crate) struct WorkerCtx {
    /// Application context passed to each handler.
    pub app: AppContext,
    /// Bus-wide latency collector.
    pub stats: Arc<StatsCollector>,
    /// Per-subscriber latency budget for indirect deliveries.
    pub budget: Duration,
}

/// Outcome of one supervised invocation: the handler result, or panic info.
type Outcome = Result<Result<(), HandlerError>, String>;

/// Long-lived worker loop: one job at a time off the slot's queue.
pub(crate) async fn run(
    id: usize,
    mut rx: mpsc::Receiver<Job>,
    pool: WorkerPool,
    ctx: Arc<WorkerCtx>,
    token: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            _ = token.cancelled() => break,
            recv = rx.recv() => match recv {
                Some(job) => job,
                None => break,
            },
        };
        run_job(id, job, &pool, &ctx).await;
        pool.release(id);
    }
    log::trace!("worker {id}: stopped");
}

/// Executes one job under supervision; see the module docs for the protocol.
async fn run_job(id: usize, job: Job, pool: &WorkerPool, ctx: &WorkerCtx) {
    let Job {
        event_id,
        subs,
        mut cursor,
        payload,
    } = job;

    while cursor < subs.len() {
        let entry = &subs[cursor];
        // Advance first: a hand-off during this invocation resumes at the
        // next subscriber.
        cursor += 1;

        let started = Instant::now();
        let fut = invoke(entry, Arc::clone(&ctx.app), event_id, payload.clone());
        tokio::pin!(fut);

        let supervisor = time::sleep(ctx.budget);
        tokio::pin!(supervisor);

        let mut canceled = false;
        let outcome = tokio::select! {
            outcome = &mut fut => outcome,
            _ = &mut supervisor => {
                canceled = true;
                if cursor < subs.len() {
                    // Budget blown with work left: the successor job takes
                    // the remainder and the payload from here on.
                    let follow = Job {
                        event_id,
                        subs: Arc::clone(&subs),
                        cursor,
                        payload: payload.clone(),
                    };
                    if let Err(e) = pool.post(follow) {
                        log::warn!(
                            "worker {id}: hand-off for event {event_id:#010x} at index {cursor} dropped: {} ({})",
                            e,
                            e.as_label()
                        );
                    } else {
                        log::debug!(
                            "worker {id}: '{}' over budget on event {event_id:#010x}, remainder handed off at index {cursor}",
                            entry.name
                        );
                    }
                }
                // The overrunning handler still runs to completion.
                (&mut fut).await
            }
        };
        report(entry, event_id, outcome, started.elapsed(), &ctx.stats);

        if canceled {
            return;
        }
    }
}

/// Invokes a handler with panic isolation.
async fn invoke(entry: &Entry, app: AppContext, event_id: EventId, payload: bytes::Bytes) -> Outcome {
    let fut = entry.handler.on_event(app, event_id, payload);
    std::panic::AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(|panic_err| {
            let any = &*panic_err;
            if let Some(msg) = any.downcast_ref::<&'static str>() {
                (*msg).to_string()
            } else if let Some(msg) = any.downcast_ref::<String>() {
                msg.clone()
            } else {
                "unknown panic".to_string()
            }
        })
}

/// Records latency and logs a failed or panicked invocation.
fn report(
    entry: &Entry,
    event_id: EventId,
    outcome: Outcome,
    latency: Duration,
    stats: &StatsCollector,
) {
    stats.record(&entry.name, event_id, latency);
    match outcome {
        Ok(Ok(())) => {
            log::trace!("'{}' handled event {event_id:#010x} in {latency:?}", entry.name);
        }
        Ok(Err(e)) => {
            log::warn!("'{}' failed on event {event_id:#010x}: {e}", entry.name);
        }
        Err(info) => {
            log::warn!("'{}' panicked on event {event_id:#010x}: {info}", entry.name);
        }
    }
}

/// Invokes one handler inline and records its latency (direct path).
///
/// No supervision here: direct subscribers run unsupervised on the caller's
/// task, by contract.
pub(crate) async fn invoke_recorded(
    entry: &Entry,
    ctx: &WorkerCtx,
    event_id: EventId,
    payload: bytes::Bytes,
) {
    let started = Instant::now();
    let outcome = invoke(entry, Arc::clone(&ctx.app), event_id, payload).await;
    report(entry, event_id, outcome, started.elapsed(), &ctx.stats);
}
