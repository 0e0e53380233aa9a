//! # Dispatch loop — the bus's own task.
//!
//! A single long-lived loop pops published messages off the bus queue with
//! a bounded poll period, resolves the target event, and fans the delivery
//! out:
//!
//! 1. deferred work first — an indirect wildcard (cursor 0) and the event's
//!    indirect subscribers go to the worker pool as one job;
//! 2. direct subscribers run inline, in subscription order, each latency
//!    recorded;
//! 3. a direct wildcard runs inline adjacent to the direct subscribers.
//!
//! ## Rules
//! - An unknown event id is an event with zero subscribers — no error, and
//!   a registered wildcard still observes it.
//! - Direct subscribers of one message all complete before the loop picks
//!   up the next message (that is the direct-delivery ordering contract).
//! - Worker exhaustion drops the deferred part of the delivery with a
//!   warning; the inline part still runs.
//! - Registry lock timeouts drop the whole message with a warning; the bus
//!   itself keeps running.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::pool::{Job, WorkerPool};
use crate::core::registry::{Entry, Registry};
use crate::core::worker::{self, WorkerCtx};
use crate::events::{Message, PriorityQueue};

/// Runs the dispatch loop until the token is cancelled.
pub(crate) async fn run(
    queue: Arc<PriorityQueue<Message>>,
    registry: Arc<Registry>,
    pool: WorkerPool,
    ctx: Arc<WorkerCtx>,
    poll_period: Duration,
    token: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = token.cancelled() => break,
            msg = queue.pop(poll_period) => msg,
        };
        let Some(msg) = msg else {
            // Poll period elapsed with nothing queued.
            continue;
        };
        deliver(msg, &registry, &pool, &ctx).await;
    }
    log::trace!("dispatch: stopped");
}

/// Delivers one message: deferred job to the pool, direct handlers inline.
async fn deliver(msg: Message, registry: &Registry, pool: &WorkerPool, ctx: &WorkerCtx) {
    let plan = match registry.resolve(msg.event_id).await {
        Ok(plan) => plan,
        Err(e) => {
            log::warn!(
                "dispatch: dropping event {:#010x}: {} ({})",
                msg.event_id,
                e,
                e.as_label()
            );
            return;
        }
    };

    // Deferred sublist: indirect wildcard at cursor 0, then the event's
    // indirect subscribers in subscription order.
    let mut deferred: Vec<Entry> = Vec::new();
    if let Some(w) = plan.wildcard.as_ref().filter(|w| !w.direct) {
        deferred.push(w.clone());
    }
    deferred.extend(plan.indirect.iter().cloned());

    if !deferred.is_empty() {
        let job = Job {
            event_id: msg.event_id,
            subs: deferred.into(),
            cursor: 0,
            payload: msg.payload.clone(),
        };
        if let Err(e) = pool.post(job) {
            log::warn!(
                "dispatch: deferred delivery of event {:#010x} dropped: {} ({})",
                msg.event_id,
                e,
                e.as_label()
            );
        }
    }

    for entry in &plan.direct {
        worker::invoke_recorded(entry, ctx, msg.event_id, msg.payload.clone()).await;
    }
    if let Some(w) = plan.wildcard.as_ref().filter(|w| w.direct) {
        worker::invoke_recorded(w, ctx, msg.event_id, msg.payload.clone()).await;
    }
}
