//! # Bounded two-priority queue for the bus.
//!
//! [`PriorityQueue`] is the channel between `publish` and the dispatch loop.
//! Unlike a plain mpsc channel it supports **front insertion**: high-priority
//! items jump ahead of every queued low-priority item. Low keeps FIFO order;
//! each High push lands at the very front, so queued High items drain
//! newest-first.
//!
//! ## Architecture
//! ```text
//! push(item, High, timeout) ──► front ┐
//!                                     ├─► [VecDeque] ──► pop(timeout)
//! push(item, Low,  timeout) ──► back  ┘
//! ```
//!
//! ## Rules
//! - **Bounded**: capacity is fixed at creation; a full queue makes `push`
//!   wait up to `timeout`, then fail without mutating anything.
//! - **Ordering**: FIFO within Low; High is newest-first (front insertion),
//!   and always ahead of every queued Low item.
//! - **Timed pop**: `pop` returns `None` when the poll period elapses with
//!   no item, so the consumer loop can run periodic work.
//! - **No unbounded blocking**: every wait is bounded.
//!
//! Capacity accounting uses two semaphores (free slots / available items)
//! so waiters on both sides park without spinning; the deque itself is only
//! touched inside a short critical section.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time;

use super::message::Priority;

/// Error returned by [`PriorityQueue::push`], carrying the item back.
#[derive(Debug)]
pub(crate) enum PushError<T> {
    /// Queue stayed full for the whole timeout.
    Timeout(T),
    /// Queue is closed (bus shut down).
    Closed(T),
}

/// Bounded queue with two priority classes and timed operations.
pub(crate) struct PriorityQueue<T> {
    inner: Mutex<VecDeque<T>>,
    /// Free capacity; `push` takes one permit per item.
    slots: Semaphore,
    /// Queued items; `pop` takes one permit per item.
    items: Semaphore,
}

impl<T> PriorityQueue<T> {
    /// Creates a queue holding at most `capacity` items (clamped to >= 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            slots: Semaphore::new(capacity),
            items: Semaphore::new(0),
        }
    }

    /// Pushes an item, waiting up to `timeout` for a free slot.
    ///
    /// High priority inserts at the front, low priority at the back. On
    /// timeout the item is handed back untouched.
    pub async fn push(&self, item: T, prio: Priority, timeout: Duration) -> Result<(), PushError<T>> {
        let permit = match time::timeout(timeout, self.slots.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_closed)) => return Err(PushError::Closed(item)),
            Err(_elapsed) => return Err(PushError::Timeout(item)),
        };
        permit.forget();

        {
            let mut q = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            match prio {
                Priority::High => q.push_front(item),
                Priority::Low => q.push_back(item),
            }
        }
        self.items.add_permits(1);
        Ok(())
    }

    /// Pops the front item, waiting up to `timeout`.
    ///
    /// Returns `None` when the wait elapses with no item available.
    pub async fn pop(&self, timeout: Duration) -> Option<T> {
        let permit = match time::timeout(timeout, self.items.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_closed)) => return None,
            Err(_elapsed) => return None,
        };
        permit.forget();

        let item = {
            let mut q = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            q.pop_front()
        };
        self.slots.add_permits(1);
        item
    }

    /// Closes the queue: pending and future pushes fail with `Closed`.
    pub fn close(&self) {
        self.slots.close();
    }

    /// Number of currently queued items.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
