//! # Registry — event table, subscriber lists, and the wildcard slot.
//!
//! The registry owns all subscription state: a fixed-capacity table of
//! events, each with an ordered fixed-capacity subscriber list, plus one
//! wildcard slot that observes every published event.
//!
//! ## Architecture
//! ```text
//! subscribe / unsubscribe / resolve
//!        │ (mutex, bounded wait)
//!        ▼
//! ┌───────────────────────────────────────────┐
//! │ events[0]: id=0x10 → [sub, sub, sub]      │  ordered, bounded
//! │ events[1]: id=0x22 → [sub]                │
//! │ ...            (≤ max_events slots)       │
//! │ wildcard: Option<sub>                     │  one slot, bus-wide
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - **Lazy create**: the first subscribe for an unseen id claims the next
//!   free event slot; lookup is a linear scan of the bounded table.
//! - **Idempotent**: subscribing an already-present handler (same `Arc`
//!   identity) is a no-op success; unsubscribing a missing one likewise.
//! - **No partial mutation**: capacity errors leave the table untouched.
//! - **Bounded lock**: every operation takes the mutex with a timeout and
//!   surfaces expiry as [`BusError::LockTimeout`], never blocking forever.
//! - **Order preserved**: unsubscribe compacts the list, keeping the
//!   relative order of the remaining subscribers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time;

use crate::core::config::BusConfig;
use crate::error::BusError;
use crate::events::EventId;
use crate::handlers::HandlerRef;

/// One registered subscriber.
///
/// Cheap to clone: both fields are `Arc` handles. Identity for duplicate
/// detection and unsubscribe is the handler `Arc` pointer.
#[derive(Clone)]
pub(crate) struct Entry {
    /// Bounded display name (stats/logs).
    pub name: Arc<str>,
    /// Direct = inline on dispatch; indirect = pooled worker.
    pub direct: bool,
    /// The handler capability object.
    pub handler: HandlerRef,
}

impl Entry {
    fn matches(&self, handler: &HandlerRef) -> bool {
        Arc::ptr_eq(&self.handler, handler)
    }
}

/// One event slot: id plus its ordered subscriber list.
struct EventSlot {
    id: EventId,
    subs: Vec<Entry>,
}

/// Mutable registry state, guarded by the registry mutex.
struct Table {
    events: Vec<EventSlot>,
    wildcard: Option<Entry>,
}

/// Dispatch-time snapshot of everything a delivery needs.
///
/// Taken under the registry lock and released before any handler runs, so
/// slow handlers never hold up subscription changes.
pub(crate) struct DeliveryPlan {
    /// Direct subscribers of the event, in subscription order.
    pub direct: Vec<Entry>,
    /// Indirect subscribers of the event, in subscription order.
    pub indirect: Vec<Entry>,
    /// The wildcard subscriber, if registered.
    pub wildcard: Option<Entry>,
}

/// Subscription registry with bounded capacities and a bounded lock.
pub(crate) struct Registry {
    table: Mutex<Table>,
    max_events: usize,
    max_subscribers: usize,
    name_limit: usize,
    lock_timeout: Duration,
}

impl Registry {
    /// Creates an empty registry sized from the bus configuration.
    pub fn new(cfg: &BusConfig) -> Self {
        Self {
            table: Mutex::new(Table {
                events: Vec::with_capacity(cfg.max_events.max(1)),
                wildcard: None,
            }),
            max_events: cfg.max_events.max(1),
            max_subscribers: cfg.max_subscribers.max(1),
            name_limit: cfg.name_limit.max(1),
            lock_timeout: cfg.lock_timeout,
        }
    }

    /// Takes the registry mutex with the configured bounded wait.
    async fn lock(&self) -> Result<MutexGuard<'_, Table>, BusError> {
        time::timeout(self.lock_timeout, self.table.lock())
            .await
            .map_err(|_elapsed| BusError::LockTimeout {
                timeout: self.lock_timeout,
            })
    }

    /// Registers `handler` for `event_id`.
    ///
    /// Lazily creates the event slot. Subscribing the same handler twice is
    /// a no-op success; a full table or full list is a typed error with no
    /// partial mutation.
    pub async fn subscribe(
        &self,
        event_id: EventId,
        name: &str,
        direct: bool,
        handler: &HandlerRef,
    ) -> Result<(), BusError> {
        let entry = Entry {
            name: self.bounded_name(name),
            direct,
            handler: Arc::clone(handler),
        };
        let mut table = self.lock().await?;

        if let Some(slot) = table.events.iter_mut().find(|s| s.id == event_id) {
            if slot.subs.iter().any(|e| e.matches(handler)) {
                log::debug!("registry: handler already subscribed to {event_id:#010x}");
                return Ok(());
            }
            if slot.subs.len() >= self.max_subscribers {
                return Err(BusError::SubscribersFull {
                    event_id,
                    capacity: self.max_subscribers,
                });
            }
            slot.subs.push(entry);
            return Ok(());
        }

        if table.events.len() >= self.max_events {
            return Err(BusError::EventTableFull {
                capacity: self.max_events,
            });
        }
        table.events.push(EventSlot {
            id: event_id,
            subs: vec![entry],
        });
        Ok(())
    }

    /// Sets the bus-wide wildcard subscriber.
    ///
    /// The wildcard is a single slot: re-registering the same handler is a
    /// no-op, a different handler replaces the previous one.
    pub async fn subscribe_all(&self, direct: bool, handler: &HandlerRef) -> Result<(), BusError> {
        let mut table = self.lock().await?;

        if let Some(current) = &table.wildcard {
            if current.matches(handler) {
                log::debug!("registry: wildcard handler already registered");
                return Ok(());
            }
            log::debug!("registry: replacing wildcard handler");
        }
        table.wildcard = Some(Entry {
            name: self.bounded_name(handler.name()),
            direct,
            handler: Arc::clone(handler),
        });
        Ok(())
    }

    /// Removes `handler` from `event_id`'s list, compacting in order.
    ///
    /// Unknown event id or absent handler is a no-op success.
    pub async fn unsubscribe(&self, event_id: EventId, handler: &HandlerRef) -> Result<(), BusError> {
        let mut table = self.lock().await?;

        if let Some(slot) = table.events.iter_mut().find(|s| s.id == event_id) {
            slot.subs.retain(|e| !e.matches(handler));
        }
        Ok(())
    }

    /// Clears the wildcard slot if it holds `handler`.
    pub async fn unsubscribe_all(&self, handler: &HandlerRef) -> Result<(), BusError> {
        let mut table = self.lock().await?;

        if table.wildcard.as_ref().is_some_and(|e| e.matches(handler)) {
            table.wildcard = None;
        }
        Ok(())
    }

    /// Snapshots the delivery plan for `event_id`.
    ///
    /// An absent id yields empty subscriber lists; the wildcard is reported
    /// regardless, so it observes events nobody subscribed to.
    pub async fn resolve(&self, event_id: EventId) -> Result<DeliveryPlan, BusError> {
        let table = self.lock().await?;

        let (direct, indirect) = match table.events.iter().find(|s| s.id == event_id) {
            Some(slot) => slot.subs.iter().cloned().partition(|e| e.direct),
            None => (Vec::new(), Vec::new()),
        };
        Ok(DeliveryPlan {
            direct,
            indirect,
            wildcard: table.wildcard.clone(),
        })
    }

    /// Truncates a subscriber name to the configured limit.
    ///
    /// Cuts at a char boundary so multibyte names stay valid.
    fn bounded_name(&self, name: &str) -> Arc<str> {
        if name.len() <= self.name_limit {
            return Arc::from(name);
        }
        let mut end = self.name_limit;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        Arc::from(&name[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::error::HandlerError;
    use crate::handlers::{AppContext, HandlerFn};

    fn noop(name: &'static str) -> HandlerRef {
        HandlerFn::arc(name, |_app: AppContext, _id: EventId, _payload: Bytes| async move {
            Ok::<_, HandlerError>(())
        })
    }

    fn small_registry() -> Registry {
        Registry::new(&BusConfig {
            max_events: 2,
            max_subscribers: 2,
            ..BusConfig::default()
        })
    }

    #[tokio::test]
    async fn test_duplicate_subscribe_is_idempotent() {
        let reg = small_registry();
        let h = noop("dup");

        reg.subscribe(1, "dup", true, &h).await.unwrap();
        reg.subscribe(1, "dup", true, &h).await.unwrap();

        let plan = reg.resolve(1).await.unwrap();
        assert_eq!(plan.direct.len(), 1);
        assert!(plan.indirect.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_handlers_accumulate_in_order() {
        let reg = small_registry();
        let a = noop("a");
        let b = noop("b");

        reg.subscribe(1, "a", false, &a).await.unwrap();
        reg.subscribe(1, "b", false, &b).await.unwrap();

        let plan = reg.resolve(1).await.unwrap();
        let names: Vec<_> = plan.indirect.iter().map(|e| e.name.to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_subscriber_capacity_error_leaves_list_intact() {
        let reg = small_registry();
        reg.subscribe(1, "a", true, &noop("a")).await.unwrap();
        reg.subscribe(1, "b", true, &noop("b")).await.unwrap();

        let err = reg.subscribe(1, "c", true, &noop("c")).await.unwrap_err();
        assert!(matches!(err, BusError::SubscribersFull { capacity: 2, .. }));

        let plan = reg.resolve(1).await.unwrap();
        assert_eq!(plan.direct.len(), 2);
    }

    #[tokio::test]
    async fn test_event_table_capacity_error() {
        let reg = small_registry();
        reg.subscribe(1, "a", true, &noop("a")).await.unwrap();
        reg.subscribe(2, "b", true, &noop("b")).await.unwrap();

        let err = reg.subscribe(3, "c", true, &noop("c")).await.unwrap_err();
        assert!(matches!(err, BusError::EventTableFull { capacity: 2 }));
    }

    #[tokio::test]
    async fn test_unsubscribe_preserves_relative_order() {
        let reg = Registry::new(&BusConfig::default());
        let a = noop("a");
        let b = noop("b");
        let c = noop("c");
        reg.subscribe(1, "a", false, &a).await.unwrap();
        reg.subscribe(1, "b", false, &b).await.unwrap();
        reg.subscribe(1, "c", false, &c).await.unwrap();

        reg.unsubscribe(1, &b).await.unwrap();

        let plan = reg.resolve(1).await.unwrap();
        let names: Vec<_> = plan.indirect.iter().map(|e| e.name.to_string()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_missing_is_noop_success() {
        let reg = small_registry();
        reg.unsubscribe(99, &noop("ghost")).await.unwrap();
    }

    #[tokio::test]
    async fn test_wildcard_replace_and_clear() {
        let reg = small_registry();
        let first = noop("first");
        let second = noop("second");

        reg.subscribe_all(true, &first).await.unwrap();
        reg.subscribe_all(true, &first).await.unwrap(); // idempotent
        reg.subscribe_all(false, &second).await.unwrap(); // replaces

        let plan = reg.resolve(1).await.unwrap();
        let w = plan.wildcard.expect("wildcard set");
        assert!(!w.direct);
        assert!(Arc::ptr_eq(&w.handler, &second));

        reg.unsubscribe_all(&second).await.unwrap();
        assert!(reg.resolve(1).await.unwrap().wildcard.is_none());
    }

    #[tokio::test]
    async fn test_absent_event_resolves_empty_with_wildcard() {
        let reg = small_registry();
        let w = noop("wild");
        reg.subscribe_all(false, &w).await.unwrap();

        let plan = reg.resolve(0xdead).await.unwrap();
        assert!(plan.direct.is_empty());
        assert!(plan.indirect.is_empty());
        assert!(plan.wildcard.is_some());
    }

    #[tokio::test]
    async fn test_names_are_truncated_to_limit() {
        let reg = Registry::new(&BusConfig {
            name_limit: 4,
            ..BusConfig::default()
        });
        reg.subscribe(1, "longer-than-four", true, &noop("x"))
            .await
            .unwrap();

        let plan = reg.resolve(1).await.unwrap();
        assert_eq!(&*plan.direct[0].name, "long");
    }
}
