//! Event model and bus queue.
//!
//! This module groups the published-message **data model** and the bounded
//! **priority queue** the dispatch loop consumes.
//!
//! ## Contents
//! - [`EventId`], [`Priority`], [`Message`] — what a publish produces
//! - [`PriorityQueue`] — bounded two-priority queue with timed push/pop
//!
//! ## Quick reference
//! - **Producers**: [`EventBus::publish`](crate::EventBus::publish) copies the
//!   caller's payload and pushes a [`Message`] with a bounded timeout.
//! - **Consumer**: the dispatch loop pops with the configured poll period.

mod message;
mod queue;

pub use message::{EventId, Message, Priority};
pub(crate) use queue::{PriorityQueue, PushError};
