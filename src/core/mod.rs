//! Bus core: registry, dispatch, worker pool, supervision, stats.
//!
//! This module contains the embedded implementation of the busvisor
//! runtime. The public API from this module is [`EventBus`] (with its
//! [`BusBuilder`]), [`BusConfig`], and the stats view types.
//!
//! Internal modules:
//! - [`registry`]: event table, subscriber lists, wildcard slot;
//! - [`dispatch`]: the bus task consuming the priority queue;
//! - [`pool`]: fixed worker slots with atomic claim;
//! - [`worker`]: supervised execution and the hand-off protocol;
//! - [`stats`]: latency ring buffer and running aggregates.

mod bus;
mod config;
mod dispatch;
mod pool;
mod registry;
mod stats;
mod worker;

pub use bus::{BusBuilder, EventBus};
pub use config::BusConfig;
pub use stats::{StatsSample, StatsSnapshot};
