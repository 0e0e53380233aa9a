//! # LogHandler — simple event printer
//!
//! A minimal wildcard-friendly handler that logs every delivery it sees.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [event] id=0x00000010 len=4
//! [event] id=0x00000011 len=0
//! ```

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::HandlerError;
use crate::events::EventId;
use crate::handlers::handler::{AppContext, Handle};

/// Event logging handler.
#[derive(Default)]
pub struct LogHandler;

impl LogHandler {
    /// Constructs a new [`LogHandler`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handle for LogHandler {
    async fn on_event(
        &self,
        _app: AppContext,
        event_id: EventId,
        payload: Bytes,
    ) -> Result<(), HandlerError> {
        log::info!("[event] id={event_id:#010x} len={}", payload.len());
        Ok(())
    }

    fn name(&self) -> &str {
        "LogHandler"
    }
}
