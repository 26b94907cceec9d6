//! Client-facing sink for reframed events.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::ReframedEvent;

/// The client went away; nothing more can be written.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("event sink closed")]
pub struct SinkClosed;

/// Scoped writer accepting one reframed event at a time.
///
/// `send` returns once the event has been handed to the transport, which
/// is the reframer's flush point. A failed send is final.
#[async_trait]
pub trait EventSink: Send {
    async fn send(&mut self, event: ReframedEvent) -> Result<(), SinkClosed>;
}

#[async_trait]
impl EventSink for mpsc::Sender<ReframedEvent> {
    async fn send(&mut self, event: ReframedEvent) -> Result<(), SinkClosed> {
        mpsc::Sender::send(self, event).await.map_err(|_| SinkClosed)
    }
}
