//! Transport side of a stream session

use crate::error::SinkClosed;
use crate::frame::StreamFrame;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Ordered, append-only destination for one session's frames
///
/// Besides delivery, a sink is the session's liveness signal: once the
/// remote side disconnects, `is_closed` turns true and `closed` resolves.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one frame, failing if the remote side is gone
    async fn send(&mut self, frame: StreamFrame) -> Result<(), SinkClosed>;

    fn is_closed(&self) -> bool;

    /// Resolves once the remote side has gone away
    async fn closed(&self);
}

#[async_trait]
impl EventSink for mpsc::Sender<StreamFrame> {
    async fn send(&mut self, frame: StreamFrame) -> Result<(), SinkClosed> {
        mpsc::Sender::send(self, frame).await.map_err(|_| SinkClosed)
    }

    fn is_closed(&self) -> bool {
        mpsc::Sender::is_closed(self)
    }

    async fn closed(&self) {
        mpsc::Sender::closed(self).await
    }
}
