//! One background task per stream session

use crate::config::StreamConfig;
use crate::controller::{SessionOutcome, StreamController};
use crate::frame::StreamFrame;
use futures_util::Stream;
use futures_util::stream;
use stackwatch_cloud::ProvisioningClient;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Frames buffered between a session task and its transport
const FRAME_BUFFER: usize = 64;

/// Receiving end of a running session
///
/// Dropping the handle (or just its `frames`) disconnects the session: the
/// task notices at its next check and exits without emitting anything else.
pub struct SessionHandle {
    pub frames: mpsc::Receiver<StreamFrame>,
    pub task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    /// Frames as a stream that ends after the session's last frame
    ///
    /// The session task keeps running detached; it stops on its own once
    /// the stream is dropped.
    pub fn into_stream(self) -> impl Stream<Item = StreamFrame> + Send + 'static {
        stream::unfold(self.frames, |mut frames| async move {
            frames.recv().await.map(|frame| (frame, frames))
        })
    }
}

/// Spawn a session task that follows `stack_name` until it settles
pub fn spawn_session(
    client: Arc<dyn ProvisioningClient>,
    stack_name: impl Into<String>,
    config: StreamConfig,
) -> SessionHandle {
    let (mut tx, frames) = mpsc::channel(FRAME_BUFFER);
    let mut controller = StreamController::new(client, stack_name, config);

    let task = tokio::spawn(async move { controller.run(&mut tx).await });

    SessionHandle { frames, task }
}
