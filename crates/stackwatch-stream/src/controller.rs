//! Poll / emit / terminate loop for one stream session

use crate::config::StreamConfig;
use crate::dedup::SeenEvents;
use crate::error::SinkClosed;
use crate::frame::{DoneReason, StreamFrame};
use crate::sink::EventSink;
use stackwatch_cloud::{ProvisioningClient, StackStatus};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a session currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Polling,
    Emitting,
    TerminalSnapshot,
    Closed,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The stack reached a terminal status; `done` carried it
    Completed(StackStatus),
    /// Describing the stack failed; `done` carried `not_found`
    NotFound,
    /// Fetching events failed; `done` carried `error`
    EventFetchFailed,
    /// The remote side disconnected; nothing more was emitted
    Cancelled,
}

/// Drives one stream session against a provisioning backend
///
/// The controller owns its [`SeenEvents`]; the backend client is the only
/// thing shared with other sessions.
pub struct StreamController {
    client: Arc<dyn ProvisioningClient>,
    stack_name: String,
    config: StreamConfig,
    seen: SeenEvents,
    state: SessionState,
}

type Step = ControlFlow<SessionOutcome>;

impl StreamController {
    pub fn new(
        client: Arc<dyn ProvisioningClient>,
        stack_name: impl Into<String>,
        config: StreamConfig,
    ) -> Self {
        Self {
            client,
            stack_name: stack_name.into(),
            config,
            seen: SeenEvents::new(),
            state: SessionState::Polling,
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn seen(&self) -> &SeenEvents {
        &self.seen
    }

    /// Run the session until the stack settles, a fetch fails, or the sink
    /// closes. The controller is left in [`SessionState::Closed`].
    #[tracing::instrument(skip_all, fields(stack = %self.stack_name, backend = %self.client.name()))]
    pub async fn run<S>(&mut self, sink: &mut S) -> SessionOutcome
    where
        S: EventSink + ?Sized,
    {
        info!("Stream session started");

        let outcome = match self.drive(sink).await {
            Ok(outcome) => outcome,
            Err(SinkClosed) => SessionOutcome::Cancelled,
        };

        self.transition(SessionState::Closed);
        info!(outcome = ?outcome, seen_events = self.seen.len(), "Stream session closed");
        outcome
    }

    async fn drive<S>(&mut self, sink: &mut S) -> Result<SessionOutcome, SinkClosed>
    where
        S: EventSink + ?Sized,
    {
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            debug!(cycle, "Poll cycle");

            if let ControlFlow::Break(outcome) = self.poll_cycle(sink).await? {
                return Ok(outcome);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = sink.closed() => return Err(SinkClosed),
            }
        }
    }

    async fn poll_cycle<S>(&mut self, sink: &mut S) -> Result<Step, SinkClosed>
    where
        S: EventSink + ?Sized,
    {
        self.transition(SessionState::Polling);

        ensure_open(sink)?;
        let status = match self.client.describe_status(&self.stack_name).await {
            Ok(status) => status,
            Err(e) => {
                // Any describe failure is treated as the stack being gone,
                // including transient backend errors.
                warn!(error = %e, not_found = e.is_not_found(), "Unable to describe stack");
                ensure_open(sink)?;
                sink.send(StreamFrame::message(format!(
                    "[ERROR] Unable to describe stack (it may have been deleted): {}",
                    e
                )))
                .await?;
                sink.send(StreamFrame::Done(DoneReason::NotFound)).await?;
                return Ok(ControlFlow::Break(SessionOutcome::NotFound));
            }
        };

        ensure_open(sink)?;
        let events = match self.client.list_events(&self.stack_name).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Failed to fetch stack events");
                ensure_open(sink)?;
                sink.send(StreamFrame::message(format!(
                    "[ERROR] Failed to fetch events: {}",
                    e
                )))
                .await?;
                sink.send(StreamFrame::Done(DoneReason::Error)).await?;
                return Ok(ControlFlow::Break(SessionOutcome::EventFetchFailed));
            }
        };

        self.transition(SessionState::Emitting);
        ensure_open(sink)?;
        let mut emitted = 0usize;
        for event in &events {
            if self.seen.admit(event) {
                sink.send(StreamFrame::Message(event.progress_line())).await?;
                emitted += 1;
            }
        }
        debug!(status = %status, fetched = events.len(), emitted, "Events forwarded");

        if !status.is_terminal() {
            return Ok(ControlFlow::Continue(()));
        }

        self.transition(SessionState::TerminalSnapshot);
        if !status.is_removed() {
            ensure_open(sink)?;
            match self.client.list_resources(&self.stack_name).await {
                Ok(resources) => {
                    debug!(resources = resources.len(), "Resource snapshot taken");
                    sink.send(StreamFrame::FinalResources(resources)).await?;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to list stack resources");
                    sink.send(StreamFrame::message(format!(
                        "[ERROR] Failed to list resources: {}",
                        e
                    )))
                    .await?;
                }
            }
        }

        sink.send(StreamFrame::message(format!(
            "Stack reached final state: {}",
            status
        )))
        .await?;
        sink.send(StreamFrame::Done(DoneReason::Status(status.clone())))
            .await?;

        Ok(ControlFlow::Break(SessionOutcome::Completed(status)))
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Session state");
            self.state = next;
        }
    }
}

fn ensure_open<S>(sink: &S) -> Result<(), SinkClosed>
where
    S: EventSink + ?Sized,
{
    if sink.is_closed() {
        Err(SinkClosed)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stackwatch_cloud::StackResource;
    use stackwatch_cloud::testing::{PollCycle, ScriptedProvisioner, event};
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Sink that records every frame and can hang up after a number of them
    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<StreamFrame>,
        hang_up_after: Option<usize>,
    }

    impl RecordingSink {
        fn hanging_up_after(frames: usize) -> Self {
            Self {
                frames: Vec::new(),
                hang_up_after: Some(frames),
            }
        }

        fn messages(&self) -> Vec<&str> {
            self.frames
                .iter()
                .filter_map(|f| match f {
                    StreamFrame::Message(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn done_frames(&self) -> Vec<&DoneReason> {
            self.frames
                .iter()
                .filter_map(|f| match f {
                    StreamFrame::Done(reason) => Some(reason),
                    _ => None,
                })
                .collect()
        }

        fn snapshot_count(&self) -> usize {
            self.frames
                .iter()
                .filter(|f| matches!(f, StreamFrame::FinalResources(_)))
                .count()
        }
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn send(&mut self, frame: StreamFrame) -> Result<(), SinkClosed> {
            if self.is_closed() {
                return Err(SinkClosed);
            }
            self.frames.push(frame);
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.hang_up_after
                .is_some_and(|limit| self.frames.len() >= limit)
        }

        async fn closed(&self) {
            if !self.is_closed() {
                std::future::pending::<()>().await;
            }
        }
    }

    fn controller(client: &Arc<ScriptedProvisioner>) -> StreamController {
        let client: Arc<dyn ProvisioningClient> = client.clone();
        StreamController::new(client, "stack-acme", StreamConfig::default())
    }

    fn line(id: &str) -> String {
        event(id).progress_line()
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_cycles_emit_each_event_once() {
        let client = Arc::new(
            ScriptedProvisioner::new(vec![
                PollCycle::ok(StackStatus::CreateInProgress, vec![event("a"), event("b")]),
                PollCycle::ok(
                    StackStatus::CreateInProgress,
                    vec![event("c"), event("a"), event("b")],
                ),
                PollCycle::ok(
                    StackStatus::CreateComplete,
                    vec![event("c"), event("a"), event("b")],
                ),
            ])
            .with_resources(vec![
                StackResource::new("MyBucket", "AWS::S3::Bucket", "CREATE_COMPLETE")
                    .with_physical_id("bucket-acme"),
            ]),
        );
        let mut sink = RecordingSink::default();

        let mut session = controller(&client);
        let outcome = session.run(&mut sink).await;

        assert_eq!(outcome, SessionOutcome::Completed(StackStatus::CreateComplete));
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.seen().len(), 3);
        assert_eq!(
            sink.frames,
            vec![
                StreamFrame::Message(line("a")),
                StreamFrame::Message(line("b")),
                StreamFrame::Message(line("c")),
                StreamFrame::FinalResources(vec![
                    StackResource::new("MyBucket", "AWS::S3::Bucket", "CREATE_COMPLETE")
                        .with_physical_id("bucket-acme"),
                ]),
                StreamFrame::message("Stack reached final state: CREATE_COMPLETE"),
                StreamFrame::Done(DoneReason::Status(StackStatus::CreateComplete)),
            ]
        );
        assert_eq!(client.describe_calls(), 3);
        assert_eq!(client.resource_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_are_spaced_by_poll_interval() {
        let client = Arc::new(ScriptedProvisioner::new(vec![
            PollCycle::ok(StackStatus::CreateInProgress, Vec::new()),
            PollCycle::ok(StackStatus::CreateInProgress, Vec::new()),
            PollCycle::ok(StackStatus::CreateComplete, Vec::new()),
        ]));
        let mut sink = RecordingSink::default();

        let started = tokio::time::Instant::now();
        controller(&client).run(&mut sink).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(7), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_terminal_status_ends_with_one_done() {
        for status in [
            StackStatus::CreateComplete,
            StackStatus::CreateFailed,
            StackStatus::RollbackComplete,
            StackStatus::RollbackFailed,
            StackStatus::UpdateComplete,
            StackStatus::UpdateFailed,
            StackStatus::UpdateRollbackComplete,
            StackStatus::UpdateRollbackFailed,
            StackStatus::DeleteComplete,
            StackStatus::DeleteFailed,
        ] {
            let client = Arc::new(ScriptedProvisioner::new(vec![PollCycle::ok(
                status.clone(),
                vec![event("a")],
            )]));
            let mut sink = RecordingSink::default();

            let outcome = controller(&client).run(&mut sink).await;

            assert_eq!(outcome, SessionOutcome::Completed(status.clone()));
            assert_eq!(sink.done_frames(), vec![&DoneReason::Status(status.clone())]);
            assert!(sink.frames.last().is_some_and(StreamFrame::is_done));
            assert_eq!(client.describe_calls(), 1, "{status} must not poll again");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_complete_skips_snapshot() {
        let client = Arc::new(
            ScriptedProvisioner::new(vec![
                PollCycle::ok(StackStatus::DeleteInProgress, vec![event("a")]),
                PollCycle::ok(StackStatus::DeleteComplete, vec![event("b"), event("a")]),
            ])
            .with_resources(vec![StackResource::new(
                "MyBucket",
                "AWS::S3::Bucket",
                "DELETE_COMPLETE",
            )]),
        );
        let mut sink = RecordingSink::default();

        controller(&client).run(&mut sink).await;

        assert_eq!(sink.snapshot_count(), 0);
        assert_eq!(client.resource_calls(), 0);
        assert_eq!(
            sink.messages(),
            vec![
                line("a").as_str(),
                line("b").as_str(),
                "Stack reached final state: DELETE_COMPLETE",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_precedes_done() {
        let client = Arc::new(ScriptedProvisioner::new(vec![PollCycle::ok(
            StackStatus::RollbackComplete,
            Vec::new(),
        )]));
        let mut sink = RecordingSink::default();

        controller(&client).run(&mut sink).await;

        assert_eq!(sink.snapshot_count(), 1);
        let snapshot = sink
            .frames
            .iter()
            .position(|f| matches!(f, StreamFrame::FinalResources(_)));
        let done = sink.frames.iter().position(StreamFrame::is_done);
        assert!(snapshot < done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resource_failure_is_not_fatal() {
        let client = Arc::new(
            ScriptedProvisioner::new(vec![PollCycle::ok(
                StackStatus::CreateFailed,
                vec![event("a")],
            )])
            .with_resource_error("throttled"),
        );
        let mut sink = RecordingSink::default();

        let outcome = controller(&client).run(&mut sink).await;

        assert_eq!(outcome, SessionOutcome::Completed(StackStatus::CreateFailed));
        assert_eq!(sink.snapshot_count(), 0);
        assert_eq!(
            sink.messages(),
            vec![
                line("a").as_str(),
                "[ERROR] Failed to list resources: API error: throttled",
                "Stack reached final state: CREATE_FAILED",
            ]
        );
        assert_eq!(
            sink.done_frames(),
            vec![&DoneReason::Status(StackStatus::CreateFailed)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failure_ends_with_not_found() {
        let client = Arc::new(ScriptedProvisioner::new(vec![
            PollCycle::ok(StackStatus::DeleteInProgress, vec![event("a")]),
            PollCycle::status_error("Stack with id stack-acme does not exist"),
            PollCycle::ok(StackStatus::DeleteInProgress, vec![event("z")]),
        ]));
        let mut sink = RecordingSink::default();

        let outcome = controller(&client).run(&mut sink).await;

        assert_eq!(outcome, SessionOutcome::NotFound);
        assert_eq!(
            sink.frames,
            vec![
                StreamFrame::Message(line("a")),
                StreamFrame::message(
                    "[ERROR] Unable to describe stack (it may have been deleted): \
                     API error: Stack with id stack-acme does not exist"
                ),
                StreamFrame::Done(DoneReason::NotFound),
            ]
        );
        assert_eq!(client.describe_calls(), 2);
        assert_eq!(client.event_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_failure_ends_with_error() {
        let client = Arc::new(ScriptedProvisioner::new(vec![PollCycle::events_error(
            StackStatus::CreateInProgress,
            "timeout",
        )]));
        let mut sink = RecordingSink::default();

        let outcome = controller(&client).run(&mut sink).await;

        assert_eq!(outcome, SessionOutcome::EventFetchFailed);
        assert_eq!(
            sink.frames,
            vec![
                StreamFrame::message("[ERROR] Failed to fetch events: API error: timeout"),
                StreamFrame::Done(DoneReason::Error),
            ]
        );
        assert_eq!(client.describe_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_terminal_status_keeps_polling() {
        let client = Arc::new(ScriptedProvisioner::new(vec![PollCycle::ok(
            StackStatus::UpdateCompleteCleanupInProgress,
            vec![event("a")],
        )]));
        let (mut tx, mut rx) = mpsc::channel(16);

        let session_client = client.clone();
        let task = tokio::spawn(async move {
            let mut session = controller(&session_client);
            session.run(&mut tx).await
        });

        assert_eq!(rx.recv().await, Some(StreamFrame::Message(line("a"))));
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(client.describe_calls() >= 10);
        assert!(rx.try_recv().is_err(), "no frames after the first cycle");

        drop(rx);
        assert_eq!(task.await.unwrap(), SessionOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_during_sleep_stops_polling() {
        let client = Arc::new(ScriptedProvisioner::new(vec![PollCycle::ok(
            StackStatus::CreateInProgress,
            vec![event("a")],
        )]));
        let (mut tx, mut rx) = mpsc::channel(16);

        let session_client = client.clone();
        let task = tokio::spawn(async move {
            let mut session = controller(&session_client);
            session.run(&mut tx).await
        });

        assert!(rx.recv().await.is_some());
        drop(rx);

        assert_eq!(task.await.unwrap(), SessionOutcome::Cancelled);
        assert_eq!(client.describe_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_mid_cycle_emits_nothing_more() {
        let client = Arc::new(ScriptedProvisioner::new(vec![PollCycle::ok(
            StackStatus::CreateComplete,
            vec![event("c"), event("b"), event("a")],
        )]));
        let mut sink = RecordingSink::hanging_up_after(2);

        let mut session = controller(&client);
        let outcome = session.run(&mut sink).await;

        assert_eq!(outcome, SessionOutcome::Cancelled);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(sink.frames.len(), 2);
        assert!(sink.done_frames().is_empty());
        assert_eq!(client.resource_calls(), 0);
    }

    #[tokio::test]
    async fn test_closed_sink_issues_no_backend_calls() {
        let client = Arc::new(ScriptedProvisioner::new(vec![PollCycle::ok(
            StackStatus::CreateInProgress,
            Vec::new(),
        )]));
        let mut sink = RecordingSink::hanging_up_after(0);

        let outcome = controller(&client).run(&mut sink).await;

        assert_eq!(outcome, SessionOutcome::Cancelled);
        assert_eq!(client.describe_calls(), 0);
    }
}
