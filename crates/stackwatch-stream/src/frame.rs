//! Frames written to a stream session and their text/event-stream encoding
//!
//! Wire format (one frame each):
//!
//! ```text
//! data: <text>\n\n                          progress / diagnostic message
//! event: finalResources\ndata: <json>\n\n   resource snapshot
//! event: done\ndata: <reason>\n\n           end of stream
//! ```

use crate::error::Result;
use stackwatch_cloud::{StackResource, StackStatus};

pub const FINAL_RESOURCES_EVENT: &str = "finalResources";
pub const DONE_EVENT: &str = "done";

/// Why a stream ended, carried as the `done` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoneReason {
    /// The stack reached this terminal status
    Status(StackStatus),
    /// The stack could not be described
    NotFound,
    /// The stack's events could not be fetched
    Error,
}

impl std::fmt::Display for DoneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoneReason::Status(status) => f.write_str(status.as_str()),
            DoneReason::NotFound => write!(f, "not_found"),
            DoneReason::Error => write!(f, "error"),
        }
    }
}

/// One unit written to a session's transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Human-readable progress or diagnostic line (unnamed event)
    Message(String),
    /// Resources of a stack that settled without being removed
    FinalResources(Vec<StackResource>),
    /// Terminal signal; always the last frame of a session
    Done(DoneReason),
}

impl StreamFrame {
    pub fn message(text: impl Into<String>) -> Self {
        StreamFrame::Message(text.into())
    }

    /// Event name on the wire; `None` for the default (unnamed) event
    pub fn event_name(&self) -> Option<&'static str> {
        match self {
            StreamFrame::Message(_) => None,
            StreamFrame::FinalResources(_) => Some(FINAL_RESOURCES_EVENT),
            StreamFrame::Done(_) => Some(DONE_EVENT),
        }
    }

    /// Payload carried in the frame's `data` field(s)
    ///
    /// Line breaks are normalized to `\n` so every line maps onto one
    /// `data:` field.
    pub fn payload(&self) -> Result<String> {
        let payload = match self {
            StreamFrame::Message(text) => text.replace("\r\n", "\n").replace('\r', "\n"),
            StreamFrame::FinalResources(resources) => serde_json::to_string(resources)?,
            StreamFrame::Done(reason) => reason.to_string(),
        };
        Ok(payload)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, StreamFrame::Done(_))
    }

    /// Encode the frame as text/event-stream
    pub fn encode(&self) -> Result<String> {
        let payload = self.payload()?;
        let mut out = String::with_capacity(payload.len() + 32);

        if let Some(name) = self.event_name() {
            out.push_str("event: ");
            out.push_str(name);
            out.push('\n');
        }
        for line in payload.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');

        Ok(out)
    }
}
