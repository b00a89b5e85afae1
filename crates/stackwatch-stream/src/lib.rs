//! StackWatch event streaming
//!
//! Follows one stack per session: polls the provisioning backend, forwards
//! lifecycle events that have not been seen in this session, and closes
//! the stream once the stack settles.
//!
//! # Session state machine
//!
//! ```text
//!            describe / list events failed
//!   ┌─────────┐ ──────────────────────────────────────────┐
//!   │ Polling │                                            │
//!   └────┬────┘ ◄─────────── sleep(poll_interval) ──┐      │
//!        │ fetched                                  │      │
//!   ┌────▼─────┐  status not terminal               │      │
//!   │ Emitting │ ───────────────────────────────────┘      │
//!   └────┬─────┘                                           │
//!        │ status terminal                                 │
//!   ┌────▼─────────────┐                              ┌────▼───┐
//!   │ TerminalSnapshot │ ───────────────────────────► │ Closed │
//!   └──────────────────┘   final message + done       └────────┘
//! ```
//!
//! A session also moves to `Closed`, without emitting anything further,
//! as soon as its sink reports the remote side went away.

pub mod config;
pub mod controller;
pub mod dedup;
pub mod error;
pub mod frame;
pub mod session;
pub mod sink;

// Re-exports
pub use config::StreamConfig;
pub use controller::{SessionOutcome, SessionState, StreamController};
pub use dedup::SeenEvents;
pub use error::{Result, SinkClosed, StreamError};
pub use frame::{DoneReason, StreamFrame};
pub use session::{SessionHandle, spawn_session};
pub use sink::EventSink;
