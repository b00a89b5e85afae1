//! Stream error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Failed to encode frame payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The remote end of a sink is gone; nothing more can be delivered
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("stream sink closed")]
pub struct SinkClosed;

pub type Result<T> = std::result::Result<T, StreamError>;
