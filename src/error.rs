use thiserror::Error;

use crate::commands::TimeField;

/// Crate-level error for configuration, IO and payload concerns.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Inbound(#[from] InboundError),

    #[error("worker failed: {0}")]
    Worker(String),
}

/// Failure of a single register or coil operation on the serial line.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device exception: {0}")]
    Exception(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A numeric value outside the documented range of its destination field.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field}: value {value} outside {min}..={max}")]
pub struct RangeError {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Outcome taxonomy of one dispatch cycle. None of these are retried.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("unknown command: {mnemonic}")]
    UnknownCommand { mnemonic: String },

    #[error("malformed time text for {mnemonic}: {text:?}")]
    MalformedTimeText { mnemonic: String, text: String },

    #[error("range error: {0}")]
    Range(#[from] RangeError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Some sub-writes of a multi-register time command were applied and at
    /// least one failed. The device is left as-is.
    #[error("partial write: {failed} failed after {applied:?} were applied: {source}")]
    PartialWrite {
        failed: TimeField,
        applied: Vec<TimeField>,
        #[source]
        source: TransportError,
    },
}

/// Rejection of an inbound message before it reaches the queue.
#[derive(Error, Debug)]
pub enum InboundError {
    #[error("payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no command field")]
    MissingCommand,

    #[error("{field} is {len} bytes, limit is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}
