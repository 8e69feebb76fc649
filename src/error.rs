//! Error types for capture, decoding, storage, and replay.
//!
//! Decode errors cause the offending buffer to be dropped by the capture
//! pipeline; storage and replay errors are surfaced to the operator.

use thiserror::Error;

/// Result type alias for sniffer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding, storing, or replaying traffic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Buffer too short for the frame it declares.
    #[error("Incomplete frame: need {needed} more bytes")]
    IncompleteFrame {
        /// Number of additional bytes needed.
        needed: usize,
    },

    /// Invalid opcode value.
    #[error("Invalid opcode: {0:#x}")]
    InvalidOpcode(u8),

    /// Reserved opcode used.
    #[error("Reserved opcode: {0:#x}")]
    ReservedOpcode(u8),

    /// Declared payload length exceeds what this platform can address.
    #[error("Declared payload length {0} exceeds platform limits")]
    PayloadTooLarge(u64),

    /// Payload failed to inflate.
    #[error("Decompression failed: {0}")]
    Decompress(String),

    /// Storage file could not be opened or created.
    #[error("Cannot open {path}: {reason}")]
    FileOpen {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },

    /// Storage file ended before the data its headers declare.
    #[error("Truncated file at byte {offset}: {detail}")]
    TruncatedFile {
        /// Offset at which the shortfall was detected.
        offset: u64,
        /// What was being read when the file ran out.
        detail: String,
    },

    /// TCP connection to the replay target failed.
    #[error("Cannot connect to {target}: {reason}")]
    Connect {
        /// Destination address and port.
        target: String,
        /// Underlying I/O error message.
        reason: String,
    },

    /// Message index outside the store.
    #[error("Invalid message index {index} (store has {len})")]
    InvalidIndex {
        /// Requested index.
        index: usize,
        /// Number of stored messages.
        len: usize,
    },

    /// Capture device could not be found or opened.
    #[error("Capture error: {0}")]
    Capture(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
