//! Error types for the bz2-decoder core.
//!
//! The taxonomy mirrors the decode-session error channel: each variant is a
//! distinct fatal condition a session can report. A session that has
//! returned an error is unusable except for being dropped.

use thiserror::Error;

/// Fatal conditions a decode session can report.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A size-of-integer assumption was violated at start-up.
    #[error("config error: {message}")]
    Config {
        /// What assumption failed.
        message: String,
    },

    /// Bad file or block magic. Distinguished from generic data errors so
    /// callers can treat a magic mismatch on byte 0 as "not a bzip2 stream"
    /// rather than as corruption of a recognised one.
    #[error("bad magic: expected {expected:02x?}, found {found:02x?}")]
    Magic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Bytes actually read.
        found: Vec<u8>,
    },

    /// Any violation of a per-block invariant or range check: an
    /// out-of-range code length, selector, or origPtr; a non-monotone
    /// cftab; a RUN-length overflow; an empty used-symbol list; and so on.
    #[error("corrupt data: {message}")]
    Data {
        /// Description of the violated invariant.
        message: String,
    },

    /// A block's stored CRC does not match the CRC computed while
    /// producing its output.
    #[error("block CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    BlockCrcMismatch {
        /// CRC recorded in the block header.
        stored: u32,
        /// CRC computed over the decoded block.
        computed: u32,
    },

    /// The stream trailer's combined CRC does not match the one
    /// accumulated across all blocks.
    #[error("stream CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    StreamCrcMismatch {
        /// CRC recorded in the stream trailer.
        stored: u32,
        /// CRC accumulated from per-block CRCs.
        computed: u32,
    },

    /// Input was exhausted with a block in progress and the caller
    /// signalled there is no more input coming. Distinct from the ordinary
    /// "need more input" suspension, which is not an error.
    #[error("unexpected end of input: {message}")]
    UnexpectedEof {
        /// Where in the decode the input ran out.
        message: String,
    },

    /// Allocation failed for a block's working buffers (`tt`, `ll16`,
    /// `ll4`), surfaced via `Vec::try_reserve_exact` instead of aborting.
    #[error("out of memory: could not allocate {requested} bytes")]
    Mem {
        /// Bytes that were requested.
        requested: usize,
    },

    /// An internal postcondition was violated. A bug surface, not
    /// user-reachable on well-formed input.
    #[error("internal assertion failed: {message}")]
    Internal {
        /// What invariant was violated.
        message: String,
    },
}

/// Result type alias for decode-session operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

impl DecodeError {
    /// Build a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Build a magic-mismatch error.
    pub fn magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::Magic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Build a generic data error.
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Build a block CRC mismatch error.
    pub fn block_crc_mismatch(stored: u32, computed: u32) -> Self {
        Self::BlockCrcMismatch { stored, computed }
    }

    /// Build a stream CRC mismatch error.
    pub fn stream_crc_mismatch(stored: u32, computed: u32) -> Self {
        Self::StreamCrcMismatch { stored, computed }
    }

    /// Build an unexpected-EOF error.
    pub fn unexpected_eof(message: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            message: message.into(),
        }
    }

    /// Build a memory error.
    pub fn mem(requested: usize) -> Self {
        Self::Mem { requested }
    }

    /// Build an internal-assertion error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
