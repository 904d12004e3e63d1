//! # bz-core
//!
//! Ambient building blocks shared by the bzip2 decoder core: a resumable
//! MSB-first bit reader, the CRC-32/BZIP2 checksum, and the session's
//! error taxonomy.
//!
//! None of these types perform I/O themselves; they operate on
//! caller-supplied byte slices so that a decode session can suspend at any
//! bit fetch without blocking a thread.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitreader;
pub mod crc;
pub mod error;

pub use bitreader::BitReader;
pub use crc::Crc32Bzip2;
pub use error::{DecodeError, Result};
