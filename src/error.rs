//! # Error Types
//!
//! This module defines all error types used throughout the library.
//!
//! ## Error Hierarchy
//!
//! The main [`Error`] enum covers the endpoint's failure modes:
//!
//! | Variant | Cause | Recoverable? |
//! |---------|-------|--------------|
//! | [`Error::Init`] | Runtime failed to initialize | No (fatal, exit non-zero) |
//! | [`Error::Decode`] | Malformed request payload | Yes (message is dropped) |
//!
//! Decode failures never cross the runtime callback boundary: the endpoint
//! logs them and drops the offending message without sending a response.

use std::fmt;

/// Result type alias using the library's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for all endpoint operations.
#[derive(Debug)]
pub enum Error {
    /// The middleware runtime could not be initialized.
    ///
    /// Fatal: there is no retry path. The bootstrap exits with a non-zero
    /// status when it sees this.
    Init(String),

    /// A request payload failed wire-format validation.
    ///
    /// Recovered locally: the message is logged and dropped, no response
    /// is sent.
    Decode(DecodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(reason) => write!(f, "runtime initialization failed: {reason}"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Init(_) => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// Reasons a request payload is rejected by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload is not exactly the fixed request length.
    ///
    /// Carries the actual length received.
    InvalidLength(usize),

    /// The operation byte is not one of the recognized command codes.
    ///
    /// Carries the offending byte.
    InvalidOperation(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength(len) => {
                write!(f, "invalid payload length: expected 6 bytes, got {len}")
            }
            Self::InvalidOperation(op) => {
                write!(f, "invalid operation byte: 0x{op:02x}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
