//! Error types for darkstar-common.

use thiserror::Error;

use crate::Ident;

/// Common error type for Darkstar operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A read or write would run past the end of the buffer.
    #[error("out of bounds: needed {needed} bytes but only {available} available")]
    OutOfBounds { needed: usize, available: usize },

    /// Leading identifier or tag not recognized.
    #[error("unknown format identifier {0}")]
    UnknownFormat(Ident),

    /// Declared chunk size inconsistent with the buffer, or a semantically
    /// invalid field.
    #[error("malformed chunk: {0}")]
    MalformedChunk(String),

    /// String longer than its length prefix can express.
    #[error("string of {0} bytes does not fit its length prefix")]
    StringTooLong(usize),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing null terminator in string.
    #[error("string missing null terminator")]
    MissingNullTerminator,
}

impl Error {
    /// Shorthand for a [`Error::MalformedChunk`] with a formatted reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedChunk(reason.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
