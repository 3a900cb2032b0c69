//! Error types for the LZH codec.

use thiserror::Error;

/// Errors that can occur while expanding LZH data.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] darkstar_common::Error),

    /// The bitstream ran out before the declared output size was reached.
    #[error("LZH bitstream exhausted after {produced} of {expected} bytes")]
    DecompressionUnderrun { produced: usize, expected: usize },
}

/// Result type for LZH operations.
pub type Result<T> = std::result::Result<T, Error>;
