//! Error types for the volume crate.

use thiserror::Error;

/// Errors that can occur when working with volumes.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] darkstar_common::Error),

    /// Compressed entry could not be expanded.
    #[error("{0}")]
    Lzh(#[from] darkstar_lzh::Error),

    /// Persisted object could not be rebuilt.
    #[error("{0}")]
    Persist(#[from] darkstar_persist::Error),

    /// Entry uses a compression scheme this reader does not implement.
    #[error("unsupported compression type: {0}")]
    UnsupportedCompression(u8),

    /// No entry or search path holds the file.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

/// Result type for volume operations.
pub type Result<T> = std::result::Result<T, Error>;
