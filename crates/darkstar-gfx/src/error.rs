//! Error types for darkstar-gfx.

use thiserror::Error;

/// Errors that can occur while parsing or expanding graphics resources.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] darkstar_common::Error),

    /// Only 8-bit paletted and 24-bit direct color images are supported.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u32),

    /// Width or height is zero or negative.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// Mip count outside 1..=9.
    #[error("invalid mip level count: {0}")]
    InvalidMipCount(u32),

    /// Mip level not present in the bitmap.
    #[error("mip level {level} out of range ({available} levels)")]
    MipOutOfRange { level: usize, available: usize },

    /// A paletted image has no palette to expand against.
    #[error("no palette available for palette index {0}")]
    MissingPalette(i32),

    /// Destination buffer or stride cannot hold the expanded rows.
    #[error("destination too small: needed {needed} bytes, got {available}")]
    DestinationTooSmall { needed: usize, available: usize },
}

impl Error {
    /// Shorthand for a malformed chunk error.
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        darkstar_common::Error::malformed(reason).into()
    }
}

/// Result type for graphics operations.
pub type Result<T> = std::result::Result<T, Error>;
