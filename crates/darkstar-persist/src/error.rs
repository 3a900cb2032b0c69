//! Error types for darkstar-persist.

use thiserror::Error;

/// Errors that can occur while reconstructing persisted objects.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] darkstar_common::Error),

    /// No constructor registered under this class name.
    #[error("no persisted class registered as {0:?}")]
    UnknownClass(String),

    /// An object failed to read its own payload.
    #[error("failed to read {class}: {source}")]
    Read {
        class: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The process-wide registry was installed twice.
    #[error("persisted object registry already installed")]
    AlreadyInstalled,
}

impl Error {
    /// Wrap an object-specific error raised while reading `class`.
    pub fn read<E>(class: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Read {
            class,
            source: Box::new(source),
        }
    }
}

/// Result type for persisted object operations.
pub type Result<T> = std::result::Result<T, Error>;
