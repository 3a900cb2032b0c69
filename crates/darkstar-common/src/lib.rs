//! Common utilities for Darkstar.
//!
//! This crate provides foundational types used across all Darkstar crates:
//!
//! - [`MemStream`] - Bounds-checked read/write cursor over an in-memory buffer
//! - [`ChunkHeader`] - IFF/RIFF style chunk header with word/dword alignment
//! - [`Ident`] - Four-character chunk and object identifiers

mod chunk;
mod error;
mod ident;
mod stream;

pub use chunk::ChunkHeader;
pub use error::{Error, Result};
pub use ident::Ident;
pub use stream::MemStream;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Re-export memchr for string table scanning
pub use memchr;
