//! Four-character identifiers used by chunks and persisted objects.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Four-character code identifying a chunk or persisted object.
///
/// Stored as the raw bytes in file order, so `Ident(*b"PPAL")` compares equal
/// to the little-endian `u32` 0x4C415050 the engine uses as a tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Ident(pub [u8; 4]);

impl Ident {
    /// Persisted object envelope.
    pub const PERS: Self = Self(*b"PERS");
    /// Windows RIFF container.
    pub const RIFF: Self = Self(*b"RIFF");
    /// Windows palette form type.
    pub const PAL: Self = Self(*b"PAL ");
    /// Native palette container.
    pub const PPAL: Self = Self(*b"PPAL");
    /// Multi-entry palette container.
    pub const PL98: Self = Self(*b"PL98");
    /// Native bitmap container.
    pub const PBMP: Self = Self(*b"PBMP");
    /// Header chunk.
    pub const HEAD: Self = Self(*b"head");
    /// Info chunk.
    pub const INFO: Self = Self(*b"info");
    /// Payload chunk.
    pub const DATA: Self = Self(*b"data");
    /// Mip detail count chunk.
    pub const DETL: Self = Self(*b"DETL");
    /// Palette index chunk.
    pub const PIDX: Self = Self(*b"PiDX");
    /// Shade remap chunk.
    pub const PSPL: Self = Self(*b"pspl");
    /// Translucency remap chunk.
    pub const PTPL: Self = Self(*b"ptpl");
    /// Haze remap chunk.
    pub const HZPL: Self = Self(*b"hzpl");
    /// Volume archive.
    pub const PVOL: Self = Self(*b"PVOL");
    /// Volume string table.
    pub const VOLS: Self = Self(*b"vols");
    /// Volume entry index.
    pub const VOLI: Self = Self(*b"voli");
    /// Volume data block.
    pub const VBLK: Self = Self(*b"VBLK");

    /// Build an identifier from its numeric tag.
    #[inline]
    pub const fn from_tag(tag: u32) -> Self {
        Self(tag.to_le_bytes())
    }

    /// Numeric tag as the engine stores it (little-endian).
    #[inline]
    pub const fn tag(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// Check whether the first two bytes match, ignoring the rest.
    ///
    /// Windows bitmap files only carry a two-byte `BM` signature.
    #[inline]
    pub fn starts_with(self, prefix: &[u8; 2]) -> bool {
        self.0[0] == prefix[0] && self.0[1] == prefix[1]
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ident({})", self)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            for &b in &self.0 {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "{:#010x}", self.tag())
        }
    }
}

impl From<u32> for Ident {
    fn from(tag: u32) -> Self {
        Self::from_tag(tag)
    }
}
