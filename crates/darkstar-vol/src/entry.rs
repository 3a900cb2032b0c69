//! Volume index entries.

use std::fmt;
use std::path::PathBuf;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// On-disk `voli` record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct RawEntry {
    /// Tag identifier of the file.
    pub id: u32,
    /// Offset of the file name in the string table; negative for none.
    pub name_offset: i32,
    /// Absolute offset of the entry's `VBLK` chunk.
    pub offset: i32,
    /// Uncompressed size in bytes.
    pub size: u32,
    pub compress_type: u8,
}

impl RawEntry {
    /// Size of a record on disk.
    pub const SIZE: usize = 17;
}

/// How an entry's payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Rle,
    Lzss,
    Lzh,
    Unknown(u8),
}

impl From<u8> for Compression {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Rle,
            2 => Self::Lzss,
            3 => Self::Lzh,
            other => Self::Unknown(other),
        }
    }
}

impl Compression {
    /// Raw type byte.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Rle => 1,
            Self::Lzss => 2,
            Self::Lzh => 3,
            Self::Unknown(value) => value,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.pad("none"),
            Self::Rle => f.pad("rle"),
            Self::Lzss => f.pad("lzss"),
            Self::Lzh => f.pad("lzh"),
            Self::Unknown(value) => f.pad(&format!("unknown({value})")),
        }
    }
}

/// A file stored in a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEntry {
    pub id: u32,
    pub name: String,
    /// Absolute offset of the `VBLK` chunk.
    pub offset: u32,
    /// Uncompressed size in bytes.
    pub size: u32,
    pub compression: Compression,
}

impl VolumeEntry {
    /// Lowercase extension without the dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }

    /// Check the extension against `ext` (with or without a leading dot).
    pub fn has_extension(&self, ext: &str) -> bool {
        let wanted = ext.trim_start_matches('.');
        self.extension().is_some_and(|own| own.eq_ignore_ascii_case(wanted))
    }

    /// Relative output path for extraction.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(self.name.replace('\\', "/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> VolumeEntry {
        VolumeEntry {
            id: 0,
            name: name.to_string(),
            offset: 0,
            size: 0,
            compression: Compression::None,
        }
    }

    #[test]
    fn test_raw_entry_size() {
        assert_eq!(std::mem::size_of::<RawEntry>(), RawEntry::SIZE);
    }

    #[test]
    fn test_extension() {
        assert_eq!(entry("Lush.PPL").extension().as_deref(), Some("ppl"));
        assert!(entry("grass.bmp").has_extension(".BMP"));
        assert!(entry("grass.bmp").has_extension("bmp"));
        assert!(!entry("readme").has_extension("bmp"));
        assert_eq!(entry("readme").extension(), None);
    }

    #[test]
    fn test_compression_codes() {
        for code in 0..=4u8 {
            assert_eq!(Compression::from(code).as_u8(), code);
        }
        assert_eq!(Compression::from(3), Compression::Lzh);
        assert_eq!(Compression::from(9).to_string(), "unknown(9)");
    }
}
