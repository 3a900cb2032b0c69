//! `PVOL` volume archives.
//!
//! Layout:
//! - `PVOL` header whose size field holds the absolute offset of the string table
//! - `vols` chunk with null-terminated file names
//! - `voli` chunk with one 17-byte [`RawEntry`] per file
//! - file payloads, each behind an 8-byte `VBLK` header

use std::fs::File;
use std::path::Path;

use darkstar_common::{ChunkHeader, Ident, MemStream};
use memmap2::Mmap;

use crate::entry::{Compression, RawEntry, VolumeEntry};
use crate::{Error, Result};

/// Volume bytes, mapped from disk or owned.
enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl AsRef<[u8]> for Backing {
    fn as_ref(&self) -> &[u8] {
        match self {
            Backing::Mapped(mmap) => mmap,
            Backing::Owned(data) => data,
        }
    }
}

/// An opened volume archive.
pub struct Volume {
    backing: Backing,
    name: String,
    entries: Vec<VolumeEntry>,
}

impl std::fmt::Debug for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Volume")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Volume {
    /// Memory-map and index a volume file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let entries = parse_entries(&mmap)?;
        log::debug!("opened volume {name} with {} entries", entries.len());

        Ok(Self {
            backing: Backing::Mapped(mmap),
            name,
            entries,
        })
    }

    /// Index a volume held in memory.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let entries = parse_entries(&data)?;
        Ok(Self {
            backing: Backing::Owned(data),
            name: name.into(),
            entries,
        })
    }

    /// Volume name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in index order.
    #[inline]
    pub fn entries(&self) -> &[VolumeEntry] {
        &self.entries
    }

    /// Entries whose extension matches `ext`, or all entries.
    pub fn enumerate<'a>(&'a self, ext: Option<&'a str>) -> impl Iterator<Item = &'a VolumeEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| ext.map_or(true, |ext| entry.has_extension(ext)))
    }

    /// Find an entry by name, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<&VolumeEntry> {
        self.entries.iter().find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Read and expand an entry's contents.
    pub fn read(&self, entry: &VolumeEntry) -> Result<Vec<u8>> {
        let data = self.backing.as_ref();
        let start = entry.offset as usize;
        let mut stream = MemStream::new(data);
        stream.set_position(start);
        if stream.position() != start {
            return Err(darkstar_common::Error::malformed(format!(
                "{}: block offset {start} past end of volume",
                entry.name
            ))
            .into());
        }

        let block = ChunkHeader::read(&mut stream)?;
        if block.ident != Ident::VBLK {
            log::warn!("{}: expected VBLK at {start}, found {}", entry.name, block.ident);
        }
        let payload = &data[start + ChunkHeader::SIZE..];
        let size = entry.size as usize;

        match entry.compression {
            Compression::None => payload
                .get(..size)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| {
                    darkstar_common::Error::OutOfBounds {
                        needed: size,
                        available: payload.len(),
                    }
                    .into()
                }),
            Compression::Lzh => {
                let packed = (block.aligned_size() as usize).min(payload.len());
                Ok(darkstar_lzh::decompress_to_vec(&payload[..packed], size)?)
            }
            other => Err(Error::UnsupportedCompression(other.as_u8())),
        }
    }

    /// Read an entry by name.
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self.find(name).ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.read(entry)
    }

    /// Read several entries in parallel.
    #[cfg(feature = "parallel")]
    pub fn read_parallel(&self, entries: &[&VolumeEntry]) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        entries.par_iter().map(|entry| self.read(entry)).collect()
    }
}

fn parse_entries(data: &[u8]) -> Result<Vec<VolumeEntry>> {
    let mut stream = MemStream::new(data);
    let header = ChunkHeader::read(&mut stream)?;
    if header.ident != Ident::PVOL {
        return Err(darkstar_common::Error::UnknownFormat(header.ident).into());
    }

    let table = (header.raw_size() & !ChunkHeader::ALIGN_DWORD) as usize;
    stream.set_position(table);
    if stream.position() != table {
        return Err(darkstar_common::Error::malformed(format!("string table offset {table} past end of volume")).into());
    }

    let strings_header = ChunkHeader::read(&mut stream)?;
    if strings_header.ident != Ident::VOLS {
        return Err(darkstar_common::Error::UnknownFormat(strings_header.ident).into());
    }
    let strings = strings_header.payload(table, data)?;
    strings_header.skip_to(table, &mut stream)?;

    let index_start = stream.position();
    let index_header = ChunkHeader::read(&mut stream)?;
    if index_header.ident != Ident::VOLI {
        return Err(darkstar_common::Error::UnknownFormat(index_header.ident).into());
    }
    let index = index_header.payload(index_start, data)?;

    let count = index.len() / RawEntry::SIZE;
    let mut records = MemStream::new(index);
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let raw: RawEntry = records.read_struct()?;
        let (id, name_offset, offset, size) = (raw.id, raw.name_offset, raw.offset, raw.size);
        if offset < 0 {
            return Err(darkstar_common::Error::malformed(format!("entry {id:#x} has negative offset {offset}")).into());
        }
        entries.push(VolumeEntry {
            id,
            name: entry_name(strings, name_offset),
            offset: offset as u32,
            size,
            compression: Compression::from(raw.compress_type),
        });
    }
    Ok(entries)
}

/// Null-terminated name at `offset` in the string table.
fn entry_name(strings: &[u8], offset: i32) -> String {
    let Some(tail) = usize::try_from(offset).ok().and_then(|at| strings.get(at..)) else {
        return String::new();
    };
    let end = memchr::memchr(0, tail).unwrap_or(tail.len());
    String::from_utf8_lossy(&tail[..end]).into_owned()
}
