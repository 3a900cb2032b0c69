//! IFF/RIFF style chunk headers.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Ident, MemStream, Result};

/// An 8-byte chunk header: identifier followed by a size field.
///
/// The high bit of the size selects the padding rule for the payload:
/// set means the low 31 bits are rounded up to a multiple of 4, clear means
/// the whole value is rounded up to a multiple of 2 (classic RIFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ChunkHeader {
    /// Chunk identifier.
    pub ident: Ident,
    /// Size field as stored, including the alignment flag.
    raw_size: u32,
}

impl ChunkHeader {
    /// Size of the header on disk.
    pub const SIZE: usize = 8;

    /// Size flag selecting dword alignment.
    pub const ALIGN_DWORD: u32 = 0x8000_0000;

    /// Create a header from its identifier and stored size field.
    #[inline]
    pub const fn new(ident: Ident, raw_size: u32) -> Self {
        Self { ident, raw_size }
    }

    /// Read a header from the stream.
    #[inline]
    pub fn read<B: AsRef<[u8]>>(stream: &mut MemStream<B>) -> Result<Self> {
        stream.read_struct()
    }

    /// Size field exactly as stored.
    #[inline]
    pub const fn raw_size(&self) -> u32 {
        self.raw_size
    }

    /// Payload size after applying the alignment rule.
    #[inline]
    pub const fn aligned_size(&self) -> u32 {
        if self.raw_size & Self::ALIGN_DWORD != 0 {
            ((self.raw_size & !Self::ALIGN_DWORD) + 3) & !3
        } else {
            // Widen so 0xFFFF_FFFF cannot wrap to zero.
            (((self.raw_size as u64) + 1) & !1) as u32
        }
    }

    /// Absolute position just past this chunk, given the position of its
    /// header.
    #[inline]
    pub fn end_position(&self, start: usize) -> Option<usize> {
        start
            .checked_add(Self::SIZE)?
            .checked_add(self.aligned_size() as usize)
    }

    /// Move the stream to the next sibling chunk.
    ///
    /// `start` is the position of this chunk's header. A chunk that claims
    /// to extend past the end of the buffer is malformed.
    pub fn skip_to<B: AsRef<[u8]>>(&self, start: usize, stream: &mut MemStream<B>) -> Result<()> {
        match self.end_position(start) {
            Some(end) if end <= stream.len() => {
                stream.set_position(end);
                Ok(())
            }
            _ => Err(Error::malformed(format!(
                "chunk {} at {} declares {} bytes, buffer holds {}",
                self.ident,
                start,
                self.aligned_size(),
                stream.len()
            ))),
        }
    }

    /// Borrow the payload of this chunk from the buffer.
    pub fn payload<'a>(&self, start: usize, data: &'a [u8]) -> Result<&'a [u8]> {
        let end = self
            .end_position(start)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| Error::malformed(format!("chunk {} overruns buffer", self.ident)))?;
        Ok(&data[start + Self::SIZE..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_alignment() {
        assert_eq!(ChunkHeader::new(Ident::DATA, 5).aligned_size(), 6);
        assert_eq!(ChunkHeader::new(Ident::DATA, 6).aligned_size(), 6);
        assert_eq!(ChunkHeader::new(Ident::DATA, 0).aligned_size(), 0);
    }

    #[test]
    fn test_dword_alignment() {
        let flag = ChunkHeader::ALIGN_DWORD;
        assert_eq!(ChunkHeader::new(Ident::DATA, flag | 5).aligned_size(), 8);
        assert_eq!(ChunkHeader::new(Ident::DATA, flag | 8).aligned_size(), 8);
        assert_eq!(ChunkHeader::new(Ident::DATA, flag).aligned_size(), 0);
    }

    #[test]
    fn test_alignment_idempotent() {
        for raw in [0u32, 1, 2, 3, 7, 255, 1024] {
            for flag in [0, ChunkHeader::ALIGN_DWORD] {
                let once = ChunkHeader::new(Ident::DATA, flag | raw).aligned_size();
                let twice = ChunkHeader::new(Ident::DATA, flag | once).aligned_size();
                assert_eq!(once, twice);
                assert!(once >= raw);
            }
        }
    }

    #[test]
    fn test_read_and_skip() {
        // "info" chunk with 3 bytes of payload padded to 4, then "data".
        let mut data = Vec::new();
        data.extend_from_slice(b"info");
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 0]);
        data.extend_from_slice(b"data");
        data.extend_from_slice(&0u32.to_le_bytes());

        let mut stream = MemStream::new(&data[..]);
        let header = ChunkHeader::read(&mut stream).unwrap();
        assert_eq!(header.ident, Ident::INFO);
        assert_eq!(header.raw_size(), 3);

        header.skip_to(0, &mut stream).unwrap();
        assert_eq!(stream.position(), 12);
        assert_eq!(header.payload(0, &data).unwrap(), &[1, 2, 3, 0]);

        let next = ChunkHeader::read(&mut stream).unwrap();
        assert_eq!(next.ident, Ident::DATA);
    }

    #[test]
    fn test_skip_past_end_is_malformed() {
        let mut data = Vec::new();
        data.extend_from_slice(b"data");
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&[0; 4]);

        let mut stream = MemStream::new(&data[..]);
        let header = ChunkHeader::read(&mut stream).unwrap();
        assert!(matches!(
            header.skip_to(0, &mut stream),
            Err(Error::MalformedChunk(_))
        ));
        assert_eq!(stream.position(), 8);
        assert!(header.payload(0, &data).is_err());
    }
}
