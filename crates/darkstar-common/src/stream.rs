//! Bounds-checked binary stream over an in-memory buffer.
//!
//! This module provides [`MemStream`], a cursor that reads and writes
//! little-endian data within a fixed-size buffer. Every access is checked
//! against the buffer size; a failed access leaves the position untouched.

use byteorder::{ByteOrder, LittleEndian};
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::{Error, Ident, Result};

/// A bounded read/write cursor over a byte buffer.
///
/// The backing store decides ownership: `MemStream<&[u8]>` borrows,
/// `MemStream<Vec<u8>>` owns the buffer and frees it on drop, and
/// `MemStream<&mut [u8]>` writes into a caller-provided buffer.
///
/// # Example
///
/// ```
/// use darkstar_common::MemStream;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut stream = MemStream::new(&data[..]);
///
/// assert_eq!(stream.read_u32().unwrap(), 0x04030201);
/// assert_eq!(stream.read_u32().unwrap(), 0x08070605);
/// assert!(stream.is_eof());
/// ```
#[derive(Debug, Clone)]
pub struct MemStream<B> {
    buf: B,
    position: usize,
}

impl<B: AsRef<[u8]>> MemStream<B> {
    /// Create a new stream positioned at the start of `buf`.
    #[inline]
    pub fn new(buf: B) -> Self {
        Self { buf, position: 0 }
    }

    /// Create a new stream starting at a specific position.
    ///
    /// A position past the end is clamped to the end.
    #[inline]
    pub fn new_at(buf: B, position: usize) -> Self {
        let position = position.min(buf.as_ref().len());
        Self { buf, position }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move to an absolute position.
    ///
    /// Positions past the end of the buffer are ignored and leave the
    /// cursor where it was.
    #[inline]
    pub fn set_position(&mut self, position: usize) {
        if position <= self.len() {
            self.position = position;
        }
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.as_ref().len()
    }

    /// Check whether the underlying buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of bytes remaining after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position)
    }

    /// Check if the cursor has reached the end of the buffer.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.position >= self.len()
    }

    /// Get the whole underlying buffer.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Get the bytes after the cursor.
    #[inline]
    pub fn remaining_bytes(&self) -> &[u8] {
        &self.buf.as_ref()[self.position.min(self.len())..]
    }

    /// Consume the stream and return its backing store.
    #[inline]
    pub fn into_inner(self) -> B {
        self.buf
    }

    #[inline]
    fn check(&self, count: usize) -> Result<usize> {
        let available = self.remaining();
        if count > available {
            return Err(Error::OutOfBounds {
                needed: count,
                available,
            });
        }
        Ok(self.position + count)
    }

    /// Advance the position by `count` bytes.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.position = self.check(count)?;
        Ok(())
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&[u8]> {
        let end = self.check(count)?;
        Ok(&self.buf.as_ref()[self.position..end])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8]> {
        let end = self.check(count)?;
        let start = self.position;
        self.position = end;
        Ok(&self.buf.as_ref()[start..end])
    }

    /// Fill `out` from the stream.
    #[inline]
    pub fn read_into(&mut self, out: &mut [u8]) -> Result<()> {
        let bytes = self.read_bytes(out.len())?;
        out.copy_from_slice(bytes);
        Ok(())
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(LittleEndian::read_u16)
    }

    /// Read a little-endian i16.
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_bytes(2).map(LittleEndian::read_i16)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(LittleEndian::read_u32)
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_bytes(4).map(LittleEndian::read_i32)
    }

    /// Read a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_bytes(4).map(LittleEndian::read_f32)
    }

    /// Read a four-character identifier.
    #[inline]
    pub fn read_ident(&mut self) -> Result<Ident> {
        self.read_struct()
    }

    /// Peek at the next identifier without advancing.
    #[inline]
    pub fn peek_ident(&self) -> Result<Ident> {
        let bytes = self.peek_bytes(4)?;
        Ok(Ident([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.peek_bytes(size)?;
        let value = T::read_from_bytes(bytes).map_err(|_| Error::OutOfBounds {
            needed: size,
            available: bytes.len(),
        })?;
        self.position += size;
        Ok(value)
    }

    /// Read a fixed-size array of plain values.
    #[inline]
    pub fn read_array<T: FromBytes, const N: usize>(&mut self) -> Result<[T; N]> {
        self.read_struct::<[T; N]>()
    }

    /// Read a string with a 16-bit length prefix.
    ///
    /// The payload is padded to a word boundary on disk; the padding is
    /// consumed and dropped. On failure the position is unchanged.
    pub fn read_sstring(&mut self) -> Result<String> {
        let start = self.position;
        let result = self.read_u16().and_then(|len| {
            let len = len as usize;
            let padded = (len + 1) & !1;
            self.read_bytes(padded).map(|bytes| decode_string(&bytes[..len]))
        });
        if result.is_err() {
            self.position = start;
        }
        result
    }

    /// Read a string with a 32-bit length prefix and no padding.
    ///
    /// On failure the position is unchanged.
    pub fn read_sstring32(&mut self) -> Result<String> {
        let start = self.position;
        let result = self.read_u32().and_then(|len| {
            self.read_bytes(len as usize).map(decode_string)
        });
        if result.is_err() {
            self.position = start;
        }
        result
    }

    /// Read a fixed-size, null-padded string field.
    pub fn read_fixed_string(&mut self, size: usize) -> Result<String> {
        self.read_bytes(size).map(decode_string)
    }

    /// Read a null-terminated string.
    pub fn read_cstring(&mut self) -> Result<&str> {
        let start = self.position.min(self.len());
        let remaining = &self.buf.as_ref()[start..];

        let null_pos = memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator)?;
        self.position = start + null_pos + 1;

        std::str::from_utf8(&remaining[..null_pos]).map_err(Error::Utf8)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> MemStream<B> {
    /// Get a mutable window of `count` bytes and advance past it.
    #[inline]
    fn slot(&mut self, count: usize) -> Result<&mut [u8]> {
        let end = self.check(count)?;
        let start = self.position;
        self.position = end;
        Ok(&mut self.buf.as_mut()[start..end])
    }

    /// Write raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.slot(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Write a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.slot(1)?[0] = value;
        Ok(())
    }

    /// Write a little-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        LittleEndian::write_u16(self.slot(2)?, value);
        Ok(())
    }

    /// Write a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        LittleEndian::write_u32(self.slot(4)?, value);
        Ok(())
    }

    /// Write a little-endian i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        LittleEndian::write_i32(self.slot(4)?, value);
        Ok(())
    }

    /// Write a little-endian f32.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        LittleEndian::write_f32(self.slot(4)?, value);
        Ok(())
    }

    /// Write a struct using zerocopy.
    #[inline]
    pub fn write_struct<T: IntoBytes + Immutable>(&mut self, value: &T) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Write a fixed-size array of plain values.
    #[inline]
    pub fn write_array<T: IntoBytes + Immutable, const N: usize>(
        &mut self,
        values: &[T; N],
    ) -> Result<()> {
        self.write_bytes(values.as_bytes())
    }

    /// Write a string with a 16-bit length prefix, zero-padded to a word
    /// boundary.
    ///
    /// Nothing is written unless the whole record fits.
    pub fn write_sstring(&mut self, value: &str) -> Result<()> {
        let len = u16::try_from(value.len()).map_err(|_| Error::StringTooLong(value.len()))?;
        let padded = (value.len() + 1) & !1;
        self.check(2 + padded)?;

        self.write_u16(len)?;
        let slot = self.slot(padded)?;
        slot[..value.len()].copy_from_slice(value.as_bytes());
        slot[value.len()..].fill(0);
        Ok(())
    }

    /// Write a string with a 32-bit length prefix and no padding.
    ///
    /// Nothing is written unless the whole record fits.
    pub fn write_sstring32(&mut self, value: &str) -> Result<()> {
        let len = u32::try_from(value.len()).map_err(|_| Error::StringTooLong(value.len()))?;
        self.check(4 + value.len())?;

        self.write_u32(len)?;
        self.write_bytes(value.as_bytes())
    }
}

/// Decode a stored string, stopping at the first null.
fn decode_string(bytes: &[u8]) -> String {
    let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
