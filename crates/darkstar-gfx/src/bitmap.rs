//! Bitmap resources.
//!
//! Native bitmaps are `PBMP` chunk containers holding a `head` chunk, an
//! optional mip count (`DETL`), palette index (`PiDX`) and embedded Windows
//! palette (`RIFF`), and the pixel rows of every mip level in `data`.
//! Windows `.bmp` files are accepted as well.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use darkstar_common::{ChunkHeader, Ident, MemStream};
use darkstar_persist::PersistObject;

use crate::bmp::read_bmp;
use crate::palette::Palette;
use crate::{Error, Result};

/// Most mip levels a bitmap can carry.
pub const MAX_MIPS: usize = 9;

/// Bytes per row for `width` pixels of `bit_depth` bits, padded to 4 bytes.
pub fn row_stride(width: u32, bit_depth: u32) -> Option<usize> {
    let bits = (width as usize).checked_mul(bit_depth as usize)?;
    Some(bits.checked_add(31)? / 32 * 4)
}

/// Bitmap rendering flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BitmapFlags(pub u32);

impl BitmapFlags {
    pub const NORMAL: Self = Self(0);
    pub const TRANSPARENT: Self = Self(0x1);
    pub const FUZZY: Self = Self(0x2);
    pub const TRANSLUCENT: Self = Self(0x4);
    pub const OWN_MEMORY: Self = Self(0x8);
    pub const ADDITIVE: Self = Self(0x10);
    pub const SUBTRACTIVE: Self = Self(0x20);
    pub const ALPHA8: Self = Self(0x40);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::TRANSPARENT, "TRANSPARENT"),
        (Self::FUZZY, "FUZZY"),
        (Self::TRANSLUCENT, "TRANSLUCENT"),
        (Self::OWN_MEMORY, "OWN_MEMORY"),
        (Self::ADDITIVE, "ADDITIVE"),
        (Self::SUBTRACTIVE, "SUBTRACTIVE"),
        (Self::ALPHA8, "ALPHA8"),
    ];

    /// Check whether any bit of `other` is set.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Check whether every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for BitmapFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for BitmapFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "BitmapFlags(NORMAL)")
        } else {
            write!(f, "BitmapFlags({})", names.join(" | "))
        }
    }
}

/// Channel order of direct color pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ColorOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Borrowed pixels of one mip level.
#[derive(Debug, Clone, Copy)]
pub struct MipView<'a> {
    pub level: usize,
    pub width: u32,
    pub height: u32,
    /// Bytes per source row.
    pub stride: usize,
    pub data: &'a [u8],
}

/// A parsed bitmap resource.
#[derive(Debug, Clone, Default)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Bits per pixel, 8 or 24.
    pub bit_depth: u32,
    pub flags: BitmapFlags,
    /// Palette entry index for 8-bit images; -1 when unassigned.
    pub palette_index: i32,
    pub color_order: ColorOrder,
    pub(crate) mips: Vec<Vec<u8>>,
    /// Palette stored inside the bitmap container, if any.
    pub palette: Option<Arc<Palette>>,
}

/// Fields of the native `head` chunk.
struct NativeHead {
    width: u32,
    height: u32,
    bit_depth: u32,
    flags: u32,
}

impl Bitmap {
    /// Registered name of the bitmap type.
    pub const CLASS_NAME: &'static str = "Bitmap";

    /// Parse a bitmap from a complete buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read(&mut MemStream::new(data))
    }

    /// Parse a native or Windows bitmap starting at the stream position.
    pub fn read(stream: &mut MemStream<&[u8]>) -> Result<Self> {
        if stream.peek_ident()?.starts_with(b"BM") {
            return Self::read_embedded(stream);
        }

        let start = stream.position();
        let header = ChunkHeader::read(stream)?;
        if header.ident != Ident::PBMP {
            return Err(darkstar_common::Error::UnknownFormat(header.ident).into());
        }
        let end = header
            .end_position(start)
            .unwrap_or(usize::MAX)
            .min(stream.len());
        Self::read_native(stream, end)
    }

    /// Parse a Windows `.bmp` file starting at the stream position.
    ///
    /// Only uncompressed 8-bit and 24-bit images are accepted.
    pub fn read_embedded(stream: &mut MemStream<&[u8]>) -> Result<Self> {
        read_bmp(stream)
    }

    fn read_native(stream: &mut MemStream<&[u8]>, end: usize) -> Result<Self> {
        let mut expected_chunks = u32::MAX - 1;
        let mut head = None;
        let mut mip_levels = 1;
        let mut palette_index = -1;
        let mut palette = None;
        let mut pixels = Vec::new();

        while stream.position() + ChunkHeader::SIZE <= end && expected_chunks != 0 {
            let chunk_start = stream.position();
            let chunk = ChunkHeader::read(stream)?;
            expected_chunks -= 1;

            match chunk.ident {
                Ident::HEAD => {
                    let version = stream.read_u32()?;
                    if version >> 24 != 0 {
                        return Err(Error::malformed(format!("unsupported bitmap version {version:#x}")));
                    }
                    expected_chunks = version & 0x00FF_FFFF;
                    head = Some(NativeHead {
                        width: stream.read_u32()?,
                        height: stream.read_u32()?,
                        bit_depth: stream.read_u32()?,
                        flags: stream.read_u32()?,
                    });
                }
                Ident::DETL => mip_levels = stream.read_u32()?,
                Ident::PIDX => palette_index = stream.read_i32()?,
                Ident::DATA => {
                    pixels.extend_from_slice(chunk.payload(chunk_start, stream.as_slice())?);
                }
                Ident::RIFF => {
                    stream.set_position(chunk_start);
                    palette = Some(Arc::new(Palette::read_riff(stream)?));
                }
                other => log::debug!("skipping {other} chunk in PBMP"),
            }
            chunk.skip_to(chunk_start, stream)?;
        }

        let head = head.ok_or_else(|| Error::malformed("PBMP without head chunk"))?;
        if head.bit_depth != 8 && head.bit_depth != 24 {
            return Err(Error::UnsupportedBitDepth(head.bit_depth));
        }
        if head.width == 0 || head.height == 0 {
            return Err(Error::InvalidDimensions {
                width: head.width as i64,
                height: head.height as i64,
            });
        }
        if mip_levels == 0 || mip_levels as usize > MAX_MIPS {
            return Err(Error::InvalidMipCount(mip_levels));
        }

        let mut bitmap = Self {
            width: head.width,
            height: head.height,
            bit_depth: head.bit_depth,
            flags: BitmapFlags(head.flags),
            palette_index,
            color_order: ColorOrder::Rgb,
            mips: Vec::with_capacity(mip_levels as usize),
            palette,
        };
        bitmap.split_mips(&pixels, mip_levels as usize)?;
        Ok(bitmap)
    }

    /// Dimensions of mip `level`.
    pub fn mip_size(&self, level: usize) -> (u32, u32) {
        let shift = level.min(31) as u32;
        ((self.width >> shift).max(1), (self.height >> shift).max(1))
    }

    /// Bytes per row of mip `level`.
    pub fn mip_stride(&self, level: usize) -> Option<usize> {
        row_stride(self.mip_size(level).0, self.bit_depth)
    }

    fn split_mips(&mut self, pixels: &[u8], levels: usize) -> Result<()> {
        let mut offset = 0usize;
        for level in 0..levels {
            let (_, height) = self.mip_size(level);
            let size = self
                .mip_stride(level)
                .and_then(|stride| stride.checked_mul(height as usize))
                .ok_or(Error::InvalidDimensions {
                    width: self.width as i64,
                    height: self.height as i64,
                })?;
            let next = offset.checked_add(size).filter(|&next| next <= pixels.len()).ok_or_else(|| {
                Error::malformed(format!(
                    "pixel data holds {} bytes, mip {level} needs {} more at offset {offset}",
                    pixels.len(),
                    size
                ))
            })?;
            self.mips.push(pixels[offset..next].to_vec());
            offset = next;
        }
        if offset < pixels.len() {
            log::trace!("{} trailing pixel bytes ignored", pixels.len() - offset);
        }
        Ok(())
    }

    /// Number of mip levels present.
    pub fn mip_levels(&self) -> usize {
        self.mips.len()
    }

    /// Bytes per row of the base level.
    pub fn stride(&self) -> usize {
        self.mip_stride(0).unwrap_or(0)
    }

    /// Borrow the pixels of mip `level`.
    pub fn mip(&self, level: usize) -> Option<MipView<'_>> {
        let data = self.mips.get(level)?;
        let (width, height) = self.mip_size(level);
        Some(MipView {
            level,
            width,
            height,
            stride: self.mip_stride(level)?,
            data,
        })
    }

    /// Iterate over all mip levels, largest first.
    pub fn mips(&self) -> impl Iterator<Item = MipView<'_>> {
        (0..self.mip_levels()).filter_map(|level| self.mip(level))
    }
}

impl PersistObject for Bitmap {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn read(&mut self, stream: &mut MemStream<&[u8]>, _version: u32) -> darkstar_persist::Result<()> {
        // Bitmaps parse their own container header.
        let start = stream.position().saturating_sub(ChunkHeader::SIZE);
        stream.set_position(start);
        *self = Bitmap::read(stream).map_err(|e| darkstar_persist::Error::read(Self::CLASS_NAME, e))?;
        Ok(())
    }
}
