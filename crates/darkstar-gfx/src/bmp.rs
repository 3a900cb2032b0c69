//! Embedded Windows bitmap files.

use std::sync::Arc;

use darkstar_common::{Ident, MemStream};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::bitmap::{row_stride, Bitmap, BitmapFlags, ColorOrder};
use crate::palette::{Palette, PaletteEntry, PaletteType, COLORS};
use crate::{Error, Result};

/// `BM` signature as a little-endian `u16`.
pub const BMP_SIGNATURE: u16 = 0x4D42;

/// Reserved-field marker flagging a palette index in `reserved2`.
pub const PALETTE_INDEX_MARKER: u16 = 0xF5F7;

/// `BITMAPFILEHEADER`.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BitmapFileHeader {
    /// File signature (`BM`).
    pub file_type: u16,
    /// Total file size.
    pub size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    /// Offset of the pixel rows from the start of the file.
    pub pixel_offset: u32,
}

impl BitmapFileHeader {
    /// Palette index carried in the reserved fields, or -1.
    pub fn palette_index(&self) -> i32 {
        let (marker, index) = (self.reserved1, self.reserved2);
        if marker == PALETTE_INDEX_MARKER && index != 0xFFFF {
            index as i32
        } else {
            -1
        }
    }
}

/// `BITMAPINFOHEADER`.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BitmapInfoHeader {
    pub size: u32,
    pub width: i32,
    /// Row count; negative for top-down images.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

impl BitmapInfoHeader {
    /// Size of the structure on disk.
    pub const SIZE: u32 = 40;
}

/// Parse a Windows bitmap file starting at the stream position.
///
/// Only uncompressed 8-bit and 24-bit images are accepted. The color table
/// is converted to the engine's packed RGBA order; 24-bit rows stay BGR.
pub(crate) fn read_bmp(stream: &mut MemStream<&[u8]>) -> Result<Bitmap> {
    let base = stream.position();
    let file: BitmapFileHeader = stream.read_struct()?;
    if file.file_type != BMP_SIGNATURE {
        let mut signature = [0u8; 4];
        signature.copy_from_slice(&stream.as_slice()[base..base + 4]);
        return Err(darkstar_common::Error::UnknownFormat(Ident(signature)).into());
    }

    let info: BitmapInfoHeader = stream.read_struct()?;
    let (width, height, bit_count, compression) = (info.width, info.height, info.bit_count, info.compression);
    if width <= 0 || height == 0 {
        return Err(Error::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        });
    }
    if bit_count != 8 && bit_count != 24 {
        return Err(Error::UnsupportedBitDepth(bit_count as u32));
    }
    if compression != 0 {
        return Err(Error::malformed(format!("compressed bitmap (method {compression})")));
    }

    let header_size = info.size;
    if header_size > BitmapInfoHeader::SIZE {
        stream.skip((header_size - BitmapInfoHeader::SIZE) as usize)?;
    }

    let width = width as u32;
    let rows = height.unsigned_abs();
    let top_down = height < 0;

    let palette = if bit_count == 8 {
        let used = match info.colors_used {
            0 => COLORS,
            n => n as usize,
        };
        let kept = used.min(COLORS);
        let mut colors = [0u32; COLORS];
        for color in colors.iter_mut().take(kept) {
            let [b, g, r, a] = stream.read_array::<u8, 4>()?;
            *color = u32::from_le_bytes([r, g, b, a]);
        }
        stream.skip((used - kept) * 4)?;
        let entry = PaletteEntry::new(file.palette_index(), PaletteType::NoRemap, colors);
        Some(Arc::new(Palette::from_entry(entry)))
    } else {
        None
    };

    let pixel_offset = file.pixel_offset as usize;
    if pixel_offset != 0 {
        let target = base.saturating_add(pixel_offset);
        if target > stream.len() {
            return Err(Error::malformed("pixel offset past end of bitmap"));
        }
        stream.set_position(target);
    }

    let stride = row_stride(width, bit_count as u32)
        .ok_or(Error::InvalidDimensions { width: width as i64, height: rows as i64 })?;
    let size = stride
        .checked_mul(rows as usize)
        .ok_or(Error::InvalidDimensions { width: width as i64, height: rows as i64 })?;
    let source = stream.read_bytes(size)?;

    let pixels = if top_down {
        source.to_vec()
    } else {
        let mut pixels = Vec::with_capacity(size);
        for row in source.chunks_exact(stride).rev() {
            pixels.extend_from_slice(row);
        }
        pixels
    };

    Ok(Bitmap {
        width,
        height: rows,
        bit_depth: bit_count as u32,
        flags: BitmapFlags::NORMAL,
        palette_index: file.palette_index(),
        color_order: ColorOrder::Bgr,
        mips: vec![pixels],
        palette,
    })
}
