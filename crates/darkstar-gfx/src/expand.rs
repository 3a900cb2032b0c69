//! Pixel expansion to RGBA.
//!
//! Paletted rows are looked up in a palette entry and their alpha scaled by
//! an [`AlphaRule`] chosen from the bitmap flags. Direct color rows gain an
//! opaque alpha channel. Destination rows may be padded to any stride at
//! least as wide as the expanded row.

use crate::bitmap::{Bitmap, BitmapFlags, ColorOrder, MipView};
use crate::palette::{Palette, PaletteEntry};
use crate::{Error, Result};

/// Alpha multiplier applied to palette alpha, saturating at 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaRule(pub u32);

impl AlphaRule {
    /// Any nonzero palette alpha becomes opaque.
    pub const TRANSPARENT: Self = Self(255);
    /// Palette alpha passes through unchanged.
    pub const TRANSLUCENT: Self = Self(1);
    /// Default rule for plain bitmaps.
    pub const OPAQUE: Self = Self(256);

    /// Pick the rule for a bitmap's flags.
    pub fn from_flags(flags: BitmapFlags) -> Self {
        if flags.contains(BitmapFlags::TRANSPARENT) {
            Self::TRANSPARENT
        } else if flags.intersects(BitmapFlags::TRANSLUCENT | BitmapFlags::ADDITIVE | BitmapFlags::SUBTRACTIVE) {
            Self::TRANSLUCENT
        } else {
            Self::OPAQUE
        }
    }

    #[inline]
    pub fn apply(self, alpha: u8) -> u8 {
        (alpha as u32).saturating_mul(self.0).min(255) as u8
    }
}

/// Options for [`Bitmap::expand_mip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Destination rows are padded to a multiple of this many bytes.
    /// Zero or one keeps rows tightly packed.
    pub row_alignment: usize,
    /// Palette entry to use instead of the bitmap's own index.
    pub palette_index: Option<i32>,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            row_alignment: 256,
            palette_index: None,
        }
    }
}

impl ExpandOptions {
    /// Options producing tightly packed rows.
    pub fn packed() -> Self {
        Self {
            row_alignment: 1,
            ..Self::default()
        }
    }
}

/// An expanded RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    /// Bytes per destination row, at least `width * 4`.
    pub stride: usize,
    pub data: Vec<u8>,
}

impl RgbaImage {
    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = y as usize * self.stride + x as usize * 4;
        let bytes = self.data.get(at..at + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Pixels without row padding.
    pub fn into_packed(self) -> Vec<u8> {
        let row = self.width as usize * 4;
        if self.stride == row {
            return self.data;
        }
        self.data
            .chunks(self.stride)
            .take(self.height as usize)
            .flat_map(|line| &line[..row])
            .copied()
            .collect()
    }
}

fn align_up(value: usize, alignment: usize) -> Option<usize> {
    if alignment <= 1 {
        return Some(value);
    }
    Some(value.checked_add(alignment - 1)? / alignment * alignment)
}

fn check_destination(rows: usize, row_bytes: usize, dst: &[u8], dst_stride: usize) -> Result<()> {
    if rows == 0 {
        return Ok(());
    }
    let needed = (rows - 1)
        .checked_mul(dst_stride)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or(Error::DestinationTooSmall {
            needed: usize::MAX,
            available: dst.len(),
        })?;
    if dst_stride < row_bytes || dst.len() < needed {
        return Err(Error::DestinationTooSmall {
            needed: needed.max(row_bytes),
            available: dst.len(),
        });
    }
    Ok(())
}

/// Copy `rows` rows of `row_bytes` bytes between buffers of different stride.
pub fn copy_rows(
    src: &[u8],
    src_stride: usize,
    row_bytes: usize,
    rows: usize,
    dst: &mut [u8],
    dst_stride: usize,
) -> Result<()> {
    check_destination(rows, row_bytes, dst, dst_stride)?;
    for y in 0..rows {
        let from = y * src_stride;
        let line = src.get(from..from + row_bytes).ok_or(darkstar_common::Error::OutOfBounds {
            needed: from + row_bytes,
            available: src.len(),
        })?;
        dst[y * dst_stride..y * dst_stride + row_bytes].copy_from_slice(line);
    }
    Ok(())
}

fn source_row<'a>(mip: &MipView<'a>, y: usize, row_bytes: usize) -> Result<&'a [u8]> {
    let from = y * mip.stride;
    mip.data.get(from..from + row_bytes).ok_or_else(|| {
        darkstar_common::Error::OutOfBounds {
            needed: from + row_bytes,
            available: mip.data.len(),
        }
        .into()
    })
}

/// Expand 8-bit indices through a palette entry.
pub fn expand_indexed(
    mip: &MipView<'_>,
    entry: &PaletteEntry,
    rule: AlphaRule,
    dst: &mut [u8],
    dst_stride: usize,
) -> Result<()> {
    let (width, height) = (mip.width as usize, mip.height as usize);
    check_destination(height, width * 4, dst, dst_stride)?;

    for y in 0..height {
        let src = source_row(mip, y, width)?;
        let out = &mut dst[y * dst_stride..y * dst_stride + width * 4];
        for (&index, pixel) in src.iter().zip(out.chunks_exact_mut(4)) {
            let [r, g, b, a] = entry.lookup_rgba(index);
            pixel.copy_from_slice(&[r, g, b, rule.apply(a)]);
        }
    }
    Ok(())
}

/// Expand 24-bit pixels to opaque RGBA.
pub fn expand_rgb24(mip: &MipView<'_>, order: ColorOrder, dst: &mut [u8], dst_stride: usize) -> Result<()> {
    let (width, height) = (mip.width as usize, mip.height as usize);
    check_destination(height, width * 4, dst, dst_stride)?;

    for y in 0..height {
        let src = source_row(mip, y, width * 3)?;
        let out = &mut dst[y * dst_stride..y * dst_stride + width * 4];
        for (rgb, pixel) in src.chunks_exact(3).zip(out.chunks_exact_mut(4)) {
            let (r, b) = match order {
                ColorOrder::Rgb => (rgb[0], rgb[2]),
                ColorOrder::Bgr => (rgb[2], rgb[0]),
            };
            pixel.copy_from_slice(&[r, rgb[1], b, 255]);
        }
    }
    Ok(())
}

impl Bitmap {
    /// Palette entry an 8-bit bitmap expands against.
    ///
    /// The bitmap's own palette wins over `default_palette`.
    pub fn palette_entry<'a>(&'a self, default_palette: Option<&'a Palette>, index: i32) -> Result<&'a PaletteEntry> {
        self.palette
            .as_deref()
            .or(default_palette)
            .and_then(|palette| palette.resolve_entry(index))
            .ok_or(Error::MissingPalette(index))
    }

    /// Expand mip `level` to RGBA.
    pub fn expand_mip(
        &self,
        level: usize,
        default_palette: Option<&Palette>,
        options: &ExpandOptions,
    ) -> Result<RgbaImage> {
        let mip = self.mip(level).ok_or(Error::MipOutOfRange {
            level,
            available: self.mip_levels(),
        })?;

        let dimensions = || Error::InvalidDimensions {
            width: mip.width as i64,
            height: mip.height as i64,
        };
        let stride = (mip.width as usize)
            .checked_mul(4)
            .and_then(|row| align_up(row, options.row_alignment))
            .ok_or_else(dimensions)?;
        let size = stride.checked_mul(mip.height as usize).ok_or_else(dimensions)?;
        let mut data = vec![0u8; size];

        match self.bit_depth {
            8 => {
                let index = options.palette_index.unwrap_or(self.palette_index);
                let entry = self.palette_entry(default_palette, index)?;
                expand_indexed(&mip, entry, AlphaRule::from_flags(self.flags), &mut data, stride)?;
            }
            24 => expand_rgb24(&mip, self.color_order, &mut data, stride)?,
            depth => return Err(Error::UnsupportedBitDepth(depth)),
        }

        Ok(RgbaImage {
            width: mip.width,
            height: mip.height,
            stride,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::palette::{PaletteType, COLORS};

    fn red_palette() -> Palette {
        let mut colors = [0u32; COLORS];
        colors[0] = 0xFF00_00FF;
        colors[1] = 0x4000_FF00;
        colors[2] = 0x0000_00FF;
        Palette::from_entry(PaletteEntry::new(0, PaletteType::NoRemap, colors))
    }

    fn indexed(width: u32, height: u32, flags: BitmapFlags, pixels: Vec<u8>) -> Bitmap {
        Bitmap {
            width,
            height,
            bit_depth: 8,
            flags,
            palette_index: 0,
            mips: vec![pixels],
            ..Bitmap::default()
        }
    }

    #[test]
    fn test_alpha_rules() {
        assert_eq!(AlphaRule::from_flags(BitmapFlags::TRANSPARENT), AlphaRule::TRANSPARENT);
        assert_eq!(AlphaRule::from_flags(BitmapFlags::ADDITIVE), AlphaRule::TRANSLUCENT);
        assert_eq!(AlphaRule::from_flags(BitmapFlags::FUZZY), AlphaRule::OPAQUE);

        assert_eq!(AlphaRule::TRANSPARENT.apply(0), 0);
        assert_eq!(AlphaRule::TRANSPARENT.apply(1), 255);
        assert_eq!(AlphaRule::TRANSLUCENT.apply(0x40), 0x40);
        assert_eq!(AlphaRule::OPAQUE.apply(1), 255);
        assert_eq!(AlphaRule::OPAQUE.apply(255), 255);
    }

    #[test]
    fn test_transparent_2x2() {
        let bitmap = indexed(2, 2, BitmapFlags::TRANSPARENT, vec![0; 8]);
        let palette = red_palette();

        let image = bitmap.expand_mip(0, Some(&palette), &ExpandOptions::default()).unwrap();
        assert_eq!(image.stride, 256);
        assert!(image.stride >= bitmap.stride());
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(image.pixel(x, y), Some([255, 0, 0, 255]));
            }
        }
        assert_eq!(image.into_packed(), [255u8, 0, 0, 255].repeat(4));
    }

    #[test]
    fn test_row_copy_matches_lookup() {
        // Width 3 leaves one padding byte per source row.
        let pixels = vec![0, 1, 2, 9, 2, 1, 0, 9];
        let palette = red_palette();
        let entry = &palette.entries[0];

        for flags in [BitmapFlags::NORMAL, BitmapFlags::TRANSLUCENT, BitmapFlags::TRANSPARENT] {
            let bitmap = indexed(3, 2, flags, pixels.clone());
            let rule = AlphaRule::from_flags(flags);
            let image = bitmap.expand_mip(0, Some(&palette), &ExpandOptions::packed()).unwrap();
            assert_eq!(image.stride, 12);

            for y in 0..2u32 {
                for x in 0..3u32 {
                    let [r, g, b, a] = entry.lookup_rgba(pixels[(y * 4 + x) as usize]);
                    assert_eq!(image.pixel(x, y), Some([r, g, b, rule.apply(a)]));
                }
            }
        }
    }

    #[test]
    fn test_embedded_palette_wins() {
        let mut colors = [0u32; COLORS];
        colors[0] = 0xFF00_FF00;
        let own = Palette::from_entry(PaletteEntry::new(-1, PaletteType::NoRemap, colors));

        let mut bitmap = indexed(1, 1, BitmapFlags::NORMAL, vec![0, 0, 0, 0]);
        bitmap.palette = Some(Arc::new(own));

        let image = bitmap.expand_mip(0, Some(&red_palette()), &ExpandOptions::packed()).unwrap();
        assert_eq!(image.data, [0, 255, 0, 255]);
    }

    #[test]
    fn test_missing_palette() {
        let bitmap = indexed(1, 1, BitmapFlags::NORMAL, vec![0; 4]);
        assert!(matches!(
            bitmap.expand_mip(0, None, &ExpandOptions::default()),
            Err(Error::MissingPalette(0))
        ));

        let forced = ExpandOptions {
            palette_index: Some(5),
            ..ExpandOptions::default()
        };
        assert!(matches!(
            bitmap.expand_mip(0, Some(&Palette::default()), &forced),
            Err(Error::MissingPalette(5))
        ));
    }

    #[test]
    fn test_rgb24_orders() {
        let mut bitmap = Bitmap {
            width: 2,
            height: 1,
            bit_depth: 24,
            mips: vec![vec![1, 2, 3, 4, 5, 6, 0, 0]],
            ..Bitmap::default()
        };
        let image = bitmap.expand_mip(0, None, &ExpandOptions::packed()).unwrap();
        assert_eq!(image.data, [1, 2, 3, 255, 4, 5, 6, 255]);

        bitmap.color_order = ColorOrder::Bgr;
        let image = bitmap.expand_mip(0, None, &ExpandOptions::packed()).unwrap();
        assert_eq!(image.data, [3, 2, 1, 255, 6, 5, 4, 255]);
    }

    #[test]
    fn test_mip_out_of_range() {
        let bitmap = indexed(1, 1, BitmapFlags::NORMAL, vec![0; 4]);
        assert!(matches!(
            bitmap.expand_mip(1, Some(&red_palette()), &ExpandOptions::default()),
            Err(Error::MipOutOfRange { level: 1, available: 1 })
        ));
    }

    #[test]
    fn test_copy_rows_strides() {
        let src = [1u8, 2, 0, 0, 3, 4, 0, 0];
        let mut dst = [0xEEu8; 10];
        copy_rows(&src, 4, 2, 2, &mut dst, 8).unwrap();
        assert_eq!(dst, [1, 2, 0xEE, 0xEE, 0xEE, 0xEE, 0xEE, 0xEE, 3, 4]);

        let mut small = [0u8; 5];
        assert!(matches!(
            copy_rows(&src, 4, 2, 2, &mut small, 4),
            Err(Error::DestinationTooSmall { needed: 6, available: 5 })
        ));
        let mut narrow = [0u8; 16];
        assert!(copy_rows(&src, 4, 2, 2, &mut narrow, 1).is_err());
    }
}
