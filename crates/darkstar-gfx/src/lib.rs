//! Palette and bitmap resources for Darkstar engine assets.
//!
//! - [`Palette`]: Windows `RIFF` palettes, native `PPAL` palettes and
//!   multi-entry `PL98` palettes with their shading and blend tables
//! - [`Bitmap`]: native `PBMP` containers with up to 9 mip levels, and plain
//!   Windows `.bmp` files
//! - RGBA expansion of either depth with a configurable destination stride
//!
//! # Example
//!
//! ```no_run
//! use darkstar_gfx::{Bitmap, ExpandOptions, Palette};
//!
//! let palette = Palette::from_bytes(&std::fs::read("lush.ppl")?)?;
//! let bitmap = Bitmap::from_bytes(&std::fs::read("grass.bmp")?)?;
//!
//! let image = bitmap.expand_mip(0, Some(&palette), &ExpandOptions::packed())?;
//! println!("{}x{} stride {}", image.width, image.height, image.stride);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bitmap;
mod bmp;
mod error;
mod expand;
mod palette;

pub use bitmap::{row_stride, Bitmap, BitmapFlags, ColorOrder, MipView, MAX_MIPS};
pub use bmp::{BitmapFileHeader, BitmapInfoHeader, BMP_SIGNATURE, PALETTE_INDEX_MARKER};
pub use error::{Error, Result};
pub use expand::{copy_rows, expand_indexed, expand_rgb24, AlphaRule, ExpandOptions, RgbaImage};
pub use palette::{ChannelRemap, Palette, PaletteEntry, PaletteType, COLORS};

use darkstar_common::Ident;
use darkstar_persist::{PersistObject, Registry};

/// Register the tagged graphics types: `PPAL` and `PL98` palettes, `PBMP`
/// bitmaps.
pub fn register(registry: &mut Registry) {
    fn palette() -> Box<dyn PersistObject> {
        Box::<Palette>::default()
    }
    fn bitmap() -> Box<dyn PersistObject> {
        Box::<Bitmap>::default()
    }

    registry
        .register_tag(Ident::PPAL, palette)
        .register_tag(Ident::PL98, palette)
        .register_tag(Ident::PBMP, bitmap);
}

#[cfg(test)]
mod tests {
    use darkstar_common::MemStream;

    use super::*;
    use crate::bitmap::tests::{head, pbmp};
    use crate::palette::tests::chunk;

    #[test]
    fn test_registry_rebuilds_bitmap() {
        let mut registry = Registry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 3);

        let mut data = pbmp(&[head(4, 1, 8, 0, 1), chunk(b"data", &[4, 3, 2, 1])]);
        data.extend_from_slice(b"next");

        let mut stream = MemStream::new(&data[..]);
        let object = registry.create_from_stream(&mut stream).unwrap();
        let bitmap = object.downcast_ref::<Bitmap>().unwrap();
        assert_eq!(bitmap.mip(0).unwrap().data, &[4, 3, 2, 1]);
        assert_eq!(stream.remaining_bytes(), b"next");
    }

    #[test]
    fn test_registry_reports_bad_bitmap() {
        let mut registry = Registry::new();
        register(&mut registry);

        let data = pbmp(&[head(4, 1, 32, 0, 0)]);
        let mut stream = MemStream::new(&data[..]);
        let result = registry.create_from_stream(&mut stream);
        assert!(matches!(result, Err(darkstar_persist::Error::Read { class: "Bitmap", .. })));
        assert!(stream.is_eof());
    }
}
