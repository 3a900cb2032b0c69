//! Darkstar - asset loading for Tribes-era Darkstar engine games.
//!
//! This crate provides a unified interface to the Darkstar library ecosystem.
//!
//! # Crates
//!
//! - [`darkstar_common`] - Bounded binary streams, identifiers, chunk headers
//! - [`darkstar_lzh`] - Adaptive Huffman LZ codec
//! - [`darkstar_persist`] - Persisted object registry
//! - [`darkstar_gfx`] - Palettes, bitmaps and RGBA expansion
//! - [`darkstar_vol`] - `PVOL` volume archives
//!
//! # Example
//!
//! ```no_run
//! use darkstar::prelude::*;
//!
//! let registry = darkstar::init()?;
//!
//! let volume = Volume::open("Entities.vol")?;
//! let data = volume.read_file("lush.ppl")?;
//! let object = registry.create_from_stream(&mut MemStream::new(&data[..]))?;
//! if let Some(palette) = object.downcast_ref::<Palette>() {
//!     println!("{} palette entries", palette.entries.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use darkstar_common as common;
pub use darkstar_gfx as gfx;
pub use darkstar_lzh as lzh;
pub use darkstar_persist as persist;
pub use darkstar_vol as vol;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use darkstar_common::{ChunkHeader, Ident, MemStream};
    pub use darkstar_gfx::{Bitmap, BitmapFlags, ExpandOptions, Palette, PaletteEntry, PaletteType, RgbaImage};
    pub use darkstar_persist::{MaterialList, PersistObject, Registry};
    pub use darkstar_vol::{ResourceManager, Volume, VolumeEntry};
}

use darkstar_persist::{MaterialList, Registry};

/// A registry holding every persisted type this library reads.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    MaterialList::register(&mut registry);
    darkstar_gfx::register(&mut registry);
    registry
}

/// Install [`registry`] as the process-wide registry.
///
/// Call once before parsing; later calls fail with
/// [`darkstar_persist::Error::AlreadyInstalled`].
pub fn init() -> darkstar_persist::Result<&'static Registry> {
    registry().install()
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_registry_knows_all_types() {
        let registry = registry();
        assert_eq!(registry.len(), 4);
        assert!(registry.create_by_name(MaterialList::CLASS_NAME).is_some());
        for tag in [Ident::PPAL, Ident::PL98] {
            assert!(registry.create_by_tag(tag).unwrap().is::<Palette>());
        }
        assert!(registry.create_by_tag(Ident::PBMP).unwrap().is::<Bitmap>());
        assert!(registry.create_by_tag(Ident::RIFF).is_none());
    }

    #[test]
    fn test_init_once() {
        let installed = init().unwrap();
        assert_eq!(installed.len(), 4);
        assert!(persist::global().is_some());
        assert!(matches!(init(), Err(persist::Error::AlreadyInstalled)));
    }
}
