//! Volume archive reader for Darkstar game files.
//!
//! Tribes and its siblings ship their assets in `PVOL` volumes: a string
//! table, an index of 17-byte records and one `VBLK` block per file. Entries
//! are stored raw or LZH-compressed.
//!
//! # Example
//!
//! ```no_run
//! use darkstar_vol::Volume;
//!
//! let volume = Volume::open("Entities.vol")?;
//! for entry in volume.enumerate(Some("bmp")) {
//!     println!("{}: {} bytes ({})", entry.name, entry.size, entry.compression);
//! }
//! let palette = volume.read_file("lush.ppl")?;
//! # Ok::<(), darkstar_vol::Error>(())
//! ```

mod entry;
mod error;
mod resource;
mod volume;

pub use entry::{Compression, RawEntry, VolumeEntry};
pub use error::{Error, Result};
pub use resource::{FoundFile, ResourceManager};
pub use volume::Volume;
