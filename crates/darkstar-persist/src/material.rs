//! Shape material lists (`TS::MaterialList`).

use darkstar_common::MemStream;

use crate::{PersistObject, Registry, Result};

/// Low nibble of [`Material::flags`]: how the material is colored.
pub const FLAG_SOURCE_MASK: u32 = 0xF;
/// Shading mode bits of [`Material::flags`].
pub const FLAG_SHADING_MASK: u32 = 0xF00;
/// Texture mode bits of [`Material::flags`].
pub const FLAG_TEXTURE_MASK: u32 = 0xF000;

/// Where a material takes its color from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MaterialSource {
    Null,
    Palette,
    Rgb,
    Texture,
    Other(u32),
}

/// One material entry.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Material {
    pub flags: u32,
    pub alpha: f32,
    pub index: u32,
    /// Red, green, blue and one byte of padding.
    pub rgb: [u8; 4],
    pub file_name: String,
    /// Surface type used by game scripts.
    pub kind: u32,
    pub elasticity: f32,
    pub friction: f32,
    pub use_default_props: u32,
}

impl Material {
    const NAME_SIZE_V1: usize = 16;
    const NAME_SIZE_V2: usize = 32;

    /// Read one material in the layout of list `version`.
    pub fn read(stream: &mut MemStream<&[u8]>, version: u32) -> Result<Self> {
        let flags = stream.read_u32()?;
        let alpha = stream.read_f32()?;
        let index = stream.read_u32()?;
        let rgb = stream.read_array::<u8, 4>()?;

        let name_size = if version < 2 {
            Self::NAME_SIZE_V1
        } else {
            Self::NAME_SIZE_V2
        };
        let file_name = stream.read_fixed_string(name_size)?;

        let mut material = Self {
            flags,
            alpha,
            index,
            rgb,
            file_name,
            ..Self::default()
        };

        // Versions 1 and 3+ carry surface properties; 2 and 3 lack the
        // default-props switch and always use defaults.
        if version == 1 || version > 2 {
            material.kind = stream.read_u32()?;
            material.elasticity = stream.read_f32()?;
            material.friction = stream.read_f32()?;
        }
        material.use_default_props = if version == 2 || version == 3 {
            1
        } else {
            stream.read_u32()?
        };

        Ok(material)
    }

    /// Color source selected by the flags.
    pub fn source(&self) -> MaterialSource {
        match self.flags & FLAG_SOURCE_MASK {
            0 => MaterialSource::Null,
            1 => MaterialSource::Palette,
            2 => MaterialSource::Rgb,
            3 => MaterialSource::Texture,
            other => MaterialSource::Other(other),
        }
    }
}

/// Materials of a shape, `details × count` entries in detail-major order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MaterialList {
    pub num_details: u32,
    pub materials: Vec<Material>,
}

impl MaterialList {
    /// Registered class name.
    pub const CLASS_NAME: &'static str = "TS::MaterialList";

    /// Register the `TS::MaterialList` constructor.
    pub fn register(registry: &mut Registry) {
        registry.register_name(Self::CLASS_NAME, || Box::new(Self::default()) as Box<dyn PersistObject>);
    }

    /// Materials per detail level.
    pub fn per_detail(&self) -> usize {
        match self.num_details {
            0 => 0,
            n => self.materials.len() / n as usize,
        }
    }

    /// Materials for one detail level.
    pub fn detail(&self, level: usize) -> Option<&[Material]> {
        let count = self.per_detail();
        let start = level.checked_mul(count)?;
        self.materials.get(start..start.checked_add(count)?)
    }
}

impl PersistObject for MaterialList {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn read(&mut self, stream: &mut MemStream<&[u8]>, version: u32) -> Result<()> {
        self.num_details = stream.read_u32()?;
        let count = stream.read_u32()?;
        let total = (count as usize)
            .checked_mul(self.num_details as usize)
            .ok_or_else(|| darkstar_common::Error::malformed("material count overflows"))?;

        // Every material needs at least 32 bytes; refuse counts the
        // remaining buffer cannot hold before allocating.
        if total.saturating_mul(32) > stream.remaining() {
            return Err(darkstar_common::Error::OutOfBounds {
                needed: total.saturating_mul(32),
                available: stream.remaining(),
            }
            .into());
        }

        self.materials = (0..total)
            .map(|_| Material::read(stream, version))
            .collect::<Result<_>>()?;
        Ok(())
    }
}
