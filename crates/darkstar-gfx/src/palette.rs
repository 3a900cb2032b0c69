//! Palette resources.
//!
//! Three container formats carry palettes:
//!
//! - `RIFF`/`PAL `: a standard Windows palette with a single entry
//! - `PPAL`: one 256-color entry plus optional shade/haze/translucency chunks
//! - `PL98`: several typed entries sharing one remap table blob
//!
//! Colors are packed `u32` values with red in the low byte, then green, blue
//! and alpha.

use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use darkstar_common::{ChunkHeader, Ident, MemStream};
use darkstar_persist::PersistObject;

use crate::{Error, Result};

/// Number of colors in every palette entry.
pub const COLORS: usize = 256;

/// Bytes of one packed color table.
const COLOR_TABLE_SIZE: usize = COLORS * 4;

/// Bytes of a channel remap: 256 indices plus four 256-entry f32 tables.
const CHANNEL_REMAP_SIZE: usize = COLORS + 4 * COLORS * 4;

/// Bytes of one `PL98` entry record: colors, index and type.
const PL98_ENTRY_SIZE: usize = COLOR_TABLE_SIZE + 8;

/// What a palette entry is used for, and which remap tables it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PaletteType {
    NoRemap,
    ShadeHaze,
    Translucent,
    ColorQuant,
    AlphaQuant,
    AdditiveQuant,
    Additive,
    SubtractiveQuant,
    Subtractive,
}

impl PaletteType {
    /// Decode a stored type value.
    pub fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::NoRemap,
            1 => Self::ShadeHaze,
            2 => Self::Translucent,
            3 => Self::ColorQuant,
            4 => Self::AlphaQuant,
            5 => Self::AdditiveQuant,
            6 => Self::Additive,
            7 => Self::SubtractiveQuant,
            8 => Self::Subtractive,
            _ => return None,
        })
    }

    /// Whether entries of this type carry a 64 KiB blend table.
    pub fn has_blend_table(self) -> bool {
        matches!(self, Self::Translucent | Self::Additive | Self::Subtractive)
    }

    /// Whether entries of this type carry channel remap tables.
    pub fn has_channel_remap(self) -> bool {
        matches!(self, Self::NoRemap | Self::ShadeHaze) || self.has_blend_table()
    }
}

/// Per-channel remap tables of a palette entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRemap {
    pub index: [u8; COLORS],
    pub red: [f32; COLORS],
    pub green: [f32; COLORS],
    pub blue: [f32; COLORS],
    pub alpha: [f32; COLORS],
}

impl ChannelRemap {
    fn parse(bytes: &[u8]) -> Self {
        let mut remap = Self {
            index: [0; COLORS],
            red: [0.0; COLORS],
            green: [0.0; COLORS],
            blue: [0.0; COLORS],
            alpha: [0.0; COLORS],
        };
        remap.index.copy_from_slice(&bytes[..COLORS]);
        let floats = &bytes[COLORS..CHANNEL_REMAP_SIZE];
        let table = COLORS * 4;
        LittleEndian::read_f32_into(&floats[..table], &mut remap.red);
        LittleEndian::read_f32_into(&floats[table..2 * table], &mut remap.green);
        LittleEndian::read_f32_into(&floats[2 * table..3 * table], &mut remap.blue);
        LittleEndian::read_f32_into(&floats[3 * table..], &mut remap.alpha);
        remap
    }
}

/// Locations of an entry's tables inside [`Palette::remap_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RemapTables {
    shade: Option<Range<usize>>,
    haze: Option<Range<usize>>,
    blend: Option<Range<usize>>,
    remap: Option<Range<usize>>,
    channel: Option<Range<usize>>,
}

/// One 256-color table of a palette.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    /// Index bitmaps use to select this entry; -1 when unassigned.
    pub index: i32,
    pub kind: PaletteType,
    pub colors: [u32; COLORS],
    tables: RemapTables,
}

impl PaletteEntry {
    /// Create an entry with the given colors and no remap tables.
    pub fn new(index: i32, kind: PaletteType, colors: [u32; COLORS]) -> Self {
        Self {
            index,
            kind,
            colors,
            tables: RemapTables::default(),
        }
    }

    /// Color at `idx` as `[r, g, b]`.
    #[inline]
    pub fn lookup_rgb(&self, idx: u8) -> [u8; 3] {
        let [r, g, b, _] = self.lookup_rgba(idx);
        [r, g, b]
    }

    /// Color at `idx` as `[r, g, b, a]`.
    #[inline]
    pub fn lookup_rgba(&self, idx: u8) -> [u8; 4] {
        self.colors[idx as usize].to_le_bytes()
    }
}

fn read_colors(stream: &mut MemStream<&[u8]>) -> Result<[u32; COLORS]> {
    let mut colors = [0u32; COLORS];
    LittleEndian::read_u32_into(stream.read_bytes(COLOR_TABLE_SIZE)?, &mut colors);
    Ok(colors)
}

/// A parsed palette resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    pub shade_shift: i32,
    pub shade_levels: i32,
    pub haze_levels: i32,
    pub haze_color: i32,
    pub allowed_matches: [u8; 32],
    /// Color matching weights; empty unless the file stores them.
    pub color_weights: Vec<f32>,
    pub weight_start: u32,
    pub weight_end: u32,
    pub entries: Vec<PaletteEntry>,
    remap_data: Vec<u8>,
}

impl Palette {
    /// Registered name of the palette type.
    pub const CLASS_NAME: &'static str = "Palette";

    /// Largest accepted shade shift.
    const MAX_SHADE_SHIFT: i32 = 8;

    /// Build a palette holding a single entry.
    pub fn from_entry(entry: PaletteEntry) -> Self {
        Self {
            entries: vec![entry],
            ..Self::default()
        }
    }

    /// Parse a palette from a complete buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read(&mut MemStream::new(data))
    }

    /// Parse a palette starting at the stream position.
    ///
    /// The format is chosen by the leading chunk identifier.
    pub fn read(stream: &mut MemStream<&[u8]>) -> Result<Self> {
        let start = stream.position();
        let header = ChunkHeader::read(stream)?;
        match header.ident {
            Ident::RIFF => {
                stream.set_position(start);
                Self::read_riff(stream)
            }
            Ident::PPAL => Self::read_ppal(stream, start, header),
            Ident::PL98 => Self::read_pl98(stream, header),
            other => Err(darkstar_common::Error::UnknownFormat(other).into()),
        }
    }

    /// Parse a Windows `RIFF` palette starting at the stream position.
    pub fn read_riff(stream: &mut MemStream<&[u8]>) -> Result<Self> {
        let start = stream.position();
        let riff = ChunkHeader::read(stream)?;
        if riff.ident != Ident::RIFF {
            return Err(darkstar_common::Error::UnknownFormat(riff.ident).into());
        }
        let form = stream.read_ident()?;
        if form != Ident::PAL {
            return Err(darkstar_common::Error::UnknownFormat(form).into());
        }

        let end = riff
            .end_position(start)
            .unwrap_or(usize::MAX)
            .min(stream.len());
        let mut palette = None;

        while stream.position() + ChunkHeader::SIZE <= end {
            let chunk_start = stream.position();
            let chunk = ChunkHeader::read(stream)?;
            if chunk.ident == Ident::DATA && palette.is_none() {
                let _version = stream.read_u16()?;
                let count = stream.read_u16()? as usize;

                let mut colors = [0u32; COLORS];
                let kept = count.min(COLORS);
                LittleEndian::read_u32_into(stream.read_bytes(kept * 4)?, &mut colors[..kept]);
                if count > COLORS {
                    log::debug!("RIFF palette has {count} colors, keeping {COLORS}");
                }

                palette = Some(Self::from_entry(PaletteEntry::new(-1, PaletteType::NoRemap, colors)));
            } else {
                log::trace!("skipping {} chunk in RIFF palette", chunk.ident);
            }
            chunk.skip_to(chunk_start, stream)?;
        }

        stream.set_position(end);
        palette.ok_or_else(|| Error::malformed("RIFF palette without data chunk"))
    }

    fn read_ppal(stream: &mut MemStream<&[u8]>, start: usize, header: ChunkHeader) -> Result<Self> {
        let end = header
            .end_position(start)
            .unwrap_or(usize::MAX)
            .min(stream.len());

        let head_start = stream.position();
        let head = ChunkHeader::read(stream)?;
        if head.ident != Ident::HEAD {
            return Err(Error::malformed(format!("PPAL starts with {} instead of head", head.ident)));
        }
        let version = stream.read_u8()?;
        if version != 3 && version != 7 {
            return Err(Error::malformed(format!("unsupported PPAL version {version}")));
        }
        let _reserved = stream.read_u16()?;
        let shade_shift = stream.read_u8()? as i32;
        head.skip_to(head_start, stream)?;

        let mut palette = Self::default();
        palette.set_shading(shade_shift, 0)?;

        while stream.position() + ChunkHeader::SIZE <= end {
            let chunk_start = stream.position();
            let chunk = ChunkHeader::read(stream)?;
            match chunk.ident {
                Ident::DATA => {
                    let colors = read_colors(stream)?;
                    palette
                        .entries
                        .push(PaletteEntry::new(-1, PaletteType::NoRemap, colors));
                }
                Ident::PSPL | Ident::HZPL | Ident::PTPL => {
                    let table = chunk.payload(chunk_start, stream.as_slice())?;
                    palette.attach_table(chunk.ident, table);
                }
                Ident::INFO => {}
                other => log::debug!("skipping {other} chunk in PPAL"),
            }
            chunk.skip_to(chunk_start, stream)?;
        }

        if palette.entries.is_empty() {
            return Err(Error::malformed("PPAL without data chunk"));
        }
        stream.set_position(end);
        Ok(palette)
    }

    /// Store a standalone remap chunk against the most recent entry.
    fn attach_table(&mut self, ident: Ident, table: &[u8]) {
        let start = self.remap_data.len();
        let Some(entry) = self.entries.last_mut() else {
            log::debug!("dropping {ident} chunk that precedes any palette data");
            return;
        };
        self.remap_data.extend_from_slice(table);
        let range = Some(start..self.remap_data.len());
        match ident {
            Ident::PSPL => entry.tables.shade = range,
            Ident::HZPL => entry.tables.haze = range,
            _ => entry.tables.blend = range,
        }
    }

    fn read_pl98(stream: &mut MemStream<&[u8]>, header: ChunkHeader) -> Result<Self> {
        let count = header.raw_size() as usize;

        let mut palette = Self::default();
        let shade_shift = stream.read_i32()?;
        let haze_levels = stream.read_i32()?;
        palette.set_shading(shade_shift, haze_levels)?;
        palette.haze_color = stream.read_i32()?;
        palette.allowed_matches = stream.read_array::<u8, 32>()?;

        let needed = count.saturating_mul(PL98_ENTRY_SIZE);
        if needed > stream.remaining() {
            return Err(darkstar_common::Error::OutOfBounds {
                needed,
                available: stream.remaining(),
            }
            .into());
        }

        let mut lookup_size = 0usize;
        for _ in 0..count {
            let colors = read_colors(stream)?;
            let index = stream.read_i32()?;
            let raw = stream.read_u32()?;
            let kind = PaletteType::from_raw(raw)
                .ok_or_else(|| Error::malformed(format!("unknown palette type {raw}")))?;
            lookup_size = palette
                .lookup_size(kind)
                .and_then(|size| lookup_size.checked_add(size))
                .ok_or_else(|| Error::malformed("remap table size overflows"))?;
            palette.entries.push(PaletteEntry::new(index, kind, colors));
        }

        palette.remap_data = stream.read_bytes(lookup_size)?.to_vec();
        palette.assign_tables();

        if stream.read_u8()? != 0 {
            let mut weights = vec![0f32; COLORS];
            LittleEndian::read_f32_into(stream.read_bytes(COLORS * 4)?, &mut weights);
            palette.color_weights = weights;
            palette.weight_start = stream.read_u32()?;
            palette.weight_end = stream.read_u32()?;
        }

        if stream.read_u32().is_err() {
            log::warn!("PL98 palette is missing its trailing word");
        }
        Ok(palette)
    }

    fn set_shading(&mut self, shade_shift: i32, haze_levels: i32) -> Result<()> {
        if !(0..=Self::MAX_SHADE_SHIFT).contains(&shade_shift) {
            return Err(Error::malformed(format!("shade shift {shade_shift} out of range")));
        }
        if !(0..=COLORS as i32).contains(&haze_levels) {
            return Err(Error::malformed(format!("haze level count {haze_levels} out of range")));
        }
        self.shade_shift = shade_shift;
        self.shade_levels = 1 << shade_shift;
        self.haze_levels = haze_levels;
        Ok(())
    }

    /// Bytes of remap data an entry of `kind` owns in a `PL98` blob.
    pub fn lookup_size(&self, kind: PaletteType) -> Option<usize> {
        let shade = usize::try_from(self.shade_levels).ok()?;
        let haze = usize::try_from(self.haze_levels).ok()?;
        match kind {
            PaletteType::ShadeHaze => COLORS
                .checked_mul(shade)?
                .checked_mul(haze + 1)?
                .checked_add(CHANNEL_REMAP_SIZE),
            kind if kind.has_blend_table() => Some(COLORS * COLORS + CHANNEL_REMAP_SIZE),
            PaletteType::NoRemap => Some(COLORS + CHANNEL_REMAP_SIZE),
            _ => Some(0),
        }
    }

    /// Partition the `PL98` remap blob among the entries.
    ///
    /// Layout: haze then shade maps or blend tables per entry, then channel
    /// remaps for shade/blend entries, then remap table and channel remap
    /// for each `NoRemap` entry.
    fn assign_tables(&mut self) {
        let shade_size = COLORS * self.shade_levels as usize;
        let haze_size = shade_size * self.haze_levels as usize;
        let mut offset = 0;
        let mut take = |size: usize| {
            let range = offset..offset + size;
            offset += size;
            Some(range)
        };

        for entry in &mut self.entries {
            if entry.kind == PaletteType::ShadeHaze {
                entry.tables.haze = take(haze_size);
                entry.tables.shade = take(shade_size);
            } else if entry.kind.has_blend_table() {
                entry.tables.blend = take(COLORS * COLORS);
            }
        }
        for entry in &mut self.entries {
            if entry.kind.has_channel_remap() && entry.kind != PaletteType::NoRemap {
                entry.tables.channel = take(CHANNEL_REMAP_SIZE);
            }
        }
        for entry in &mut self.entries {
            if entry.kind == PaletteType::NoRemap {
                entry.tables.remap = take(COLORS);
                entry.tables.channel = take(CHANNEL_REMAP_SIZE);
            }
        }
    }

    /// Raw remap table blob shared by all entries.
    pub fn remap_data(&self) -> &[u8] {
        &self.remap_data
    }

    fn table(&self, range: &Option<Range<usize>>) -> Option<&[u8]> {
        range.as_ref().and_then(|range| self.remap_data.get(range.clone()))
    }

    /// Shade map of an entry (`256 × shadeLevels` bytes).
    pub fn shade_map(&self, entry: &PaletteEntry) -> Option<&[u8]> {
        self.table(&entry.tables.shade)
    }

    /// Haze map of an entry.
    pub fn haze_map(&self, entry: &PaletteEntry) -> Option<&[u8]> {
        self.table(&entry.tables.haze)
    }

    /// Translucency, additive or subtractive blend table of an entry.
    pub fn blend_map(&self, entry: &PaletteEntry) -> Option<&[u8]> {
        self.table(&entry.tables.blend)
    }

    /// 256-byte color remap of a `NoRemap` entry.
    pub fn remap_table(&self, entry: &PaletteEntry) -> Option<&[u8]> {
        self.table(&entry.tables.remap)
    }

    /// Decoded channel remap tables of an entry.
    pub fn channel_remap(&self, entry: &PaletteEntry) -> Option<Box<ChannelRemap>> {
        self.table(&entry.tables.channel)
            .filter(|bytes| bytes.len() == CHANNEL_REMAP_SIZE)
            .map(|bytes| Box::new(ChannelRemap::parse(bytes)))
    }

    /// Entry whose index is exactly `index`.
    pub fn palette_by_index(&self, index: i32) -> Option<&PaletteEntry> {
        self.entries.iter().find(|entry| entry.index == index)
    }

    /// Entry for `index`, falling back to the first entry.
    ///
    /// Returns `None` only for a palette without entries.
    pub fn resolve_entry(&self, index: i32) -> Option<&PaletteEntry> {
        self.palette_by_index(index).or_else(|| {
            let first = self.entries.first();
            if first.is_some() {
                log::debug!("palette index {index} not found, using first entry");
            }
            first
        })
    }
}

impl PersistObject for Palette {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn read(&mut self, stream: &mut MemStream<&[u8]>, _version: u32) -> darkstar_persist::Result<()> {
        // Palettes parse their own container header.
        let start = stream.position().saturating_sub(ChunkHeader::SIZE);
        stream.set_position(start);
        *self = Palette::read(stream).map_err(|e| darkstar_persist::Error::read(Self::CLASS_NAME, e))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn chunk(ident: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(ident);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn color_bytes(first: u32) -> Vec<u8> {
        (0..COLORS as u32)
            .flat_map(|i| {
                let color = if i == 0 { first } else { i * 0x0001_0101 };
                color.to_le_bytes()
            })
            .collect()
    }

    /// Windows palette with `count` colors, red first.
    pub(crate) fn riff_palette(count: u16) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0x0300u16.to_le_bytes());
        data.extend_from_slice(&count.to_le_bytes());
        for i in 0..count as u32 {
            let color: u32 = if i == 0 { 0xFF00_00FF } else { i };
            data.extend_from_slice(&color.to_le_bytes());
        }

        let mut body = b"PAL ".to_vec();
        body.extend_from_slice(&chunk(b"data", &data));
        chunk(b"RIFF", &body)
    }

    #[test]
    fn test_lookup_rgba() {
        let mut colors = [0u32; COLORS];
        colors[7] = 0xFF00_00FF;
        let entry = PaletteEntry::new(0, PaletteType::NoRemap, colors);
        assert_eq!(entry.lookup_rgba(7), [255, 0, 0, 255]);
        assert_eq!(entry.lookup_rgb(7), [255, 0, 0]);
        assert_eq!(entry.lookup_rgba(0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_riff_palette() {
        let data = riff_palette(300);
        let palette = Palette::from_bytes(&data).unwrap();

        assert_eq!(palette.entries.len(), 1);
        let entry = &palette.entries[0];
        assert_eq!(entry.kind, PaletteType::NoRemap);
        assert_eq!(entry.lookup_rgba(0), [255, 0, 0, 255]);
        assert_eq!(entry.colors[255], 255);
    }

    #[test]
    fn test_riff_short_palette_zero_fills() {
        let palette = Palette::from_bytes(&riff_palette(16)).unwrap();
        assert_eq!(palette.entries[0].colors[15], 15);
        assert_eq!(palette.entries[0].colors[16], 0);
    }

    #[test]
    fn test_riff_wrong_form() {
        let mut body = b"WAVE".to_vec();
        body.extend_from_slice(&chunk(b"data", &[0; 4]));
        let data = chunk(b"RIFF", &body);
        assert!(matches!(
            Palette::from_bytes(&data),
            Err(Error::Common(darkstar_common::Error::UnknownFormat(_)))
        ));
    }

    fn ppal(version: u8, extra: &[Vec<u8>]) -> Vec<u8> {
        let mut body = chunk(b"head", &[version, 0, 0, 3]);
        body.extend_from_slice(&chunk(b"info", b"test"));
        body.extend_from_slice(&chunk(b"data", &color_bytes(0xFF00_00FF)));
        for part in extra {
            body.extend_from_slice(part);
        }
        chunk(b"PPAL", &body)
    }

    #[test]
    fn test_ppal() {
        let data = ppal(3, &[chunk(b"pspl", &[9; 2048]), chunk(b"junk", &[1, 2, 3])]);
        let palette = Palette::from_bytes(&data).unwrap();

        assert_eq!(palette.shade_shift, 3);
        assert_eq!(palette.shade_levels, 8);
        assert_eq!(palette.haze_levels, 0);

        let entry = &palette.entries[0];
        assert_eq!(entry.index, -1);
        assert_eq!(entry.lookup_rgba(0), [255, 0, 0, 255]);
        assert_eq!(palette.shade_map(entry).unwrap().len(), 2048);
        assert!(palette.haze_map(entry).is_none());
    }

    #[test]
    fn test_ppal_bad_version() {
        let data = ppal(4, &[]);
        assert!(matches!(
            Palette::from_bytes(&data),
            Err(Error::Common(darkstar_common::Error::MalformedChunk(_)))
        ));
    }

    fn pl98(entries: &[(i32, u32)], shade_shift: i32, haze_levels: i32, weights: bool) -> Vec<u8> {
        let mut palette = Palette::default();
        palette.set_shading(shade_shift, haze_levels).unwrap();

        let mut body = Vec::new();
        body.extend_from_slice(&shade_shift.to_le_bytes());
        body.extend_from_slice(&haze_levels.to_le_bytes());
        body.extend_from_slice(&0x00FF_FFFFi32.to_le_bytes());
        body.extend_from_slice(&[1; 32]);

        let mut lookup = 0;
        for &(index, kind) in entries {
            body.extend_from_slice(&color_bytes(index as u32));
            body.extend_from_slice(&index.to_le_bytes());
            body.extend_from_slice(&kind.to_le_bytes());
            lookup += palette.lookup_size(PaletteType::from_raw(kind).unwrap()).unwrap();
        }
        // Fill each byte of the blob with its offset so partitions are visible.
        body.extend((0..lookup).map(|i| (i / 256) as u8));
        body.push(weights as u8);
        if weights {
            for i in 0..COLORS {
                body.extend_from_slice(&(i as f32).to_le_bytes());
            }
            body.extend_from_slice(&10u32.to_le_bytes());
            body.extend_from_slice(&20u32.to_le_bytes());
        }
        body.extend_from_slice(&0u32.to_le_bytes());

        let mut out = b"PL98".to_vec();
        out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn test_lookup_sizes() {
        let mut palette = Palette::default();
        palette.set_shading(4, 2).unwrap();
        let base = 256 + 4 * 1024;
        assert_eq!(palette.lookup_size(PaletteType::ShadeHaze), Some(256 * 16 * 3 + base));
        assert_eq!(palette.lookup_size(PaletteType::Additive), Some(65536 + base));
        assert_eq!(palette.lookup_size(PaletteType::NoRemap), Some(256 + base));
        assert_eq!(palette.lookup_size(PaletteType::ColorQuant), Some(0));
    }

    #[test]
    fn test_pl98_entries_and_tables() {
        let data = pl98(&[(0, 1), (1, 2), (2, 0), (3, 3)], 1, 1, true);
        let palette = Palette::from_bytes(&data).unwrap();

        assert_eq!(palette.entries.len(), 4);
        assert_eq!(palette.haze_color, 0x00FF_FFFF);
        assert_eq!(palette.allowed_matches, [1; 32]);
        assert_eq!(palette.color_weights[5], 5.0);
        assert_eq!((palette.weight_start, palette.weight_end), (10, 20));

        let shade = &palette.entries[0];
        assert_eq!(shade.kind, PaletteType::ShadeHaze);
        assert_eq!(palette.shade_map(shade).unwrap().len(), 512);
        assert_eq!(palette.haze_map(shade).unwrap().len(), 512);
        // Haze maps lead the entry's block and the shade map follows them.
        assert_eq!(palette.haze_map(shade).unwrap()[0], 0);
        assert_eq!(palette.shade_map(shade).unwrap()[0], 2);
        assert_eq!(palette.shade_map(shade).unwrap()[511], 3);

        // Blend table follows the shade entry's 1 KiB of haze and shade maps.
        let blend = palette.blend_map(&palette.entries[1]).unwrap();
        assert_eq!(blend.len(), 65536);
        assert_eq!(blend[0], 4);

        let plain = &palette.entries[2];
        assert_eq!(palette.remap_table(plain).unwrap().len(), 256);
        assert!(palette.channel_remap(plain).is_some());
        assert!(palette.channel_remap(&palette.entries[3]).is_none());

        let total: usize = [0, 1, 2, 3]
            .iter()
            .map(|&i| palette.lookup_size(palette.entries[i].kind).unwrap())
            .sum();
        assert_eq!(palette.remap_data().len(), total);
    }

    #[test]
    fn test_pl98_without_weights() {
        let palette = Palette::from_bytes(&pl98(&[(5, 0)], 0, 0, false)).unwrap();
        assert!(palette.color_weights.is_empty());
        assert_eq!(palette.entries[0].index, 5);
    }

    #[test]
    fn test_pl98_truncated_blob() {
        let mut data = pl98(&[(0, 2)], 0, 0, false);
        data.truncate(data.len() - 4000);
        assert!(Palette::from_bytes(&data).is_err());
    }

    #[test]
    fn test_pl98_huge_count() {
        let mut data = pl98(&[(0, 0)], 0, 0, false);
        data[4..8].copy_from_slice(&0x7FFF_FFFFu32.to_le_bytes());
        assert!(matches!(
            Palette::from_bytes(&data),
            Err(Error::Common(darkstar_common::Error::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn test_palette_by_index() {
        let palette = Palette::from_bytes(&pl98(&[(4, 0), (9, 0)], 0, 0, false)).unwrap();
        assert_eq!(palette.palette_by_index(9).unwrap().index, 9);
        assert!(palette.palette_by_index(2).is_none());
        assert_eq!(palette.resolve_entry(2).unwrap().index, 4);
        assert!(Palette::default().resolve_entry(0).is_none());
    }

    #[test]
    fn test_unknown_container() {
        let data = chunk(b"ABCD", &[]);
        assert!(matches!(
            Palette::from_bytes(&data),
            Err(Error::Common(darkstar_common::Error::UnknownFormat(ident))) if ident == Ident(*b"ABCD")
        ));
    }
}
