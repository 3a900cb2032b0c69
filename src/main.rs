//! Darkstar CLI - Command-line tool for Darkstar engine game assets.
//!
//! This is the main entry point for the Darkstar command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use darkstar::prelude::*;

/// Darkstar - Tribes-era game asset tool
#[derive(Parser)]
#[command(name = "darkstar")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of a volume
    VolList {
        /// Path to the volume file
        #[arg(short, long, env = "DARKSTAR_VOLUME")]
        vol: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract files from a volume
    VolExtract {
        /// Path to the volume file
        #[arg(short, long, env = "DARKSTAR_VOLUME")]
        vol: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Summarize a palette
    PalInfo {
        /// Palette file, or entry name with --vol
        input: String,

        /// Read the input from this volume
        #[arg(long)]
        vol: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a bitmap to PNG
    BmpConvert {
        /// Bitmap file, or entry name with --vol
        input: String,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Palette for 8-bit bitmaps without their own
        #[arg(short, long, env = "DARKSTAR_PALETTE")]
        palette: Option<String>,

        /// Read the input and palette from this volume
        #[arg(long)]
        vol: Option<PathBuf>,

        /// Mip level to convert
        #[arg(short, long, default_value_t = 0)]
        mip: usize,

        /// Palette entry index overriding the bitmap's own
        #[arg(long)]
        palette_index: Option<i32>,
    },

    /// Expand a raw LZH stream
    LzhUnpack {
        /// Compressed input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Uncompressed size in bytes
        #[arg(short, long)]
        size: usize,
    },

    /// Rebuild the persisted object in a file and print it
    Inspect {
        /// Input file, or entry name with --vol
        input: String,

        /// Read the input from this volume
        #[arg(long)]
        vol: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::VolList { vol, filter, detailed } => {
            cmd_vol_list(&vol, filter.as_deref(), detailed)?;
        }
        Commands::VolExtract { vol, output, filter } => {
            cmd_vol_extract(&vol, &output, filter.as_deref())?;
        }
        Commands::PalInfo { input, vol, json } => {
            cmd_pal_info(&input, vol.as_deref(), json)?;
        }
        Commands::BmpConvert {
            input,
            output,
            palette,
            vol,
            mip,
            palette_index,
        } => {
            let options = ExpandOptions {
                row_alignment: 1,
                palette_index,
            };
            cmd_bmp_convert(&input, &output, palette.as_deref(), vol.as_deref(), mip, &options)?;
        }
        Commands::LzhUnpack { input, output, size } => {
            cmd_lzh_unpack(&input, &output, size)?;
        }
        Commands::Inspect { input, vol } => {
            cmd_inspect(&input, vol.as_deref())?;
        }
    }

    Ok(())
}

/// Case-insensitive glob filter; no pattern matches everything.
fn name_filter(pattern: Option<&str>) -> Result<impl Fn(&str) -> bool> {
    let pattern = pattern
        .map(Pattern::new)
        .transpose()
        .context("Invalid filter pattern")?;
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    Ok(move |name: &str| pattern.as_ref().map_or(true, |p| p.matches_with(name, options)))
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Read `name` from `vol` when given, else from disk.
fn load(name: &str, vol: Option<&Path>) -> Result<Vec<u8>> {
    match vol {
        Some(vol) => {
            log::debug!("reading {name} from volume {}", vol.display());
            let mut resources = ResourceManager::new();
            resources
                .add_volume_file(vol)
                .with_context(|| format!("Failed to open volume {}", vol.display()))?;
            resources
                .open_file(name, None)
                .with_context(|| format!("Failed to read {name} from {}", vol.display()))
        }
        None => fs::read(name).with_context(|| format!("Failed to read {name}")),
    }
}

fn cmd_vol_list(vol_path: &Path, filter: Option<&str>, detailed: bool) -> Result<()> {
    let volume = Volume::open(vol_path).context("Failed to open volume")?;
    let matches = name_filter(filter)?;

    let mut count = 0;
    for entry in volume.entries().iter().filter(|e| matches(e.name.as_str())) {
        if detailed {
            println!(
                "{:>10} {:>6} {:#010x} {}",
                entry.size, entry.compression, entry.id, entry.name
            );
        } else {
            println!("{}", entry.name);
        }
        count += 1;
    }

    println!("\nTotal: {} entries", count);

    Ok(())
}

fn cmd_vol_extract(vol_path: &Path, output: &Path, filter: Option<&str>) -> Result<()> {
    println!("Opening volume: {}", vol_path.display());

    let start = Instant::now();
    let volume = Volume::open(vol_path).context("Failed to open volume")?;
    println!("Loaded {} entries in {:?}", volume.len(), start.elapsed());

    let matches = name_filter(filter)?;
    let selected: Vec<&VolumeEntry> = volume.entries().iter().filter(|e| matches(e.name.as_str())).collect();
    println!("Extracting {} entries...", selected.len());

    fs::create_dir_all(output)?;
    let pb = progress_bar(selected.len())?;

    let start = Instant::now();
    let failures: Vec<String> = selected
        .par_iter()
        .filter_map(|entry| {
            let result = volume
                .read(entry)
                .map_err(anyhow::Error::from)
                .and_then(|data| {
                    let path = output.join(entry.output_path());
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, data)?;
                    Ok(())
                });
            pb.inc(1);
            result.err().map(|e| format!("{}: {e:#}", entry.name))
        })
        .collect();

    pb.finish_with_message("Done");
    for failure in &failures {
        eprintln!("Error extracting {failure}");
    }
    println!(
        "Extracted {} entries in {:?} ({} errors)",
        selected.len() - failures.len(),
        start.elapsed(),
        failures.len()
    );

    Ok(())
}

fn cmd_pal_info(input: &str, vol: Option<&Path>, json: bool) -> Result<()> {
    let data = load(input, vol)?;
    let palette = Palette::from_bytes(&data).context("Failed to parse palette")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&palette_summary(&palette))?);
        return Ok(());
    }

    println!(
        "Shade levels: {} (shift {}), haze levels: {}, haze color: {}",
        palette.shade_levels, palette.shade_shift, palette.haze_levels, palette.haze_color
    );
    println!("Remap data: {} bytes", palette.remap_data().len());
    for entry in &palette.entries {
        println!("  entry {:>4}: {:?}", entry.index, entry.kind);
    }
    println!("\nTotal: {} entries", palette.entries.len());

    Ok(())
}

/// JSON summary of a palette and its entries.
fn palette_summary(palette: &Palette) -> serde_json::Value {
    let entries: Vec<_> = palette
        .entries
        .iter()
        .map(|entry| {
            serde_json::json!({
                "index": entry.index,
                "type": entry.kind,
                "first_color": format!("{:08x}", entry.colors[0]),
                "shade_map": palette.shade_map(entry).map(<[u8]>::len),
                "haze_map": palette.haze_map(entry).map(<[u8]>::len),
                "blend_map": palette.blend_map(entry).map(<[u8]>::len),
            })
        })
        .collect();
    serde_json::json!({
        "shade_shift": palette.shade_shift,
        "shade_levels": palette.shade_levels,
        "haze_levels": palette.haze_levels,
        "haze_color": palette.haze_color,
        "weights": palette.color_weights.len(),
        "remap_bytes": palette.remap_data().len(),
        "entries": entries,
    })
}

fn cmd_bmp_convert(
    input: &str,
    output: &Path,
    palette: Option<&str>,
    vol: Option<&Path>,
    mip: usize,
    options: &ExpandOptions,
) -> Result<()> {
    println!("Converting: {} -> {}", input, output.display());

    let bitmap = Bitmap::from_bytes(&load(input, vol)?).context("Failed to parse bitmap")?;
    println!(
        "{}x{} {}-bit, {} mip levels, flags {:?}",
        bitmap.width,
        bitmap.height,
        bitmap.bit_depth,
        bitmap.mip_levels(),
        bitmap.flags
    );

    let palette = match palette {
        Some(name) => Some(Palette::from_bytes(&load(name, vol)?).context("Failed to parse palette")?),
        None => None,
    };

    let image = bitmap
        .expand_mip(mip, palette.as_ref(), options)
        .context("Failed to expand bitmap")?;
    let (width, height) = (image.width, image.height);
    let buffer = image::RgbaImage::from_raw(width, height, image.into_packed())
        .context("Expanded image has the wrong size")?;
    buffer.save(output).context("Failed to write output file")?;

    println!("Conversion complete");

    Ok(())
}

fn cmd_lzh_unpack(input: &Path, output: &Path, size: usize) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let start = Instant::now();
    let unpacked = darkstar::lzh::decompress_to_vec(&data, size).context("Failed to expand LZH stream")?;
    fs::write(output, &unpacked).context("Failed to write output file")?;

    println!(
        "Expanded {} -> {} bytes in {:?}",
        data.len(),
        unpacked.len(),
        start.elapsed()
    );

    Ok(())
}

fn cmd_inspect(input: &str, vol: Option<&Path>) -> Result<()> {
    let registry = darkstar::init().context("Failed to install registry")?;
    let data = load(input, vol)?;

    let mut stream = MemStream::new(&data[..]);
    let object = registry
        .create_from_stream(&mut stream)
        .context("Failed to rebuild object")?;

    println!("Class: {}", object.class_name());
    if let Some(bitmap) = object.downcast_ref::<Bitmap>() {
        println!(
            "{}x{} {}-bit, {} mip levels, palette index {}, flags {:?}",
            bitmap.width,
            bitmap.height,
            bitmap.bit_depth,
            bitmap.mip_levels(),
            bitmap.palette_index,
            bitmap.flags
        );
    } else if let Some(palette) = object.downcast_ref::<Palette>() {
        for entry in &palette.entries {
            println!("  entry {:>4}: {:?}", entry.index, entry.kind);
        }
    } else if let Some(list) = object.downcast_ref::<MaterialList>() {
        println!("{} details, {} materials each", list.num_details, list.per_detail());
        for material in list.detail(0).unwrap_or_default() {
            println!("  {:?} {}", material.source(), material.file_name);
        }
    } else {
        println!("{object:#?}");
    }
    if !stream.is_eof() {
        println!("({} trailing bytes)", stream.remaining());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_summary() {
        let mut colors = [0u32; 256];
        colors[0] = 0xFF00_00FF;
        let palette = Palette::from_entry(PaletteEntry::new(3, PaletteType::NoRemap, colors));

        let summary = palette_summary(&palette);
        let entry = &summary["entries"][0];
        assert_eq!(entry["index"], 3);
        assert_eq!(entry["type"], "NoRemap");
        assert_eq!(entry["first_color"], "ff0000ff");
        assert!(entry["shade_map"].is_null());
    }
}
