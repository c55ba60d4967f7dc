//! Command-line harness for the stretch engines
//!
//! Decodes an image with the `image` crate, runs one engine and writes the
//! result. Parameters start from the engine defaults (or a preset, or a JSON
//! parameter file) and individual flags override single fields.
//!
//! # Usage
//!
//! ```bash
//! # Optimal transport stretch tuned for a galaxy
//! cargo run --release --bin astro_stretch -- ots m31.png m31_ots.png --object-type galaxy
//!
//! # Starlet stretch from a preset with a stronger arctan
//! cargo run --release --bin astro_stretch -- sas ngc7000.tif out.png --preset emission-nebula --alpha 14
//!
//! # Parameters from a file written by the `params` command
//! cargo run --release --bin astro_stretch -- params sas sas.json --preset faint-extended
//! cargo run --release --bin astro_stretch -- sas in.png out.png --params sas.json
//!
//! # Print the 256-bin luminance histogram as JSON
//! cargo run --release --bin astro_stretch -- histogram in.png
//! ```
//!
//! Set `RUST_LOG=debug` to see per-stage diagnostics.

use astro_stretch::config::{load_params, save_params};
use astro_stretch::{
    apply_stretch, get_histogram_data, ObjectType, OtsParams, RgbaBuffer, SasParams, SasPreset,
    StretchAlgorithm, StretchParams,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimal transport histogram stretch
    Ots {
        /// Input image (PNG, JPEG, TIFF)
        input: PathBuf,

        /// Output image; format follows the extension
        output: PathBuf,

        /// JSON parameter file used as the starting point
        #[arg(long)]
        params: Option<PathBuf>,

        /// Target distribution shape
        #[arg(short = 't', long)]
        object_type: Option<ObjectType>,

        /// Sky level after stretching (0.05-0.30)
        #[arg(short, long)]
        background_target: Option<f32>,

        /// Blend between identity (0) and full transport (1)
        #[arg(short = 'i', long)]
        stretch_intensity: Option<f32>,

        /// Pull toward identity in the highlights (0-1)
        #[arg(long)]
        protect_highlights: Option<f32>,

        /// Broadcast luminance instead of preserving color ratios
        #[arg(long)]
        monochrome: bool,
    },

    /// Starlet wavelet stretch with arctan compression
    Sas {
        /// Input image (PNG, JPEG, TIFF)
        input: PathBuf,

        /// Output image; format follows the extension
        output: PathBuf,

        /// JSON parameter file used as the starting point
        #[arg(long, conflicts_with = "preset")]
        params: Option<PathBuf>,

        /// Tuned starting parameters
        #[arg(short, long)]
        preset: Option<SasPreset>,

        /// Number of wavelet scales (4-8)
        #[arg(short = 'n', long)]
        num_scales: Option<usize>,

        /// Sky level after normalization (0.05-0.25)
        #[arg(short, long)]
        background_target: Option<f32>,

        /// Gain on scales 0-1 (0.5-2.0)
        #[arg(long)]
        fine_gain: Option<f32>,

        /// Gain around scale 3 (1.0-5.0)
        #[arg(long)]
        mid_gain: Option<f32>,

        /// Gain on scales 5 and beyond (1.0-8.0)
        #[arg(long)]
        coarse_gain: Option<f32>,

        /// Arctan compression strength (1-20)
        #[arg(short, long)]
        alpha: Option<f32>,

        /// Halo protection around bright structure (0-1)
        #[arg(long)]
        highlight_protection: Option<f32>,

        /// Soft-threshold multiplier on the estimated noise (0-0.01)
        #[arg(long)]
        noise_threshold: Option<f32>,

        /// Keep large-scale background structure instead of flattening it
        #[arg(long)]
        keep_background: bool,

        /// Broadcast luminance instead of preserving color ratios
        #[arg(long)]
        monochrome: bool,
    },

    /// Print the luminance histogram of an image as JSON
    Histogram {
        /// Input image (PNG, JPEG, TIFF)
        input: PathBuf,
    },

    /// Write a parameter file with defaults or a preset
    Params {
        /// Engine the file configures
        #[arg(value_enum)]
        algorithm: StretchAlgorithm,

        /// Destination JSON file
        output: PathBuf,

        /// SAS preset to write instead of the defaults
        #[arg(short, long)]
        preset: Option<SasPreset>,
    },
}

fn read_image(path: &Path) -> Result<RgbaBuffer> {
    let image = image::open(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?
        .to_rgba8();
    Ok(RgbaBuffer::from_rgba_image(&image)?)
}

fn load_file(path: Option<&Path>) -> Result<Option<StretchParams>> {
    path.map(|path| {
        load_params(path)
            .with_context(|| format!("Failed to load parameters from {}", path.display()))
    })
    .transpose()
}

fn ots_base(path: Option<&Path>) -> Result<OtsParams> {
    match load_file(path)? {
        None => Ok(OtsParams::default()),
        Some(StretchParams::Ots(p)) => Ok(p),
        Some(other) => bail!(
            "Parameter file configures {} but the ots command was run",
            other.algorithm()
        ),
    }
}

fn sas_base(path: Option<&Path>) -> Result<SasParams> {
    match load_file(path)? {
        None => Ok(SasParams::default()),
        Some(StretchParams::Sas(p)) => Ok(p),
        Some(other) => bail!(
            "Parameter file configures {} but the sas command was run",
            other.algorithm()
        ),
    }
}

fn run_stretch(input: &Path, output: &Path, params: &StretchParams) -> Result<()> {
    let image = read_image(input)?;
    info!(
        "Read {} ({}x{})",
        input.display(),
        image.width(),
        image.height()
    );

    let start = Instant::now();
    let stretched = apply_stretch(&image, params)?;
    info!("{} stretch took {:?}", params.algorithm(), start.elapsed());

    stretched
        .into_rgba_image()?
        .save(output)
        .with_context(|| format!("Failed to write image {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ots {
            input,
            output,
            params,
            object_type,
            background_target,
            stretch_intensity,
            protect_highlights,
            monochrome,
        } => {
            let mut ots = ots_base(params.as_deref())?;
            if let Some(v) = object_type {
                ots.object_type = v;
            }
            if let Some(v) = background_target {
                ots.background_target = v;
            }
            if let Some(v) = stretch_intensity {
                ots.stretch_intensity = v;
            }
            if let Some(v) = protect_highlights {
                ots.protect_highlights = v;
            }
            if monochrome {
                ots.preserve_color = false;
            }
            run_stretch(&input, &output, &ots.into())
        }

        Commands::Sas {
            input,
            output,
            params,
            preset,
            num_scales,
            background_target,
            fine_gain,
            mid_gain,
            coarse_gain,
            alpha,
            highlight_protection,
            noise_threshold,
            keep_background,
            monochrome,
        } => {
            let mut sas = match preset {
                Some(preset) => preset.params(),
                None => sas_base(params.as_deref())?,
            };
            if let Some(v) = num_scales {
                sas.num_scales = v;
            }
            if let Some(v) = background_target {
                sas.background_target = v;
            }
            if let Some(v) = fine_gain {
                sas.fine_scale_gain = v;
            }
            if let Some(v) = mid_gain {
                sas.mid_scale_gain = v;
            }
            if let Some(v) = coarse_gain {
                sas.coarse_scale_gain = v;
            }
            if let Some(v) = alpha {
                sas.compression_alpha = v;
            }
            if let Some(v) = highlight_protection {
                sas.highlight_protection = v;
            }
            if let Some(v) = noise_threshold {
                sas.noise_threshold = v;
            }
            if keep_background {
                sas.flatten_background = false;
            }
            if monochrome {
                sas.preserve_color = false;
            }
            run_stretch(&input, &output, &sas.into())
        }

        Commands::Histogram { input } => {
            let image = read_image(&input)?;
            let histogram = get_histogram_data(&image);
            println!("{}", serde_json::to_string_pretty(&histogram)?);
            Ok(())
        }

        Commands::Params {
            algorithm,
            output,
            preset,
        } => {
            let params = match (algorithm, preset) {
                (StretchAlgorithm::Sas, Some(preset)) => StretchParams::Sas(preset.params()),
                (StretchAlgorithm::Ots, Some(_)) => bail!("Presets only exist for the sas engine"),
                (algorithm, None) => StretchParams::default_for(algorithm),
            };
            save_params(&params, &output)?;
            println!("Wrote {} parameters to {}", algorithm, output.display());
            Ok(())
        }
    }
}
