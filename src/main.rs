use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use luma_grain::{
    config::Config,
    graigasm::{GrainingOptions, GrainingOutput, MaskPreview},
    video::{Frame, VideoFormat},
    GrainError, GrainerRegistry,
};

#[derive(Parser)]
#[command(
    name = "luma-grain",
    version,
    about = "Add luma-adaptive multi-band film grain to images",
    long_about = "Luma-grain splits the luma range into bands and gives each band its own grain layer, so shadows, midtones and highlights can carry different grain strength, size and sharpness."
)]
struct Cli {
    /// Input image (PNG, JPEG)
    #[arg(short, long)]
    input: PathBuf,

    /// Output image path; with --show-masks, the base name of the mask files
    #[arg(short, long)]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the band masks instead of the grained image
    #[arg(long)]
    show_masks: bool,

    /// Worker threads, overriding the configuration
    #[arg(short, long)]
    threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(&cli) {
        error!("{}", describe_error(&err));
        if is_retryable(&err) {
            warn!("The failure was an I/O error; running again may succeed");
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    info!("Starting luma-grain v{}", env!("CARGO_PKG_VERSION"));
    info!("Input: {:?}", cli.input);
    info!("Output: {:?}", cli.output);

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    if let Some(threads) = cli.threads {
        config.processing.threads = threads;
    }
    config.validate()?;

    let registry = GrainerRegistry::new();
    let graigasm = config.build_graigasm(&registry)?;
    info!("Configured {} bands", graigasm.bands().len());

    let image = image::open(&cli.input).with_context(|| format!("failed to open {:?}", cli.input))?;
    let frame = Frame::from_dynamic_image(&image)?;
    info!("Loaded {}x{} frame", frame.width(), frame.height());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.processing.threads)
        .build()
        .context("failed to build worker pool")?;

    let options = GrainingOptions {
        prefilter: None,
        show_masks: cli.show_masks,
    };
    let output = pool.install(|| graigasm.graining(&frame, options))?;

    match output {
        GrainingOutput::Frame(grained) => {
            grained.to_dynamic_image()?.save(&cli.output)?;
            info!("Grained image saved to: {:?}", cli.output);
        }
        GrainingOutput::Masks(previews) => {
            for preview in &previews {
                let path = mask_path(&cli.output, preview);
                mask_image(preview)?.to_dynamic_image()?.save(&path)?;
                info!("{} -> {:?}", preview.label, path);
            }
        }
    }

    Ok(())
}

/// Library errors get their user-facing wording; anything else keeps its context chain
fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GrainError>() {
        Some(grain_error) => grain_error.user_message(),
        None => format!("{:#}", err),
    }
}

fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<GrainError>()
        .map(GrainError::is_recoverable)
        .unwrap_or(false)
}

/// `out.png` becomes `out_mask0.png`, `out_mask1.png`, ...
fn mask_path(output: &Path, preview: &MaskPreview) -> PathBuf {
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("mask");
    let extension = output.extension().and_then(|s| s.to_str()).unwrap_or("png");
    output.with_file_name(format!("{}_mask{}.{}", stem, preview.band, extension))
}

/// Grayscale image of a mask's luma plane
fn mask_image(preview: &MaskPreview) -> Result<Frame> {
    let bits = preview
        .mask
        .format()
        .map(|f| f.bits_per_sample)
        .context("mask has no format")?;
    let luma = preview.mask.plane(0).context("mask has no planes")?.clone();
    Ok(Frame::from_planes(VideoFormat::gray(bits), vec![luma])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use luma_grain::error::{ConfigError, GrainerError};

    #[test]
    fn test_library_errors_use_user_message() {
        let err = anyhow::Error::from(GrainError::from(GrainerError::NotFound {
            name: "grain9000".to_string(),
        }));
        let message = describe_error(&err);
        assert!(message.contains("grain9000"));
        assert!(message.contains("Available grainers"));
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_missing_config_file_message() {
        let err = anyhow::Error::from(GrainError::from(ConfigError::FileNotFound {
            path: "bands.toml".to_string(),
        }));
        assert_eq!(describe_error(&err), "Configuration file 'bands.toml' not found.");
    }

    #[test]
    fn test_io_errors_are_retryable() {
        let io = std::io::Error::new(std::io::ErrorKind::Interrupted, "busy");
        let err = anyhow::Error::from(GrainError::from(io));
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_other_errors_keep_context() {
        let err = anyhow::anyhow!("disk full").context("failed to open \"a.png\"");
        assert_eq!(describe_error(&err), "failed to open \"a.png\": disk full");
    }

    #[test]
    fn test_mask_path_numbers_bands() {
        let preview = MaskPreview {
            index: 3,
            band: 1,
            threshold: 80.0,
            label: "Threshold: 80".to_string(),
            mask: Frame::blank(VideoFormat::gray(8), 2, 2, &[0.0]).unwrap(),
        };
        assert_eq!(mask_path(Path::new("out/grain.png"), &preview), PathBuf::from("out/grain_mask1.png"));
    }
}
