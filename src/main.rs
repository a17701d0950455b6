use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, warn};

use synthetic_ndvi_lib::output::report_json;
use synthetic_ndvi_lib::{handle, ColorScaleKind, Config, MessageLevel, Request, Upload};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "Synthetic NDVI - vegetation index approximated from RGB images")]
struct Args {
    /// Image file (single-image mode) or directory (batch mode)
    #[clap(short, long)]
    input: PathBuf,

    /// Directory receiving the single-image result
    #[clap(short, long, default_value = ".")]
    output: PathBuf,

    /// Path to configuration file (defaults to ./ndvi.toml when present)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Colour scale (overwrites config)
    #[clap(long, value_enum)]
    color_scale: Option<ColorScaleArg>,

    /// Render the plot without a colour bar
    #[clap(long)]
    no_colorbar: bool,

    /// Write a CSV summary of a batch run to this path
    #[clap(long)]
    summary: Option<PathBuf>,

    /// Print the batch report as JSON
    #[clap(long)]
    json: bool,

    /// Open the single-image result in a preview window
    #[clap(long)]
    view: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorScaleArg {
    Rdylgn,
    Rdbu,
    Brbg,
}

/// Main function
fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    // Load configuration
    let mut config = Config::load_or_default(args.config.as_deref())
        .context("loading configuration")?;

    // Override config with command-line arguments
    if let Some(scale) = args.color_scale {
        config.color_scale = match scale {
            ColorScaleArg::Rdylgn => ColorScaleKind::RdYlGn,
            ColorScaleArg::Rdbu => ColorScaleKind::RdBu,
            ColorScaleArg::Brbg => ColorScaleKind::BrBG,
        };
    }

    if args.no_colorbar {
        config.colorbar = false;
    }

    if let Some(summary) = &args.summary {
        config.summary_csv = Some(summary.display().to_string());
    }

    config.validate().context("invalid configuration")?;

    let start_time = Instant::now();

    let request = if args.input.is_file() {
        info!("Processing single file: {}", args.input.display());
        Request {
            upload: Some(Upload::from_path(&args.input)
                .with_context(|| format!("reading {}", args.input.display()))?),
            ..Request::default()
        }
    } else {
        info!("Processing directory: {}", args.input.display());
        Request {
            directory: Some(args.input.clone()),
            process_directory: true,
            ..Request::default()
        }
    };

    let response = handle(&request, &config);

    for message in &response.messages {
        match message.level {
            MessageLevel::Error | MessageLevel::Warning => eprintln!("{}", message),
            MessageLevel::Success | MessageLevel::Info => println!("{}", message),
        }
    }

    if let Some(single) = &response.single {
        fs::create_dir_all(&args.output)
            .with_context(|| format!("creating {}", args.output.display()))?;
        let path = args.output.join(&single.download.file_name);
        fs::write(&path, &single.download.bytes)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Saved {} ({})", path.display(), single.download.mime);

        if args.view {
            show(&single.figure)?;
        }
    } else if args.view {
        warn!("--view only applies to a single input image");
    }

    if let (Some(report), true) = (&response.batch, args.json) {
        println!("{}", report_json(report)?);
    }

    let elapsed = start_time.elapsed();
    info!("Processing completed in {:.2} seconds", elapsed.as_secs_f64());

    Ok(if response.has_errors() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

#[cfg(feature = "viewer")]
fn show(figure: &image::RgbImage) -> anyhow::Result<()> {
    synthetic_ndvi_lib::viewer::show_image("Synthetic NDVI Image", figure)?;
    Ok(())
}

#[cfg(not(feature = "viewer"))]
fn show(_figure: &image::RgbImage) -> anyhow::Result<()> {
    warn!("Built without the `viewer` feature; rebuild with --features viewer to preview");
    Ok(())
}
