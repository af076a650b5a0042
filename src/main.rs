//! `imgkit` CLI - compare, match, resize and inspect images.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imgkit::image::save_image_with_quality;
use imgkit::{combine, image, transform, Config, Image, PlotConfig, Plotter};

/// Compare, match, resize and inspect images.
#[derive(Parser, Debug)]
#[command(name = "imgkit")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT", global = true)]
    quality: u8,

    /// Directory to write figures to. Without it no figures are rendered.
    #[arg(long, value_name = "DIR", global = true)]
    plot_dir: Option<PathBuf>,

    /// Font file used for figure titles. Defaults to the bundled font.
    #[arg(long, value_name = "FILE", global = true)]
    font: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Structural difference between two images of the same size.
    Diff {
        /// First image.
        first: PathBuf,

        /// Second image.
        second: PathBuf,

        /// Save the normalized difference map here.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Match the histogram of SOURCE to REFERENCE.
    Match {
        source: PathBuf,
        reference: PathBuf,
        output: PathBuf,
    },

    /// Resize an image by a proportion between 0 and 1.
    Resize {
        input: PathBuf,
        output: PathBuf,

        /// Scale factor applied to both dimensions.
        #[arg(short, long, value_name = "FLOAT")]
        proportion: f64,
    },

    /// Render red, green and blue histograms of an RGB image.
    Histogram {
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("imgkit={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    // Build configuration
    let config = Config {
        output_quality: args.quality,
        plot: PlotConfig {
            output_dir: args.plot_dir.clone(),
            font_path: args.font.clone(),
            ..PlotConfig::default()
        },
    };
    config.validate().context("Invalid configuration")?;

    let mut plotter = Plotter::from_config(&config.plot).context("Failed to set up figures")?;

    match &args.command {
        Command::Diff {
            first,
            second,
            output,
        } => {
            let first = read(first)?;
            let second = read(second)?;

            let diff = combine::find_difference(&first, &second)
                .context("Failed to compute difference")?;
            let map = diff.to_image()?;

            if let Some(path) = output {
                save(&map, path, &config)?;
            }
            plotter.plot_result(&[&first, &second, &map])?;

            println!("Similarity: {:.6}", diff.score);
        }
        Command::Match {
            source,
            reference,
            output,
        } => {
            let source_img = read(source)?;
            let reference_img = read(reference)?;

            let matched = combine::transfer_histogram(&source_img, &reference_img)
                .context("Failed to match histograms")?;
            save(&matched, output, &config)?;
            plotter.plot_result(&[&source_img, &reference_img, &matched])?;

            println!("Matched {} -> {}", source.display(), output.display());
        }
        Command::Resize {
            input,
            output,
            proportion,
        } => {
            let img = read(input)?;

            let resized = transform::resize_image(&img, *proportion)
                .context("Failed to resize image")?;
            save(&resized, output, &config)?;
            plotter.plot_image(&resized)?;

            println!(
                "Resized {}x{} -> {}x{}",
                img.width(),
                img.height(),
                resized.width(),
                resized.height()
            );
        }
        Command::Histogram { input } => {
            if config.plot.output_dir.is_none() {
                anyhow::bail!("--plot-dir is required to write the histogram figure");
            }

            let img = read(input)?;
            plotter.plot_histogram(&img)?;
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<Image> {
    image::read_image(path, false).with_context(|| format!("Failed to read {}", path.display()))
}

fn save(img: &Image, path: &Path, config: &Config) -> Result<()> {
    save_image_with_quality(img, path, config.output_quality)
        .with_context(|| format!("Failed to save {}", path.display()))
}
