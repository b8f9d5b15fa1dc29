use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod config;

use config::Config;
use shotmap_core::writer::TileFormat;

#[derive(Parser)]
#[command(name = "shotmap")]
#[command(about = "Shotmap - Screenshot-to-tile-pyramid builder")]
#[command(version)]
#[command(long_about = "
Shotmap turns grids of in-game map screenshots into a slippy-map tile
pyramid. Screenshots are stitched without visible seams, empty and
redundant layers are filtered out, and downscaling happens in linear
light so tiles keep their perceived brightness.

Examples:
  shotmap build --shots captures/ --out tiles/
  shotmap build --shots captures/ --out tiles/ --zoom 0..4 --format png
  shotmap redo --shots captures/ --out tiles/ --from-report
  shotmap redo --shots captures/ --out tiles/ 6:7:8 6:9:2
  shotmap inspect --shots captures/ --missing
  shotmap init
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads to use
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the tile pyramid from a directory of screenshots
    Build {
        /// Directory containing the captured screenshots
        #[arg(long, required = true)]
        shots: PathBuf,

        /// Output directory for the tile pyramid
        #[arg(short, long, required = true)]
        out: PathBuf,

        /// Display levels to build, e.g. '0..4' or '2,5' (default: all)
        #[arg(long)]
        zoom: Option<String>,

        /// Tile encoding, overriding the configuration
        #[arg(long)]
        format: Option<FormatArg>,

        /// Tile edge length in pixels, overriding the configuration
        #[arg(long)]
        tile_size: Option<u32>,

        /// Channel tolerance for content filtering, overriding the configuration
        #[arg(long)]
        tolerance: Option<u8>,
    },

    /// Re-synthesize specific tiles, typically the failures of an earlier run
    Redo {
        /// Directory containing the captured screenshots
        #[arg(long, required = true)]
        shots: PathBuf,

        /// Output directory of the existing tile pyramid
        #[arg(short, long, required = true)]
        out: PathBuf,

        /// Tiles to rebuild as 'zoom:col:row'
        tiles: Vec<String>,

        /// Also rebuild every failed tile recorded in the run report
        #[arg(long)]
        from_report: bool,

        /// Tile encoding, overriding the configuration
        #[arg(long)]
        format: Option<FormatArg>,

        /// Tile edge length in pixels, overriding the configuration
        #[arg(long)]
        tile_size: Option<u32>,

        /// Channel tolerance for content filtering, overriding the configuration
        #[arg(long)]
        tolerance: Option<u8>,
    },

    /// Report screenshot coverage and the pyramid each level would produce
    Inspect {
        /// Directory containing the captured screenshots
        #[arg(long, required = true)]
        shots: PathBuf,

        /// List the grid indices missing from each layer
        #[arg(long)]
        missing: bool,
    },

    /// Write an example configuration file
    Init {
        /// Destination path
        #[arg(short, long, default_value = "shotmap.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Webp,
    Png,
}

impl FormatArg {
    pub fn into_format(self) -> TileFormat {
        match self {
            FormatArg::Webp => TileFormat::Webp,
            FormatArg::Png => TileFormat::Png,
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose, cli.quiet)?;

    // Load configuration
    let config = Config::load(cli.config.as_ref().map(|v| v.as_path()))?;

    // Set global thread count; CLI overrides configuration
    let threads = cli.threads.unwrap_or_else(|| config.workers());
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("Failed to set thread count")?;

    // Execute the requested command
    match cli.command {
        Commands::Build {
            shots,
            out,
            zoom,
            format,
            tile_size,
            tolerance,
        } => {
            commands::build::execute(&config, shots, out, zoom, format, tile_size, tolerance)?;
        }

        Commands::Redo {
            shots,
            out,
            tiles,
            from_report,
            format,
            tile_size,
            tolerance,
        } => {
            commands::redo::execute(
                &config,
                shots,
                out,
                tiles,
                from_report,
                format,
                tile_size,
                tolerance,
            )?;
        }

        Commands::Inspect { shots, missing } => {
            commands::inspect::execute(&config, shots, missing)?;
        }

        Commands::Init { output, force } => {
            commands::init::execute(output, force)?;
        }
    }

    Ok(())
}
