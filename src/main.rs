// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use scanner_camera::backends::camera::{CameraFacing, FrameSize};
use scanner_camera::constants::{DEFAULT_LOG_FILTER, cli_defaults};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "scanner-camera")]
#[command(about = "Camera capture core for a document scanner, driven by a virtual camera")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Camera to open (overrides the config file)
    #[arg(short, long, global = true, value_parser = cli::parse_facing)]
    facing: Option<CameraFacing>,

    /// Config file (default: <config dir>/scanner-camera/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the camera's stream sizes and the preview size chosen for a surface
    Sizes {
        /// Surface size as WIDTHxHEIGHT
        #[arg(short, long, value_parser = cli::parse_size, default_value_t = default_surface())]
        surface: FrameSize,
    },

    /// Stream preview frames through the converter
    Preview {
        /// Number of frames to push
        #[arg(short = 'n', long, default_value_t = cli_defaults::PREVIEW_FRAMES)]
        frames: u32,

        /// Surface size as WIDTHxHEIGHT
        #[arg(short, long, value_parser = cli::parse_size, default_value_t = default_surface())]
        surface: FrameSize,

        /// Write the last displayed frame as PNG
        #[arg(long)]
        png: Option<PathBuf>,

        /// Log the preview frame rate
        #[arg(long)]
        fps: bool,
    },

    /// Run the focus and exposure sequence and save a photo
    Photo {
        /// Output file path (default: ~/Pictures/Scans/scan_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Display rotation in degrees: 0, 90, 180 or 270
        #[arg(short, long, default_value = "0", value_parser = cli::parse_rotation)]
        rotation: scanner_camera::pipelines::photo::ScreenRotation,
    },
}

fn default_surface() -> FrameSize {
    FrameSize::new(cli_defaults::SURFACE_WIDTH, cli_defaults::SURFACE_HEIGHT)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=scanner_camera=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref(), cli.facing);

    match cli.command {
        Commands::Sizes { surface } => cli::show_sizes(&config, surface),
        Commands::Preview {
            frames,
            surface,
            png,
            fps,
        } => cli::run_preview(&config, frames, surface, png, fps),
        Commands::Photo { output, rotation } => cli::take_photo(&config, output, rotation),
    }
}
