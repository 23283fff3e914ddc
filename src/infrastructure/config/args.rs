use super::app_config::LogLevel;
use crate::domain::entities::{EffectiveConnectionType, ImageFormat, TransformRequest};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "cardmedia",
    version,
    about = "Progressive image delivery toolkit for the print shop storefront",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Image CDN origin.
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Device pixel ratio hint.
    #[arg(long, global = true)]
    pub dpr: Option<u32>,

    /// Maximum simultaneous loads.
    #[arg(long, global = true)]
    pub max_concurrent: Option<usize>,

    /// Maximum decoded images kept in memory.
    #[arg(long, global = true)]
    pub cache_capacity: Option<usize>,

    /// Network class to assume.
    #[arg(long, value_enum, global = true)]
    pub effective_type: Option<EffectiveConnectionType>,

    /// Ask for reduced data usage. Disables seed prefetching.
    #[arg(long, global = true)]
    pub save_data: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the delivery URL for an asset.
    Resolve {
        /// Catalog id or original reference.
        id: String,
        #[command(flatten)]
        transform: TransformArgs,
    },
    /// Print the four progressive tier URLs for an asset.
    Progressive {
        /// Catalog id or original reference.
        id: String,
        #[command(flatten)]
        transform: TransformArgs,
        /// Emit JSON instead of plain lines.
        #[arg(long)]
        json: bool,
    },
    /// Print the responsive descriptor set for an asset.
    Srcset {
        /// Catalog id or original reference.
        id: String,
        /// Lower qualities when this device is not suited to aggressive prefetching.
        #[arg(long)]
        adaptive: bool,
    },
    /// List catalog entries.
    Catalog,
    /// Run the background prefetcher against the CDN.
    Prefetch {
        /// How long to run before printing statistics.
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
}

/// Transform flags shared by URL subcommands.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct TransformArgs {
    /// Target width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Target height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Encoder quality, passed through unvalidated.
    #[arg(long)]
    pub quality: Option<u32>,

    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<ImageFormat>,

    /// Blur radius.
    #[arg(long)]
    pub blur: Option<u32>,
}

impl From<TransformArgs> for TransformRequest {
    fn from(args: TransformArgs) -> Self {
        Self {
            width: args.width,
            height: args.height,
            quality: args.quality,
            format: args.format,
            blur: args.blur,
            ..Self::default()
        }
    }
}
