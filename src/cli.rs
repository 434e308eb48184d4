//! Command-line interface for mediapick

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediapick")]
#[command(about = "mediapick - Bring photos and videos into a local cache as plain files", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Cache directory for materialized files (defaults to the system temp dir)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// JPEG quality for HEIC/HEIF conversion (0-1]
    #[arg(long, default_value = "0.9", global = true)]
    pub jpeg_quality: f32,

    /// Worker threads for batch materialization
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Give up on a single file after this many seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Materialize the given files as if they had been picked
    Pick {
        /// Picked files, in selection order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Maximum number of items kept from the selection
        #[arg(short, long, default_value = "3")]
        limit: i64,

        /// Only offer images
        #[arg(long)]
        image_only: bool,

        /// all, images or videos (overrides --image-only)
        #[arg(long)]
        media_type: Option<String>,

        /// Hide the progress bar
        #[arg(long)]
        no_loader: bool,

        /// Report successful items even if some failed
        #[arg(long)]
        partial: bool,
    },

    /// List a page of a media directory, newest first
    Last {
        /// Library root directory
        library: PathBuf,

        /// Page size
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Number of newest items to skip
        #[arg(short, long, default_value = "0")]
        offset: i64,

        /// all, images or videos
        #[arg(long, default_value = "all")]
        media_type: String,
    },

    /// Print one EXIF or container property of a file
    Exif {
        /// File path or file:// URI
        file: String,

        /// Property key, e.g. DateTimeOriginal, Make, GPSLatitude
        #[arg(default_value = "")]
        key: String,
    },
}
