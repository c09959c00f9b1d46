// crates/imgsize-cli/src/cli.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// imgsize - Estimate how much memory images take once decoded
#[derive(Parser)]
#[command(name = "imgsize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Number of parallel workers for batches (0 = auto-detect)
    #[arg(short, long, global = true, default_value = "0")]
    pub jobs: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze images and estimate their decoded size
    #[command(after_help = "Exit codes:\n  \
        0  success\n  \
        1  usage error\n  \
        2  file not found\n  \
        3  invalid or unsupported format\n  \
        4  processing error\n  \
        5  partial success (some files failed)")]
    Analyze {
        /// Image files or glob patterns (e.g., *.png, ./photos/*.jpg)
        #[arg(required_unless_present = "dir")]
        files: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Process all images in a directory
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Recurse into subdirectories (use with --dir)
        #[arg(short, long, requires = "dir")]
        recursive: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Reset to defaults
    Reset,

    /// Show config file path
    Path,
}
