use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hdrscan")]
#[command(author, version, about = "Dynamic-range classifier and metadata resolver for video libraries")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the media library and resolve every new file
    Scan {
        /// Library root (defaults to the configured media path)
        path: Option<PathBuf>,
    },

    /// Resolve a single file and record the result
    Resolve {
        /// File to resolve
        #[arg(required = true)]
        file: PathBuf,

        /// Re-run the pipeline even if the file was already processed
        #[arg(long)]
        force: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a file from the scan registry
    Forget {
        /// File to forget
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Drop registry entries for files that no longer exist
    Reconcile,

    /// List processed files
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a media file and display the resolved record without saving it
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
