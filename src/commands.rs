use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "photo-stats")]
#[command(about = "Camera, lens and exposure statistics for a photo library", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./Config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract metadata, print distributions and save charts
    Process(ProcessArgs),
    /// List candidate files without extracting metadata
    Scan(ScanArgs),
    /// Check that the metadata tool can be run
    CheckTool(ToolArgs),
    /// Print configuration values
    PrintConfig,
}

/// Overrides shared by commands that walk the library.
#[derive(Debug, Args)]
pub struct RootArgs {
    /// Root directory to scan (repeatable)
    #[arg(long = "root")]
    pub roots: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ToolArgs {
    /// Path to the exiftool executable
    #[arg(long)]
    pub tool: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub roots: RootArgs,

    #[command(flatten)]
    pub tool: ToolArgs,

    /// Directory charts are written to
    #[arg(long)]
    pub output: Option<String>,

    /// Number of concurrent extractions
    #[arg(long)]
    pub workers: Option<usize>,

    /// Print every file that could not be read
    #[arg(long)]
    pub show_errors: bool,

    /// Also write distributions.csv to the output directory
    #[arg(long)]
    pub csv: bool,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub roots: RootArgs,

    /// Print each candidate path
    #[arg(long)]
    pub list: bool,
}
