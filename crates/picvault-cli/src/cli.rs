//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "picvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: platform data dir + "picvault")
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load an archive from a URL or local file and extract its images
    Load(LoadArgs),
    /// Extract a single image from a library archive
    Extract(ExtractArgs),
    /// Star or unstar an archive or an image
    Star(StarArgs),
    /// Show library occupancy against the configured budget
    Usage,
    /// Remove all non-starred archives from the library
    Clear(ClearArgs),
    /// List library archives
    List(ListArgs),
    /// Show or edit load history
    History(HistoryArgs),
    /// Remove stale extraction session directories
    Sweep,
    /// Show or change persisted settings
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoadArgs {
    /// Archive URL or local file path
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Copy a local file into the library, keeping the original
    #[arg(long, conflicts_with = "move_into")]
    pub copy: bool,

    /// Move a local file into the library
    #[arg(long = "move", conflicts_with = "copy")]
    pub move_into: bool,
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Archive identifier as shown by `list`
    #[arg(value_name = "ARCHIVE_ID")]
    pub archive_id: String,

    /// Image identifier as shown by `list --images`
    #[arg(value_name = "IMAGE_ID")]
    pub image_id: String,
}

#[derive(clap::Args)]
pub struct StarArgs {
    /// Archive identifier
    #[arg(value_name = "ARCHIVE_ID")]
    pub archive_id: String,

    /// Toggle a single image's star instead of the archive's
    #[arg(long, value_name = "IMAGE_ID")]
    pub image: Option<String>,
}

#[derive(clap::Args)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Also list each archive's images
    #[arg(long)]
    pub images: bool,
}

#[derive(clap::Args)]
pub struct HistoryArgs {
    /// Rename an entry: `--rename <ENTRY_ID> --name <NAME>`
    #[arg(long, value_name = "ENTRY_ID", requires = "name")]
    pub rename: Option<String>,

    /// New name for `--rename`
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Toggle an entry's star
    #[arg(long, value_name = "ENTRY_ID", conflicts_with = "rename")]
    pub star: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    /// Library size budget in gigabytes
    #[arg(long, value_name = "GB")]
    pub library_size_gb: Option<f64>,

    /// Maximum retained history entries
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_history_items: Option<u64>,
}
