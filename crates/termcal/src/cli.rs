use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "termcal",
    version,
    about = "Convert a registration schedule page into term calendars"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a saved schedule page and store it in the snapshot database
    Parse(ParseArgs),
    /// Write one calendar per semester from a stored snapshot
    Export(ExportArgs),
    /// Parse a page and write calendars without touching a database
    Convert(ConvertArgs),
    /// Write per-building room occupancy grids from a stored snapshot
    Rooms(RoomsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = "schedule.db")]
    pub db: PathBuf,

    /// Re-parse even if this page was stored before
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long, default_value = "schedule.db")]
    pub db: PathBuf,

    #[arg(long)]
    pub config: PathBuf,

    #[arg(long, default_value = "calendars")]
    pub out_dir: PathBuf,

    /// Snapshot digest; defaults to the most recently stored page
    #[arg(long)]
    pub document: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub config: PathBuf,

    #[arg(long, default_value = "calendars")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RoomsArgs {
    #[arg(long, default_value = "schedule.db")]
    pub db: PathBuf,

    #[arg(long, default_value = "rooms")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub document: Option<String>,

    /// Only write grids for this semester label
    #[arg(long)]
    pub semester: Option<String>,
}
