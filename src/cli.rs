use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::emit::MAPPING_TABLE;
use crate::resolve::FilterFallback;

#[derive(Parser, Debug)]
#[command(
    name = "dvhc-remap",
    version,
    about = "Map legacy Vietnamese wards to post-reform wards from merger resolutions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the merger clauses found in one resolution document.
    Parse(ParseArgs),
    /// Resolve resolution documents into legacy-to-reform mapping rows.
    Resolve(ResolveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    #[arg(long)]
    pub document: PathBuf,

    /// Reference recorded on each clause; defaults to the file stem.
    #[arg(long)]
    pub reference: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    #[arg(long)]
    pub legacy_dump: PathBuf,

    #[arg(long)]
    pub reform_dump: PathBuf,

    #[arg(long = "document")]
    pub documents: Vec<PathBuf>,

    /// Every `.txt` file in this directory is resolved too.
    #[arg(long)]
    pub documents_dir: Option<PathBuf>,

    #[arg(long, default_value = "out/ward_mappings.sql")]
    pub output: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Legacy province (code or name) for every document, instead of the
    /// one guessed from each file name.
    #[arg(long)]
    pub legacy_province: Option<String>,

    #[arg(long)]
    pub reform_province: Option<String>,

    #[arg(long, default_value = MAPPING_TABLE)]
    pub table: String,

    #[arg(long, default_value_t = 500)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 100_000)]
    pub max_search_nodes: usize,

    #[arg(long, value_enum, default_value_t = FilterFallbackMode::Relax)]
    pub filter_fallback: FilterFallbackMode,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum FilterFallbackMode {
    Strict,
    Relax,
}

impl FilterFallbackMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Relax => "relax",
        }
    }
}

impl From<FilterFallbackMode> for FilterFallback {
    fn from(mode: FilterFallbackMode) -> Self {
        match mode {
            FilterFallbackMode::Strict => Self::Strict,
            FilterFallbackMode::Relax => Self::Relax,
        }
    }
}
