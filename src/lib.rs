pub mod commands;
pub mod error;
pub mod inspection;
pub mod logging;
pub(crate) mod utils;

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueEnum, builder::ValueHint};

pub use error::{AnalyserError, Result};
pub use inspection::{Analyser, BranchInfo, DEFAULT_TREE_NAME};

/// Report the schema of a tree in a columnar table file.
///
/// Prints the file, tree name, number of entries and a table of branch
/// names and types. Parquet files and DuckDB databases are supported.
#[derive(Parser, Debug)]
#[command(name = "tree-scope", version, long_about = None)]
pub struct Cli {
    /// Input table file path
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: Utf8PathBuf,

    /// Name of the tree (table) to inspect
    #[arg(short, long, default_value = DEFAULT_TREE_NAME)]
    pub tree: String,

    /// Number of entries to display (reserved, currently unused)
    #[arg(short = 'n', long, default_value_t = -1, allow_negative_numbers = true)]
    pub entries: i32,

    /// Output PDF file (reserved, currently unused)
    #[arg(short, long, default_value = "vector_lengths.pdf")]
    pub output: Utf8PathBuf,

    /// Also print storage statistics for this branch
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Output format for the summary
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}
