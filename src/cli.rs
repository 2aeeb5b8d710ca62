//! Command-line surface.

use crate::aggregator::ScanOptions;
use crate::models::FlipFilter;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Find auction house flips from BIN listings and bazaar prices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect flips on the current market snapshot and save them
    Scan(ScanArgs),
    /// Show every observed price for one item
    Item {
        /// Item display name (case-insensitive)
        name: String,
        /// Fetch live data even if the cached snapshot is fresh
        #[arg(long)]
        refresh: bool,
    },
    /// Show the results of the last scan
    Last {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Export the results of the last scan
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Only items whose name contains this text
    #[arg(long)]
    pub search: Option<String>,
    /// Only items in this category (e.g. weapon, armor)
    #[arg(long)]
    pub category: Option<String>,
    /// Only items of this rarity (e.g. LEGENDARY)
    #[arg(long)]
    pub rarity: Option<String>,
    /// Compare BIN listings only
    #[arg(long)]
    pub no_bazaar: bool,
    /// Fetch live data even if the cached snapshot is fresh
    #[arg(long)]
    pub refresh: bool,
    /// Print at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,
}

impl ScanArgs {
    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            filter: FlipFilter {
                search: self.search.clone(),
                category: self.category.clone(),
                rarity: self.rarity.clone(),
            },
            include_bazaar: !self.no_bazaar,
            refresh: self.refresh,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,
    /// Write here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Leave out the source columns in CSV
    #[arg(long)]
    pub no_sources: bool,
}
