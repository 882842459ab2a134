//! Command-line parsing for the BLS labor-statistics tool.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the fetch/merge code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_DATA_PATH: &str = "data/bls_data.csv";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bls", version, about = "U.S. labor statistics fetcher + dashboard (BLS-based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch all registered series from the BLS API and merge them into the
    /// local dataset. Always best-effort: failed series are reported and the
    /// rest are written.
    Update(UpdateArgs),
    /// Launch the interactive dashboard over the persisted dataset.
    ///
    /// This is the default subcommand: a bare `bls` behaves like `bls dash`.
    Dash(DashArgs),
    /// Export the dataset as a wide-form CSV (one row per date, one labeled
    /// column per series).
    Export(ExportArgs),
    /// Print the latest month's value for every registered series.
    Latest(LatestArgs),
}

/// Options for `bls update`.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    /// Path of the persisted dataset.
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// First year of the fetch window.
    #[arg(long, default_value_t = 2020)]
    pub start_year: i32,

    /// Last year of the fetch window (defaults to the current year).
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Fetch only the last N calendar years (overrides --start-year).
    #[arg(long)]
    pub window: Option<u32>,

    /// Per-request network timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Options for `bls dash`.
#[derive(Debug, Parser, Clone)]
pub struct DashArgs {
    /// Path of the persisted dataset.
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,
}

/// Options for `bls latest`.
#[derive(Debug, Parser, Clone)]
pub struct LatestArgs {
    /// Path of the persisted dataset.
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,
}

/// Options for `bls export`.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// Path of the persisted dataset.
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Output path for the wide-form CSV.
    #[arg(short = 'o', long, default_value = "bls_data_wide.csv")]
    pub out: PathBuf,

    /// Keep only rows from this year onward.
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Keep only rows up to this year.
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Comma-separated subset of series keys to export (default: all).
    #[arg(long, value_delimiter = ',')]
    pub series: Vec<String>,
}
