//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the fetch/merge update pipeline
//! - launches the dashboard
//! - writes exports and prints reports

use clap::Parser;

use crate::cli::{Command, ExportArgs, LatestArgs, UpdateArgs};
use crate::data::BlsClient;
use crate::domain::{Registry, UpdateConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `bls` binary.
pub fn run() -> Result<(), AppError> {
    // We want a bare `bls` (and `bls --data ...`) to behave like `bls dash`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Update(args) => handle_update(args),
        Command::Dash(args) => crate::tui::run(args),
        Command::Export(args) => handle_export(args),
        Command::Latest(args) => handle_latest(args),
    }
}

fn handle_update(args: UpdateArgs) -> Result<(), AppError> {
    let config = update_config_from_args(&args);
    let registry = Registry::bls();
    let client = BlsClient::from_env(config.timeout_secs)?;

    let output = pipeline::run_update(&client, &registry, &config)?;
    println!(
        "{}",
        crate::report::format_update_summary(&output, &config.data_path)
    );
    Ok(())
}

fn handle_latest(args: LatestArgs) -> Result<(), AppError> {
    let registry = Registry::bls();
    let rows = crate::io::store::load_if_exists(&args.data)?;
    println!("{}", crate::report::format_latest(&rows, &registry));
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let registry = Registry::bls();
    let mut rows = crate::io::store::load_if_exists(&args.data)?;

    if args.start_year.is_some() || args.end_year.is_some() {
        let start = args.start_year.unwrap_or(i32::MIN);
        let end = args.end_year.unwrap_or(i32::MAX);
        rows = crate::dataset::filter_years(&rows, start, end);
    }
    if !args.series.is_empty() {
        let keys: Vec<&str> = args.series.iter().map(String::as_str).collect();
        rows = crate::dataset::filter_series(&rows, &keys);
    }

    if rows.is_empty() {
        println!("No rows matched; nothing exported.");
        return Ok(());
    }

    let wide = crate::dataset::pivot_wide(&rows, &registry);
    crate::io::export::write_wide_csv(&args.out, &wide)?;
    println!(
        "Exported {} dates x {} series to {}",
        wide.dates.len(),
        wide.columns.len(),
        args.out.display()
    );
    Ok(())
}

pub fn update_config_from_args(args: &UpdateArgs) -> UpdateConfig {
    UpdateConfig {
        data_path: args.data.clone(),
        start_year: args.start_year,
        end_year: args.end_year,
        window_years: args.window,
        timeout_secs: args.timeout_secs,
    }
}

/// Rewrite argv so `bls` defaults to `bls dash`.
///
/// Rules:
/// - `bls`                      -> `bls dash`
/// - `bls --data PATH`          -> `bls dash --data PATH`
/// - `bls --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dash".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "update" | "dash" | "export" | "latest");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "dash flags".
    if arg1.starts_with('-') {
        argv.insert(1, "dash".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
