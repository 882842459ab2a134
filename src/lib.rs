//! `bls-dash` library crate.
//!
//! The binary (`bls`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future exporters, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod tui;
