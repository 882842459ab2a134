//! Upstream data sources.
//!
//! Currently a single source: the BLS public timeseries API (`bls`).

pub mod bls;

pub use bls::{BlsClient, SeriesSource};
