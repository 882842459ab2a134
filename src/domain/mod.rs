//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the persisted `Observation` row and its `(date, series)` identity key
//! - the fixed series registry (`SeriesDef`, `Registry`)
//! - the update configuration (`UpdateConfig`)

pub mod types;

pub use types::*;
