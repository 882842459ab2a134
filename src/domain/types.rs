//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during merging
//! - persisted to / reloaded from the CSV store
//! - consumed read-only by the dashboard and exporters

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One monthly fact: `(date, series, value)`.
///
/// `date` is always the first of the month; `series` is a registry key (stale
/// keys from older schema versions may survive in the store and are tolerated).
/// The identity key is `(date, series)`: after any merge the store holds at
/// most one observation per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub series: String,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, series: impl Into<String>, value: f64) -> Self {
        Self {
            date,
            series: series.into(),
            value,
        }
    }

    /// Identity key for dedup and ordering.
    pub fn key(&self) -> (NaiveDate, &str) {
        (self.date, self.series.as_str())
    }
}

/// One registry entry: internal key, upstream BLS series id, display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesDef {
    pub key: &'static str,
    pub upstream_id: &'static str,
    pub label: &'static str,
}

/// The fixed set of series this tool tracks.
///
/// Built once at startup and passed explicitly into the fetcher/merger and the
/// presentation layer, so tests can substitute a smaller registry.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<SeriesDef>,
}

impl Registry {
    pub fn new(entries: Vec<SeriesDef>) -> Self {
        Self { entries }
    }

    /// The five U.S. labor-market series tracked by default.
    pub fn bls() -> Self {
        Self::new(vec![
            SeriesDef {
                key: "nonfarm_employment",
                upstream_id: "CES0000000001",
                label: "Nonfarm Employment (Thousands)",
            },
            SeriesDef {
                key: "unemployment_rate",
                upstream_id: "LNS14000000",
                label: "Unemployment Rate (%)",
            },
            SeriesDef {
                key: "labor_force_participation",
                upstream_id: "LNS11300000",
                label: "Labor Force Participation Rate (%)",
            },
            SeriesDef {
                key: "avg_hourly_earnings",
                upstream_id: "CES0500000003",
                label: "Average Hourly Earnings ($)",
            },
            SeriesDef {
                key: "avg_weekly_hours",
                upstream_id: "CES0500000002",
                label: "Average Weekly Hours",
            },
        ])
    }

    pub fn entries(&self) -> &[SeriesDef] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Display label for a key, falling back to the raw key for stale or
    /// unknown series left over from prior schema versions.
    pub fn label<'a>(&self, key: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.label)
            .unwrap_or(key)
    }
}

/// Configuration for one `bls update` run.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Target CSV store.
    pub data_path: PathBuf,
    /// First year of the fetch window (ignored when `window_years` is set).
    pub start_year: i32,
    /// Last year of the fetch window; `None` means the current calendar year.
    pub end_year: Option<i32>,
    /// Retention window: fetch only the last N calendar years ending at
    /// `end_year`. Overrides `start_year` when set.
    pub window_years: Option<u32>,
    /// Per-request network timeout in seconds.
    pub timeout_secs: u64,
}

impl UpdateConfig {
    /// Resolve the inclusive `[start, end]` year range for this run.
    pub fn fetch_window(&self, current_year: i32) -> (i32, i32) {
        let end = self.end_year.unwrap_or(current_year);
        let start = match self.window_years {
            Some(w) => end - (w as i32 - 1).max(0),
            None => self.start_year,
        };
        (start, end)
    }
}
