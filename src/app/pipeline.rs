//! The update pipeline shared by the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch every registered series -> merge with the persisted dataset ->
//! full rewrite of the store.
//!
//! Per-series failures are captured as explicit `SeriesReport` outcomes
//! instead of aborting the run: one bad series degrades the update, the rest
//! still land on disk.

use chrono::{Datelike, Local};

use crate::data::SeriesSource;
use crate::dataset;
use crate::domain::{Observation, Registry, UpdateConfig};
use crate::error::AppError;
use crate::io::store;

/// Outcome of fetching one registered series.
#[derive(Debug, Clone)]
pub enum SeriesOutcome {
    Fetched { rows: usize },
    Failed { reason: String },
}

/// Per-series fetch report for observability and tests.
#[derive(Debug, Clone)]
pub struct SeriesReport {
    pub key: &'static str,
    pub outcome: SeriesOutcome,
}

/// All computed outputs of a single `bls update` run.
#[derive(Debug, Clone)]
pub struct UpdateOutput {
    pub reports: Vec<SeriesReport>,
    pub start_year: i32,
    pub end_year: i32,
    /// Rows fetched this run (pre-merge, post-filtering).
    pub rows_fetched: usize,
    /// Rows in the rewritten store.
    pub rows_written: usize,
}

/// Execute the full update: sequential per-series fetch, merge, rewrite.
pub fn run_update(
    source: &dyn SeriesSource,
    registry: &Registry,
    config: &UpdateConfig,
) -> Result<UpdateOutput, AppError> {
    let (start_year, end_year) = config.fetch_window(Local::now().year());
    if start_year > end_year {
        return Err(AppError::new(
            2,
            format!("Empty fetch window: start year {start_year} is after end year {end_year}."),
        ));
    }

    let mut fetched: Vec<Observation> = Vec::new();
    let mut reports = Vec::new();

    for entry in registry.entries() {
        match source.fetch_series(entry.upstream_id, start_year, end_year) {
            Ok(points) => {
                reports.push(SeriesReport {
                    key: entry.key,
                    outcome: SeriesOutcome::Fetched { rows: points.len() },
                });
                fetched.extend(
                    points
                        .into_iter()
                        .map(|(date, value)| Observation::new(date, entry.key, value)),
                );
            }
            Err(err) => {
                // Partial-failure policy: record and continue with the rest.
                reports.push(SeriesReport {
                    key: entry.key,
                    outcome: SeriesOutcome::Failed {
                        reason: err.to_string(),
                    },
                });
            }
        }
    }

    let rows_fetched = fetched.len();

    // Missing file = first run; unreadable file is fatal (cannot safely merge).
    let old = store::load_if_exists(&config.data_path)?;
    let merged = dataset::merge(old, fetched);
    let rows_written = store::write(&config.data_path, &merged)?;

    Ok(UpdateOutput {
        reports,
        start_year,
        end_year,
        rows_fetched,
        rows_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use crate::domain::SeriesDef;
    use crate::io::store;

    struct StubSource {
        /// Upstream id -> canned observations; ids absent from the map fail.
        points: HashMap<&'static str, Vec<(NaiveDate, f64)>>,
    }

    impl SeriesSource for StubSource {
        fn fetch_series(
            &self,
            series_id: &str,
            _start_year: i32,
            _end_year: i32,
        ) -> Result<Vec<(NaiveDate, f64)>, AppError> {
            self.points
                .get(series_id)
                .cloned()
                .ok_or_else(|| AppError::new(4, format!("stub outage for {series_id}")))
        }
    }

    fn test_registry() -> Registry {
        Registry::new(vec![
            SeriesDef {
                key: "series_a",
                upstream_id: "UPSTREAM_A",
                label: "Series A",
            },
            SeriesDef {
                key: "series_b",
                upstream_id: "UPSTREAM_B",
                label: "Series B",
            },
        ])
    }

    fn config(path: PathBuf) -> UpdateConfig {
        UpdateConfig {
            data_path: path,
            start_year: 2024,
            end_year: Some(2024),
            window_years: None,
            timeout_secs: 30,
        }
    }

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn one_failed_series_does_not_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("bls_data.csv");

        // A fails (absent from the stub), B succeeds.
        let mut points = HashMap::new();
        points.insert("UPSTREAM_B", vec![(ymd(2024, 1), 2.0), (ymd(2024, 2), 2.1)]);
        let source = StubSource { points };

        let output = run_update(&source, &test_registry(), &config(path.clone())).unwrap();

        assert_eq!(output.rows_written, 2);
        assert!(matches!(
            output.reports[0].outcome,
            SeriesOutcome::Failed { .. }
        ));
        assert!(matches!(
            output.reports[1].outcome,
            SeriesOutcome::Fetched { rows: 2 }
        ));

        let rows = store::load(&path).unwrap();
        assert!(rows.iter().all(|r| r.series == "series_b"));
    }

    #[test]
    fn refetch_supersedes_persisted_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bls_data.csv");

        // Prior run persisted a preliminary figure for January.
        store::write(
            &path,
            &[Observation::new(ymd(2024, 1), "series_a", 1.0)],
        )
        .unwrap();

        // Upstream revised January and added February.
        let mut points = HashMap::new();
        points.insert("UPSTREAM_A", vec![(ymd(2024, 2), 1.2), (ymd(2024, 1), 1.1)]);
        points.insert("UPSTREAM_B", Vec::new());
        let source = StubSource { points };

        let output = run_update(&source, &test_registry(), &config(path.clone())).unwrap();
        assert_eq!(output.rows_written, 2);

        let rows = store::load(&path).unwrap();
        assert!((rows[0].value - 1.1).abs() < 1e-12);
        assert!((rows[1].value - 1.2).abs() < 1e-12);
    }

    #[test]
    fn rerunning_with_identical_input_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bls_data.csv");

        let mut points = HashMap::new();
        points.insert("UPSTREAM_A", vec![(ymd(2024, 1), 1.0)]);
        points.insert("UPSTREAM_B", vec![(ymd(2024, 1), 2.0)]);
        let source = StubSource { points };

        let first = run_update(&source, &test_registry(), &config(path.clone())).unwrap();
        let after_first = store::load(&path).unwrap();
        let second = run_update(&source, &test_registry(), &config(path.clone())).unwrap();
        let after_second = store::load(&path).unwrap();

        assert_eq!(first.rows_written, second.rows_written);
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn rejects_inverted_fetch_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().join("bls_data.csv"));
        cfg.start_year = 2025;
        cfg.end_year = Some(2020);

        let source = StubSource {
            points: HashMap::new(),
        };
        assert!(run_update(&source, &test_registry(), &cfg).is_err());
    }
}
