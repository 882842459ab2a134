//! Dataset operations: merge/dedup and the read-side contract.
//!
//! The merge is the data-integrity core of the tool: it unions freshly
//! fetched rows with the previously persisted dataset, deduplicates on the
//! `(date, series)` identity key with last-write-wins semantics (upstream
//! revises recent figures, so newly fetched rows supersede persisted ones),
//! and yields a canonical ascending `(date, series)` ordering.
//!
//! The read-side helpers (`filter_years`, `filter_series`, `pivot_wide`,
//! `latest_*`) implement the contract consumed by the dashboard and the
//! wide-form exporter; they never mutate the store.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::domain::{Observation, Registry};

/// Union `old` and `new`, dedup on `(date, series)` with new-wins, and return
/// rows sorted ascending by `(date, series)`.
///
/// Running the merge twice with the same `new` input is a no-op on the result
/// (idempotence), and the output never holds two rows with the same key.
pub fn merge(old: Vec<Observation>, new: Vec<Observation>) -> Vec<Observation> {
    let mut by_key: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();

    // Old rows first so a later insert from `new` overwrites them.
    for obs in old.into_iter().chain(new) {
        by_key.insert((obs.date, obs.series), obs.value);
    }

    by_key
        .into_iter()
        .map(|((date, series), value)| Observation {
            date,
            series,
            value,
        })
        .collect()
}

/// Keep rows whose date falls in the inclusive `[start_year, end_year]` range.
pub fn filter_years(rows: &[Observation], start_year: i32, end_year: i32) -> Vec<Observation> {
    rows.iter()
        .filter(|r| (start_year..=end_year).contains(&r.date.year()))
        .cloned()
        .collect()
}

/// Keep rows whose series key is in `keys`.
pub fn filter_series(rows: &[Observation], keys: &[&str]) -> Vec<Observation> {
    rows.iter()
        .filter(|r| keys.contains(&r.series.as_str()))
        .cloned()
        .collect()
}

/// `(date, value)` pairs for one series, sorted ascending by date.
pub fn series_points(rows: &[Observation], key: &str) -> Vec<(NaiveDate, f64)> {
    let mut points: Vec<(NaiveDate, f64)> = rows
        .iter()
        .filter(|r| r.series == key)
        .map(|r| (r.date, r.value))
        .collect();
    points.sort_by_key(|(d, _)| *d);
    points
}

/// Min and max calendar year present in the dataset.
pub fn year_bounds(rows: &[Observation]) -> Option<(i32, i32)> {
    let min = rows.iter().map(|r| r.date.year()).min()?;
    let max = rows.iter().map(|r| r.date.year()).max()?;
    Some((min, max))
}

/// Latest observation date across all series.
pub fn latest_date(rows: &[Observation]) -> Option<NaiveDate> {
    rows.iter().map(|r| r.date).max()
}

/// Value of `key` at `date`, if that series reported for that month.
pub fn value_at(rows: &[Observation], key: &str, date: NaiveDate) -> Option<f64> {
    rows.iter()
        .find(|r| r.series == key && r.date == date)
        .map(|r| r.value)
}

/// One column of the wide-form projection.
#[derive(Debug, Clone)]
pub struct WideColumn {
    pub key: String,
    pub label: String,
    /// One slot per date in `WideTable::dates`; `None` where the series has
    /// no observation for that month.
    pub values: Vec<Option<f64>>,
}

/// Wide form: one row per date, one column per series.
#[derive(Debug, Clone)]
pub struct WideTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<WideColumn>,
}

/// Pivot long-form rows to wide form.
///
/// Column order: registry order for known keys, then any stale keys found in
/// the data in lexicographic order (labeled by their raw key).
pub fn pivot_wide(rows: &[Observation], registry: &Registry) -> WideTable {
    let mut dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    dates.sort();
    dates.dedup();

    let mut keys: Vec<&str> = registry
        .entries()
        .iter()
        .map(|e| e.key)
        .filter(|k| rows.iter().any(|r| r.series == *k))
        .collect();

    let mut stale: Vec<&str> = rows
        .iter()
        .map(|r| r.series.as_str())
        .filter(|k| !registry.contains(k))
        .collect();
    stale.sort();
    stale.dedup();
    keys.extend(stale);

    let columns = keys
        .into_iter()
        .map(|key| {
            let by_date: BTreeMap<NaiveDate, f64> = rows
                .iter()
                .filter(|r| r.series == key)
                .map(|r| (r.date, r.value))
                .collect();
            WideColumn {
                key: key.to_string(),
                label: registry.label(key).to_string(),
                values: dates.iter().map(|d| by_date.get(d).copied()).collect(),
            }
        })
        .collect();

    WideTable { dates, columns }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn obs(y: i32, m: u32, series: &str, value: f64) -> Observation {
        Observation::new(ymd(y, m), series, value)
    }

    fn is_sorted(rows: &[Observation]) -> bool {
        rows.windows(2).all(|w| w[0].key() <= w[1].key())
    }

    #[test]
    fn merge_is_idempotent() {
        let new = vec![
            obs(2024, 2, "unemployment_rate", 3.9),
            obs(2024, 1, "unemployment_rate", 3.7),
        ];
        let once = merge(Vec::new(), new.clone());
        let twice = merge(once.clone(), new);
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_new_row_wins_on_same_key() {
        let old = vec![obs(2024, 3, "unemployment_rate", 3.8)];
        let new = vec![obs(2024, 3, "unemployment_rate", 3.9)];
        let merged = merge(old, new);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].value - 3.9).abs() < 1e-12);
    }

    #[test]
    fn merge_sorts_by_date_then_series() {
        let old = vec![
            obs(2024, 2, "unemployment_rate", 3.9),
            obs(2024, 1, "nonfarm_employment", 157000.0),
        ];
        let new = vec![
            obs(2024, 1, "avg_weekly_hours", 34.3),
            obs(2023, 12, "unemployment_rate", 3.7),
        ];
        let merged = merge(old, new);
        assert!(is_sorted(&merged));
        assert_eq!(merged[0].date, ymd(2023, 12));
        assert_eq!(merged[1].series, "avg_weekly_hours");
        assert_eq!(merged[2].series, "nonfarm_employment");
    }

    #[test]
    fn merge_deduplicates_every_key() {
        let old = vec![
            obs(2024, 1, "a", 1.0),
            obs(2024, 1, "a", 2.0),
            obs(2024, 1, "b", 3.0),
        ];
        let new = vec![obs(2024, 1, "a", 4.0)];
        let merged = merge(old, new);
        assert_eq!(merged.len(), 2);
        let mut keys: Vec<_> = merged.iter().map(|r| r.key()).collect();
        keys.dedup();
        assert_eq!(keys.len(), merged.len());
    }

    #[test]
    fn merge_full_year_across_five_series() {
        // Five series, twelve valid months each for 2020: sixty rows.
        let registry = Registry::bls();
        let mut new = Vec::new();
        for entry in registry.entries() {
            for month in 1..=12 {
                new.push(obs(2020, month, entry.key, month as f64));
            }
        }
        let merged = merge(Vec::new(), new);
        assert_eq!(merged.len(), 60);
        assert!(is_sorted(&merged));
        assert_eq!(merged.first().map(|r| r.date), Some(ymd(2020, 1)));
        assert_eq!(merged.last().map(|r| r.date), Some(ymd(2020, 12)));
    }

    #[test]
    fn filter_years_is_inclusive() {
        let rows = vec![
            obs(2020, 6, "a", 1.0),
            obs(2021, 6, "a", 2.0),
            obs(2022, 6, "a", 3.0),
        ];
        let filtered = filter_years(&rows, 2020, 2021);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.date.year() <= 2021));
    }

    #[test]
    fn filter_series_keeps_subset() {
        let rows = vec![
            obs(2024, 1, "a", 1.0),
            obs(2024, 1, "b", 2.0),
            obs(2024, 1, "c", 3.0),
        ];
        let filtered = filter_series(&rows, &["a", "c"]);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.series != "b"));
    }

    #[test]
    fn pivot_wide_leaves_gaps_empty() {
        let registry = Registry::bls();
        let rows = vec![
            obs(2024, 1, "unemployment_rate", 3.7),
            obs(2024, 2, "unemployment_rate", 3.9),
            obs(2024, 1, "avg_weekly_hours", 34.3),
        ];
        let wide = pivot_wide(&rows, &registry);

        assert_eq!(wide.dates, vec![ymd(2024, 1), ymd(2024, 2)]);
        assert_eq!(wide.columns.len(), 2);
        // Registry order puts unemployment_rate before avg_weekly_hours.
        assert_eq!(wide.columns[0].key, "unemployment_rate");
        assert_eq!(wide.columns[0].label, "Unemployment Rate (%)");
        assert_eq!(wide.columns[1].key, "avg_weekly_hours");
        assert_eq!(wide.columns[1].values, vec![Some(34.3), None]);
    }

    #[test]
    fn pivot_wide_appends_stale_keys_with_raw_labels() {
        let registry = Registry::bls();
        let rows = vec![
            obs(2024, 1, "unemployment_rate", 3.7),
            obs(2024, 1, "retired_series_v1", 9.9),
        ];
        let wide = pivot_wide(&rows, &registry);
        assert_eq!(wide.columns.len(), 2);
        assert_eq!(wide.columns[1].key, "retired_series_v1");
        assert_eq!(wide.columns[1].label, "retired_series_v1");
    }

    #[test]
    fn latest_helpers() {
        let rows = vec![
            obs(2024, 1, "a", 1.0),
            obs(2024, 3, "a", 3.0),
            obs(2024, 2, "b", 2.0),
        ];
        assert_eq!(latest_date(&rows), Some(ymd(2024, 3)));
        assert_eq!(value_at(&rows, "a", ymd(2024, 3)), Some(3.0));
        assert_eq!(value_at(&rows, "b", ymd(2024, 3)), None);
        assert_eq!(year_bounds(&rows), Some((2024, 2024)));
        assert_eq!(year_bounds(&[]), None);
    }

    #[test]
    fn series_points_sorts_ascending() {
        let rows = vec![
            obs(2024, 3, "a", 3.0),
            obs(2024, 1, "a", 1.0),
            obs(2024, 2, "b", 9.0),
            obs(2024, 2, "a", 2.0),
        ];
        let points = series_points(&rows, "a");
        assert_eq!(points.len(), 3);
        assert!(points.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
