//! Reporting utilities: update summaries and latest-month metrics.
//!
//! We keep formatting code in one place so:
//! - the fetch/merge code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use std::path::Path;

use crate::app::pipeline::{SeriesOutcome, UpdateOutput};
use crate::dataset;
use crate::domain::{Observation, Registry};

/// Format the per-series outcomes and row counts of an update run.
pub fn format_update_summary(output: &UpdateOutput, data_path: &Path) -> String {
    let mut out = String::new();

    out.push_str("=== bls - dataset update ===\n");
    out.push_str(&format!(
        "Window: {}-{}\n\n",
        output.start_year, output.end_year
    ));

    for report in &output.reports {
        match &report.outcome {
            SeriesOutcome::Fetched { rows } => {
                out.push_str(&format!("  {:<28} {rows:>5} rows\n", report.key));
            }
            SeriesOutcome::Failed { reason } => {
                out.push_str(&format!("  {:<28} FAILED: {reason}\n", report.key));
            }
        }
    }

    let failed = output
        .reports
        .iter()
        .filter(|r| matches!(r.outcome, SeriesOutcome::Failed { .. }))
        .count();
    if failed > 0 {
        out.push_str(&format!(
            "\n{failed} series failed; their rows are omitted from this run.\n"
        ));
    }

    out.push_str(&format!(
        "\nFetched {} rows; saved {} rows to {}\n",
        output.rows_fetched,
        output.rows_written,
        data_path.display()
    ));

    out
}

/// Format the latest month's value per registered series as a small table.
pub fn format_latest(rows: &[Observation], registry: &Registry) -> String {
    let Some(last) = dataset::latest_date(rows) else {
        return "No data. Run `bls update` first.\n".to_string();
    };

    let mut out = String::new();
    out.push_str(&format!("Latest month: {}\n\n", last.format("%B %Y")));

    for entry in registry.entries() {
        let value = dataset::value_at(rows, entry.key, last)
            .map(|v| fmt_value(entry.key, v))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("  {:<38} {value:>12}\n", entry.label));
    }

    out
}

/// Per-series display formatting, matching how each indicator is quoted:
/// employment in whole thousands, earnings in dollars and cents, rates and
/// hours to one decimal.
pub fn fmt_value(key: &str, v: f64) -> String {
    match key {
        "nonfarm_employment" => group_thousands(v),
        "avg_hourly_earnings" => format!("${v:.2}"),
        _ => format!("{v:.1}"),
    }
}

fn group_thousands(v: f64) -> String {
    let n = v.round() as i64;
    let digits = n.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(y: i32, m: u32, series: &str, value: f64) -> Observation {
        Observation::new(NaiveDate::from_ymd_opt(y, m, 1).unwrap(), series, value)
    }

    #[test]
    fn format_update_summary_lists_outcomes() {
        use crate::app::pipeline::{SeriesOutcome, SeriesReport, UpdateOutput};

        let output = UpdateOutput {
            reports: vec![
                SeriesReport {
                    key: "unemployment_rate",
                    outcome: SeriesOutcome::Fetched { rows: 12 },
                },
                SeriesReport {
                    key: "avg_weekly_hours",
                    outcome: SeriesOutcome::Failed {
                        reason: "timed out".to_string(),
                    },
                },
            ],
            start_year: 2020,
            end_year: 2024,
            rows_fetched: 12,
            rows_written: 60,
        };

        let text = format_update_summary(&output, Path::new("data/bls_data.csv"));
        assert!(text.contains("Window: 2020-2024"));
        assert!(text.contains("unemployment_rate"));
        assert!(text.contains("12 rows"));
        assert!(text.contains("FAILED: timed out"));
        assert!(text.contains("saved 60 rows to data/bls_data.csv"));
    }

    #[test]
    fn fmt_value_per_series() {
        assert_eq!(fmt_value("nonfarm_employment", 157232.0), "157,232");
        assert_eq!(fmt_value("avg_hourly_earnings", 34.5), "$34.50");
        assert_eq!(fmt_value("unemployment_rate", 3.85), "3.9");
        assert_eq!(fmt_value("avg_weekly_hours", 34.3), "34.3");
    }

    #[test]
    fn group_thousands_handles_small_and_negative() {
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(-1234567.0), "-1,234,567");
    }

    #[test]
    fn format_latest_reports_empty_dataset() {
        let registry = Registry::bls();
        let text = format_latest(&[], &registry);
        assert!(text.contains("No data"));
    }

    #[test]
    fn format_latest_uses_latest_month_and_dashes_for_gaps() {
        let registry = Registry::bls();
        let rows = vec![
            obs(2024, 2, "unemployment_rate", 3.9),
            obs(2024, 3, "nonfarm_employment", 157232.0),
        ];
        let text = format_latest(&rows, &registry);
        assert!(text.contains("March 2024"));
        assert!(text.contains("157,232"));
        // unemployment_rate has no March row, so it shows a dash.
        assert!(text.lines().any(|l| l.contains("Unemployment Rate") && l.trim_end().ends_with('-')));
    }
}
