//! Wide-form CSV export.
//!
//! One row per date, one human-labeled column per series. This is a
//! projection of the store for spreadsheets and downstream scripts; it carries
//! no invariants beyond the dataset's own.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::dataset::WideTable;
use crate::error::AppError;

/// Write a wide-form table to a CSV file. Gaps render as empty cells.
pub fn write_wide_csv(path: &Path, wide: &WideTable) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })?;

    let mut header = vec!["Date".to_string()];
    header.extend(wide.columns.iter().map(|c| escape(&c.label)));
    writeln!(file, "{}", header.join(","))
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (i, date) in wide.dates.iter().enumerate() {
        let mut fields = vec![date.format("%Y-%m-%d").to_string()];
        for column in &wide.columns {
            fields.push(
                column.values[i]
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writeln!(file, "{}", fields.join(","))
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Quote a field when it contains CSV-significant characters. Labels like
/// "Average Hourly Earnings ($)" pass through unquoted.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::pivot_wide;
    use crate::domain::{Observation, Registry};
    use chrono::NaiveDate;

    #[test]
    fn wide_export_writes_labeled_columns_and_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bls_data_wide.csv");

        let rows = vec![
            Observation::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                "unemployment_rate",
                3.7,
            ),
            Observation::new(
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                "unemployment_rate",
                3.9,
            ),
            Observation::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                "avg_weekly_hours",
                34.3,
            ),
        ];
        let wide = pivot_wide(&rows, &Registry::bls());
        write_wide_csv(&path, &wide).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Date,Unemployment Rate (%),Average Weekly Hours")
        );
        assert_eq!(lines.next(), Some("2024-01-01,3.7,34.3"));
        // avg_weekly_hours has no February observation: empty cell.
        assert_eq!(lines.next(), Some("2024-02-01,3.9,"));
    }

    #[test]
    fn escape_quotes_awkward_fields() {
        assert_eq!(escape("Average Weekly Hours"), "Average Weekly Hours");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
