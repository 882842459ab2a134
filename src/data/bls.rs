//! BLS public API (v2) integration.
//!
//! One POST per series id, carrying the series id and an inclusive year range.
//! The API answers with period-labeled observations where `M01`–`M12` are
//! calendar months and `M13` is the annual average; only genuine months are
//! kept. Values arrive as strings and are skipped (not fatal) when they do not
//! parse as finite numbers.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const BASE_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";
const ANNUAL_AVERAGE_PERIOD: &str = "M13";

/// A source of `(date, value)` observations for one upstream series id over an
/// inclusive year range.
///
/// The update pipeline only depends on this trait, so tests can drive it with
/// a stub instead of the network. Returned observations carry no ordering
/// guarantee (the BLS API responds newest-first); sorting is the merger's job.
pub trait SeriesSource {
    fn fetch_series(
        &self,
        series_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<(NaiveDate, f64)>, AppError>;
}

pub struct BlsClient {
    client: Client,
    api_key: Option<String>,
}

impl BlsClient {
    /// Build a client, picking up an optional `BLS_API_KEY` from the
    /// environment (`.env` supported).
    ///
    /// The v2 API accepts unauthenticated requests with lower daily limits; a
    /// registration key raises them, so it is passed along when present.
    pub fn from_env(timeout_secs: u64) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("BLS_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_key })
    }
}

impl SeriesSource for BlsClient {
    fn fetch_series(
        &self,
        series_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<(NaiveDate, f64)>, AppError> {
        let payload = SeriesRequest {
            seriesid: [series_id],
            startyear: start_year.to_string(),
            endyear: end_year.to_string(),
            registrationkey: self.api_key.as_deref(),
        };

        let resp = self
            .client
            .post(BASE_URL)
            .json(&payload)
            .send()
            .map_err(|e| AppError::new(4, format!("BLS request for {series_id} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!(
                    "BLS request for {series_id} failed with status {}.",
                    resp.status()
                ),
            ));
        }

        let body: SeriesResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse BLS response for {series_id}: {e}")))?;

        if body.status != "REQUEST_SUCCEEDED" {
            return Err(AppError::new(
                4,
                format!(
                    "BLS rejected request for {series_id}: {} ({})",
                    body.status,
                    body.message.join("; "),
                ),
            ));
        }

        Ok(collect_observations(&body))
    }
}

#[derive(Debug, Serialize)]
struct SeriesRequest<'a> {
    seriesid: [&'a str; 1],
    startyear: String,
    endyear: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results", default)]
    results: Option<ResultsBody>,
}

#[derive(Debug, Deserialize, Default)]
struct ResultsBody {
    #[serde(default)]
    series: Vec<SeriesBody>,
}

#[derive(Debug, Deserialize)]
struct SeriesBody {
    #[serde(default)]
    data: Vec<PeriodValue>,
}

#[derive(Debug, Deserialize)]
struct PeriodValue {
    year: String,
    period: String,
    value: String,
}

/// Flatten a response into `(date, value)` pairs, keeping only calendar
/// months with parseable values. Bad entries are skipped, never fatal.
fn collect_observations(body: &SeriesResponse) -> Vec<(NaiveDate, f64)> {
    let mut out = Vec::new();
    let Some(results) = &body.results else {
        return out;
    };

    for series in &results.series {
        for item in &series.data {
            let Some(month) = parse_month(&item.period) else {
                continue;
            };
            let Ok(year) = item.year.trim().parse::<i32>() else {
                continue;
            };
            let Some(value) = parse_value(&item.value) else {
                continue;
            };
            let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) else {
                continue;
            };
            out.push((date, value));
        }
    }

    out
}

/// `M01`..`M12` -> month number; everything else (including the `M13` annual
/// average and quarterly/semiannual `Q`/`S` codes) is rejected.
fn parse_month(period: &str) -> Option<u32> {
    if period == ANNUAL_AVERAGE_PERIOD {
        return None;
    }
    let rest = period.strip_prefix('M')?;
    let month = rest.parse::<u32>().ok()?;
    (1..=12).contains(&month).then_some(month)
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
