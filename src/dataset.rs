//! Loading and querying the pre-aggregated monthly air-quality dataset.
//!
//! The CSV is produced upstream; one row is one (city, month, pollutant)
//! monthly average. The dataset is loaded once and never mutated.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// A tracked pollutant. The source data spells these `pm2.5` and `o₃`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pollutant {
    Pm25,
    O3,
}

impl Pollutant {
    pub const ALL: [Pollutant; 2] = [Pollutant::Pm25, Pollutant::O3];

    /// Parses the spelling used in the source CSV (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pm2.5" | "pm25" => Some(Pollutant::Pm25),
            "o₃" | "o3" => Some(Pollutant::O3),
            _ => None,
        }
    }

    /// The spelling used in the source CSV.
    pub fn api_name(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm2.5",
            Pollutant::O3 => "o₃",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pollutant::Pm25 => write!(f, "PM2.5"),
            Pollutant::O3 => write!(f, "O₃"),
        }
    }
}

impl serde::Serialize for Pollutant {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::O3 => "O₃",
        })
    }
}

/// One row of the source dataset, normalized to month granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Always the first day of its month.
    pub month_start: NaiveDate,
    pub parameter: Pollutant,
    pub unit: String,
    pub monthly_average: f64,
}

/// Raw CSV row before date/pollutant validation.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Month Start (UTC)")]
    month_start: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "Sensor Parameter")]
    parameter: String,
    #[serde(rename = "Unit")]
    unit: String,
    #[serde(rename = "Monthly Average")]
    monthly_average: f64,
}

/// The loaded dataset. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Observation>,
}

impl Dataset {
    /// Loads the dataset from a CSV file. Any malformed row is fatal.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("failed to open dataset {}", path.as_ref().display()))?;
        let dataset = Self::from_reader(file)?;
        info!(rows = dataset.len(), "Dataset loaded");
        Ok(dataset)
    }

    /// Loads the dataset from any CSV reader.
    ///
    /// Rows with an unparseable date or an unknown pollutant fail the whole
    /// load rather than being silently dropped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();

        for (idx, result) in rdr.deserialize().enumerate() {
            // Header is line 1, so the first record is line 2.
            let line = idx + 2;
            let raw: RawRow = result.with_context(|| format!("malformed CSV row at line {line}"))?;

            let date = parse_month_start(&raw.month_start).with_context(|| {
                format!(
                    "unparseable Month Start (UTC) {:?} at line {line}",
                    raw.month_start
                )
            })?;

            let Some(parameter) = Pollutant::parse(&raw.parameter) else {
                bail!(
                    "unknown Sensor Parameter {:?} at line {line}",
                    raw.parameter
                );
            };

            rows.push(Observation {
                city: raw.city,
                latitude: raw.latitude,
                longitude: raw.longitude,
                month_start: date,
                parameter,
                unit: raw.unit,
                monthly_average: raw.monthly_average,
            });
        }

        Ok(Dataset { rows })
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sorted distinct years present in the dataset.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.rows.iter().map(|r| r.month_start.year()).collect();
        set.into_iter().collect()
    }

    /// Number of distinct `month_start` values recorded for a city,
    /// across all pollutants.
    pub fn month_count(&self, city: &str) -> usize {
        let months: BTreeSet<NaiveDate> = self
            .rows
            .iter()
            .filter(|r| r.city == city)
            .map(|r| r.month_start)
            .collect();
        months.len()
    }

    /// Sorted distinct cities that carry at least one of the given pollutants.
    pub fn cities_with(&self, pollutants: &[Pollutant]) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .rows
            .iter()
            .filter(|r| pollutants.contains(&r.parameter))
            .map(|r| r.city.as_str())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}

/// Parses a month-start timestamp and normalizes it to the first of the month.
///
/// Accepts a plain date, an RFC 3339 datetime, or a space-separated datetime
/// with or without a UTC offset.
fn parse_month_start(s: &str) -> Result<NaiveDate> {
    let date = if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        d
    } else if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        dt.date_naive()
    } else if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        dt.date_naive()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        dt.date()
    } else {
        bail!("unrecognized timestamp format");
    };

    // Day-of-month always normalizes to 1; month 1..=12 so this cannot fail.
    date.with_day(1).context("invalid date")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Month Start (UTC),Latitude,Longitude,City,Sensor Parameter,Unit,Monthly Average
2021-07-01,55.15,-105.3,Buffalo Narrows,pm2.5,µg/m³,42.5
2021-07-15 00:00:00+00:00,55.15,-105.3,Buffalo Narrows,o₃,ppm,0.031
2021-08-01,49.88,-97.14,Winnipeg_Ellens,pm2.5,µg/m³,12.0
";

    #[test]
    fn test_load_sample() {
        let data = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.rows()[0].city, "Buffalo Narrows");
        assert_eq!(data.rows()[0].parameter, Pollutant::Pm25);
        assert_eq!(data.rows()[0].monthly_average, 42.5);
    }

    #[test]
    fn test_month_start_normalized_to_first() {
        let data = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        // Mid-month datetime rounds down to the first of its month.
        assert_eq!(
            data.rows()[1].month_start,
            NaiveDate::from_ymd_opt(2021, 7, 1).unwrap()
        );
    }

    #[test]
    fn test_unparseable_date_fails_load() {
        let csv = "\
Month Start (UTC),Latitude,Longitude,City,Sensor Parameter,Unit,Monthly Average
not-a-date,55.15,-105.3,Buffalo Narrows,pm2.5,µg/m³,42.5
";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_unknown_pollutant_fails_load() {
        let csv = "\
Month Start (UTC),Latitude,Longitude,City,Sensor Parameter,Unit,Monthly Average
2021-07-01,55.15,-105.3,Buffalo Narrows,no2,ppb,4.0
";
        assert!(Dataset::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_column_fails_load() {
        let csv = "\
Month Start (UTC),Latitude,Longitude,City,Sensor Parameter
2021-07-01,55.15,-105.3,Buffalo Narrows,pm2.5
";
        assert!(Dataset::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_month_count_is_distinct_months() {
        // Both Buffalo Narrows rows normalize to 2021-07-01.
        let data = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(data.month_count("Buffalo Narrows"), 1);
        assert_eq!(data.month_count("Winnipeg_Ellens"), 1);
        assert_eq!(data.month_count("Nowhere"), 0);
    }

    #[test]
    fn test_cities_with_pollutant() {
        let data = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        let o3_cities = data.cities_with(&[Pollutant::O3]);
        assert_eq!(o3_cities, vec!["Buffalo Narrows".to_string()]);
        let all = data.cities_with(&Pollutant::ALL);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_pollutant_parse_and_display() {
        assert_eq!(Pollutant::parse("PM2.5"), Some(Pollutant::Pm25));
        assert_eq!(Pollutant::parse("o3"), Some(Pollutant::O3));
        assert_eq!(Pollutant::parse("co"), None);
        assert_eq!(Pollutant::Pm25.to_string(), "PM2.5");
        assert_eq!(Pollutant::O3.api_name(), "o₃");
    }

    #[test]
    fn test_years_sorted_distinct() {
        let csv = "\
Month Start (UTC),Latitude,Longitude,City,Sensor Parameter,Unit,Monthly Average
2023-01-01,50.0,-100.0,A,pm2.5,µg/m³,1.0
2019-05-01,50.0,-100.0,A,pm2.5,µg/m³,2.0
2023-03-01,50.0,-100.0,A,pm2.5,µg/m³,3.0
";
        let data = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(data.years(), vec![2019, 2023]);
    }
}
