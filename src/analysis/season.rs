//! Wildfire-season keys, heatmap cells, and the seasonal aggregate table.
//!
//! A wildfire season is May through September of one year. Seasons are
//! offered to the UI only for 2018..=2024 (2025 is excluded as incomplete),
//! but the table builder accepts any year present in the data.

use anyhow::{Context, Result, bail};
use chrono::Datelike;
use serde::Serialize;

use crate::analysis::util::mean;
use crate::dataset::{Dataset, Observation, Pollutant};
use crate::output::TableColumns;

/// First calendar month of the wildfire season (May).
pub const SEASON_FIRST_MONTH: u32 = 5;
/// Last calendar month of the wildfire season (September).
pub const SEASON_LAST_MONTH: u32 = 9;

/// First year for which a season may be offered.
pub const FIRST_OFFERED_YEAR: i32 = 2018;
/// Last year for which a season may be offered; 2025 is incomplete.
pub const LAST_OFFERED_YEAR: i32 = 2024;

/// Marker sizes scale linearly into 0..=MAX_MARKER_SIZE per pollutant.
pub const MAX_MARKER_SIZE: f64 = 500.0;

pub fn is_season_month(month: u32) -> bool {
    (SEASON_FIRST_MONTH..=SEASON_LAST_MONTH).contains(&month)
}

/// Identifies one wildfire season: `(year, May-Sep)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeasonKey {
    year: i32,
}

impl SeasonKey {
    pub fn new(year: i32) -> Self {
        SeasonKey { year }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    /// Whether this season may be offered for map selection.
    pub fn is_offered(self) -> bool {
        (FIRST_OFFERED_YEAR..=LAST_OFFERED_YEAR).contains(&self.year)
    }

    /// The display label, e.g. `2021 (May-Sep)`.
    pub fn label(self) -> String {
        format!("{} (May-Sep)", self.year)
    }

    /// Parses a season label (`2021 (May-Sep)`) or a bare year.
    pub fn parse(s: &str) -> Result<Self> {
        let year_part = s.split_whitespace().next().unwrap_or(s);
        let year: i32 = year_part
            .parse()
            .with_context(|| format!("unrecognized season {s:?}"))?;
        if s.len() > year_part.len() {
            let rest = s[year_part.len()..].trim();
            if rest != "(May-Sep)" {
                bail!("unrecognized season {s:?}");
            }
        }
        Ok(SeasonKey::new(year))
    }

    /// The seasons offered for a dataset: every offerable year present,
    /// ascending.
    pub fn offered_in(data: &Dataset) -> Vec<SeasonKey> {
        data.years()
            .into_iter()
            .map(SeasonKey::new)
            .filter(|s| s.is_offered())
            .collect()
    }
}

impl std::fmt::Display for SeasonKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn in_season<'a>(
    data: &'a Dataset,
    season: SeasonKey,
) -> impl Iterator<Item = &'a Observation> + 'a {
    data.rows().iter().filter(move |r| {
        r.month_start.year() == season.year && is_season_month(r.month_start.month())
    })
}

/// One heatmap marker: the seasonal mean at a location for one pollutant.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonCell {
    pub latitude: f64,
    pub longitude: f64,
    pub pollutant: Pollutant,
    pub mean: f64,
    /// `mean / max(mean over the season-pollutant group) * 500`; the
    /// maximum-value cell always maps to exactly 500.
    pub marker_size: f64,
}

/// Computes per-location, per-pollutant seasonal means with relative
/// marker sizes. A pollutant with no seasonal rows contributes no cells.
pub fn season_cells(data: &Dataset, season: SeasonKey) -> Vec<SeasonCell> {
    let mut keyed: Vec<(Pollutant, f64, f64, f64)> = in_season(data, season)
        .map(|r| (r.parameter, r.latitude, r.longitude, r.monthly_average))
        .collect();
    keyed.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.total_cmp(&b.2))
    });

    let mut cells = Vec::new();
    let mut i = 0;
    while i < keyed.len() {
        let (pollutant, lat, lon, _) = keyed[i];
        let mut values = Vec::new();
        while i < keyed.len() && keyed[i].0 == pollutant && keyed[i].1 == lat && keyed[i].2 == lon {
            values.push(keyed[i].3);
            i += 1;
        }
        cells.push(SeasonCell {
            latitude: lat,
            longitude: lon,
            pollutant,
            mean: mean(&values),
            marker_size: 0.0,
        });
    }

    for pollutant in Pollutant::ALL {
        let max = cells
            .iter()
            .filter(|c| c.pollutant == pollutant)
            .map(|c| c.mean)
            .fold(f64::NEG_INFINITY, f64::max);
        if max <= 0.0 {
            continue;
        }
        for cell in cells.iter_mut().filter(|c| c.pollutant == pollutant) {
            cell.marker_size = cell.mean / max * MAX_MARKER_SIZE;
        }
    }

    cells
}

/// One row of the seasonal aggregate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonTableRow {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Sensor Parameter")]
    pub parameter: Pollutant,
    #[serde(rename = "Unit")]
    pub unit: String,
    #[serde(rename = "Monthly Average")]
    pub monthly_average: f64,
    #[serde(rename = "Season")]
    pub season: String,
}

impl TableColumns for SeasonTableRow {
    // Must stay in step with the serde renames above.
    const COLUMNS: &'static [&'static str] =
        &["City", "Sensor Parameter", "Unit", "Monthly Average", "Season"];
}

/// Groups seasonal observations by (city, pollutant, unit) and attaches the
/// season label to each mean. Rows come back in grouping-key order.
pub fn aggregate_for_season(data: &Dataset, season: SeasonKey) -> Vec<SeasonTableRow> {
    let mut keyed: Vec<(&str, Pollutant, &str, f64)> = in_season(data, season)
        .map(|r| {
            (
                r.city.as_str(),
                r.parameter,
                r.unit.as_str(),
                r.monthly_average,
            )
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(b.2)));

    let label = season.label();
    let mut rows = Vec::new();
    let mut i = 0;
    while i < keyed.len() {
        let (city, pollutant, unit, _) = keyed[i];
        let mut values = Vec::new();
        while i < keyed.len() && keyed[i].0 == city && keyed[i].1 == pollutant && keyed[i].2 == unit
        {
            values.push(keyed[i].3);
            i += 1;
        }
        rows.push(SeasonTableRow {
            city: city.to_string(),
            parameter: pollutant,
            unit: unit.to_string(),
            monthly_average: mean(&values),
            season: label.clone(),
        });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn sample() -> Dataset {
        let csv = "\
Month Start (UTC),Latitude,Longitude,City,Sensor Parameter,Unit,Monthly Average
2021-05-01,55.15,-105.3,Buffalo Narrows,pm2.5,µg/m³,40.0
2021-07-01,55.15,-105.3,Buffalo Narrows,pm2.5,µg/m³,80.0
2021-06-01,49.88,-97.14,Winnipeg_Ellens,pm2.5,µg/m³,30.0
2021-07-01,49.88,-97.14,Winnipeg_Ellens,o₃,ppm,0.02
2021-12-01,49.88,-97.14,Winnipeg_Ellens,pm2.5,µg/m³,99.0
2020-07-01,49.88,-97.14,Winnipeg_Ellens,pm2.5,µg/m³,55.0
";
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_offered_season_boundaries() {
        assert!(!SeasonKey::new(2017).is_offered());
        assert!(SeasonKey::new(2018).is_offered());
        assert!(SeasonKey::new(2024).is_offered());
        assert!(!SeasonKey::new(2025).is_offered());
    }

    #[test]
    fn test_offered_in_skips_out_of_range_years() {
        let csv = "\
Month Start (UTC),Latitude,Longitude,City,Sensor Parameter,Unit,Monthly Average
2017-06-01,50.0,-100.0,A,pm2.5,µg/m³,1.0
2019-06-01,50.0,-100.0,A,pm2.5,µg/m³,1.0
2025-06-01,50.0,-100.0,A,pm2.5,µg/m³,1.0
";
        let data = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(SeasonKey::offered_in(&data), vec![SeasonKey::new(2019)]);
    }

    #[test]
    fn test_label_roundtrip() {
        let season = SeasonKey::new(2021);
        assert_eq!(season.label(), "2021 (May-Sep)");
        assert_eq!(SeasonKey::parse("2021 (May-Sep)").unwrap(), season);
        assert_eq!(SeasonKey::parse("2021").unwrap(), season);
        assert!(SeasonKey::parse("summer").is_err());
        assert!(SeasonKey::parse("2021 (Jun-Aug)").is_err());
    }

    #[test]
    fn test_season_cells_filter_and_mean() {
        let cells = season_cells(&sample(), SeasonKey::new(2021));
        // December 2021 and July 2020 rows are outside the season.
        assert_eq!(cells.len(), 3);

        let bn = cells
            .iter()
            .find(|c| c.latitude == 55.15 && c.pollutant == Pollutant::Pm25)
            .unwrap();
        assert_eq!(bn.mean, 60.0);
    }

    #[test]
    fn test_marker_size_scaling() {
        let cells = season_cells(&sample(), SeasonKey::new(2021));

        // Buffalo Narrows holds the PM2.5 maximum (60.0) and maps to 500;
        // Winnipeg (30.0) scales linearly to half of that.
        let bn = cells
            .iter()
            .find(|c| c.latitude == 55.15 && c.pollutant == Pollutant::Pm25)
            .unwrap();
        let wpg = cells
            .iter()
            .find(|c| c.latitude == 49.88 && c.pollutant == Pollutant::Pm25)
            .unwrap();
        assert_eq!(bn.marker_size, 500.0);
        assert_eq!(wpg.marker_size, 250.0);

        // The lone O₃ cell is its own maximum.
        let o3 = cells
            .iter()
            .find(|c| c.pollutant == Pollutant::O3)
            .unwrap();
        assert_eq!(o3.marker_size, 500.0);
    }

    #[test]
    fn test_missing_pollutant_contributes_no_cells() {
        let csv = "\
Month Start (UTC),Latitude,Longitude,City,Sensor Parameter,Unit,Monthly Average
2021-06-01,50.0,-100.0,A,pm2.5,µg/m³,5.0
";
        let data = Dataset::from_reader(csv.as_bytes()).unwrap();
        let cells = season_cells(&data, SeasonKey::new(2021));
        assert_eq!(cells.len(), 1);
        assert!(cells.iter().all(|c| c.pollutant == Pollutant::Pm25));
    }

    #[test]
    fn test_aggregate_for_season() {
        let rows = aggregate_for_season(&sample(), SeasonKey::new(2021));
        assert_eq!(rows.len(), 3);

        let bn = &rows[0];
        assert_eq!(bn.city, "Buffalo Narrows");
        assert_eq!(bn.parameter, Pollutant::Pm25);
        assert_eq!(bn.unit, "µg/m³");
        assert_eq!(bn.monthly_average, 60.0);
        assert_eq!(bn.season, "2021 (May-Sep)");
    }

    #[test]
    fn test_table_columns_match_serialized_header() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .serialize(&aggregate_for_season(&sample(), SeasonKey::new(2021))[0])
            .unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            out.lines().next().unwrap(),
            SeasonTableRow::COLUMNS.join(",")
        );
    }

    #[test]
    fn test_aggregate_for_unoffered_year_still_works() {
        // The table builder accepts seasons outside the offered range.
        let rows = aggregate_for_season(&sample(), SeasonKey::new(2020));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].monthly_average, 55.0);
        assert_eq!(rows[0].season, "2020 (May-Sep)");
    }

    #[test]
    fn test_empty_season_yields_empty_outputs() {
        let data = sample();
        assert!(season_cells(&data, SeasonKey::new(2018)).is_empty());
        assert!(aggregate_for_season(&data, SeasonKey::new(2018)).is_empty());
    }
}
