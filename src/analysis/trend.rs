//! The monthly trend aggregator.
//!
//! Filters the dataset by pollutant and city selection, computes per-city
//! and overall monthly means, and assembles everything the trend chart
//! needs, including the wildfire shading spans and the group's axis-mode
//! flag. Pure and deterministic.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

use crate::analysis::season::{SEASON_FIRST_MONTH, SEASON_LAST_MONTH};
use crate::analysis::util::mean;
use crate::dataset::{Dataset, Observation, Pollutant};
use crate::groups::{AxisMode, CityGroup};

/// A city needs at least this many distinct months to enter the trend.
pub const MIN_MONTHS: usize = 10;

/// Shading never covers 2025: the season is incomplete.
const SHADING_EXCLUDED_YEAR: i32 = 2025;

/// The outcome of the sample-size eligibility filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitySelection {
    /// Group cities with >= [`MIN_MONTHS`] distinct months, sorted.
    pub selected: Vec<String>,
    /// Group cities excluded for insufficient data, in group order.
    pub excluded: Vec<String>,
}

impl CitySelection {
    /// A warning line for the UI, present only when cities were excluded.
    pub fn warning(&self) -> Option<String> {
        if self.excluded.is_empty() {
            return None;
        }
        Some(format!(
            "Excluded cities with <{} months of data: {}",
            MIN_MONTHS,
            self.excluded.join(", ")
        ))
    }
}

/// Applies the >= 10 distinct-months eligibility filter to a group's cities.
pub fn select_cities(data: &Dataset, group: &CityGroup) -> CitySelection {
    let mut selected = Vec::new();
    let mut excluded = Vec::new();

    for city in group.city_names() {
        if data.month_count(city) >= MIN_MONTHS {
            selected.push(city.to_string());
        } else {
            excluded.push(city.to_string());
        }
    }

    selected.sort();
    selected.dedup();

    CitySelection { selected, excluded }
}

/// One point of a monthly time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPoint {
    pub month: NaiveDate,
    pub value: f64,
}

/// The monthly series for one (pollutant, city) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CitySeries {
    pub city: String,
    pub pollutant: Pollutant,
    pub points: Vec<MonthlyPoint>,
}

/// Everything the trend chart needs for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendBundle {
    /// The pollutant selection this bundle was computed for.
    pub pollutants: Vec<Pollutant>,
    /// Presentation flag threaded through from the group configuration.
    pub axis_mode: AxisMode,
    pub pm25_cities: Vec<CitySeries>,
    pub o3_cities: Vec<CitySeries>,
    /// All selected cities' PM2.5 rows grouped by month, mean per month.
    pub pm25_average: Vec<MonthlyPoint>,
    pub o3_average: Vec<MonthlyPoint>,
    /// Wildfire shading spans, May 1 through Sep 30 per year present.
    pub shading: Vec<(NaiveDate, NaiveDate)>,
    /// Sorted distinct years present in the filtered rows, for axis ticks.
    pub years: Vec<i32>,
}

impl TrendBundle {
    pub fn is_empty(&self) -> bool {
        self.pm25_cities.is_empty() && self.o3_cities.is_empty()
    }

    /// Earliest and latest month across every series.
    pub fn month_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let months: BTreeSet<NaiveDate> = self
            .pm25_cities
            .iter()
            .chain(&self.o3_cities)
            .flat_map(|s| s.points.iter().map(|p| p.month))
            .collect();
        Some((*months.first()?, *months.last()?))
    }
}

/// Computes the trend bundle for a pollutant selection, a city list, and the
/// active group.
///
/// An empty city list falls back to all cities carrying the selected
/// pollutants, so a group whose every city failed the eligibility filter
/// still yields an overall picture.
pub fn compute_trend(
    data: &Dataset,
    pollutants: &[Pollutant],
    cities: &[String],
    group: &CityGroup,
) -> TrendBundle {
    let rows: Vec<&Observation> = data
        .rows()
        .iter()
        .filter(|r| {
            pollutants.contains(&r.parameter)
                && (cities.is_empty() || cities.iter().any(|c| c == &r.city))
        })
        .collect();

    let mut pm25_cities = Vec::new();
    let mut o3_cities = Vec::new();
    for pollutant in Pollutant::ALL {
        if !pollutants.contains(&pollutant) {
            continue;
        }
        let names: BTreeSet<&str> = rows
            .iter()
            .filter(|r| r.parameter == pollutant)
            .map(|r| r.city.as_str())
            .collect();
        let target = match pollutant {
            Pollutant::Pm25 => &mut pm25_cities,
            Pollutant::O3 => &mut o3_cities,
        };
        for city in names {
            let points = monthly_means(
                rows.iter()
                    .filter(|r| r.parameter == pollutant && r.city == city)
                    .copied(),
            );
            target.push(CitySeries {
                city: city.to_string(),
                pollutant,
                points,
            });
        }
    }

    let average = |pollutant: Pollutant| {
        monthly_means(rows.iter().filter(|r| r.parameter == pollutant).copied())
    };
    let pm25_average = if pollutants.contains(&Pollutant::Pm25) {
        average(Pollutant::Pm25)
    } else {
        Vec::new()
    };
    let o3_average = if pollutants.contains(&Pollutant::O3) {
        average(Pollutant::O3)
    } else {
        Vec::new()
    };

    let years: Vec<i32> = rows
        .iter()
        .map(|r| r.month_start.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let shading = years
        .iter()
        .filter(|&&y| y != SHADING_EXCLUDED_YEAR)
        .map(|&y| {
            // May has 31 days and September 30, so both dates exist.
            (
                NaiveDate::from_ymd_opt(y, SEASON_FIRST_MONTH, 1).unwrap(),
                NaiveDate::from_ymd_opt(y, SEASON_LAST_MONTH, 30).unwrap(),
            )
        })
        .collect();

    TrendBundle {
        pollutants: pollutants.to_vec(),
        axis_mode: group.presentation.axis_mode,
        pm25_cities,
        o3_cities,
        pm25_average,
        o3_average,
        shading,
        years,
    }
}

/// Groups observations by month and takes the mean, one point per distinct
/// month, ascending. Duplicate rows for a month average together.
fn monthly_means<'a>(rows: impl Iterator<Item = &'a Observation>) -> Vec<MonthlyPoint> {
    let mut by_month: Vec<(NaiveDate, f64)> =
        rows.map(|r| (r.month_start, r.monthly_average)).collect();
    by_month.sort_by_key(|(month, _)| *month);

    let mut points = Vec::new();
    let mut i = 0;
    while i < by_month.len() {
        let month = by_month[i].0;
        let mut values = Vec::new();
        while i < by_month.len() && by_month[i].0 == month {
            values.push(by_month[i].1);
            i += 1;
        }
        points.push(MonthlyPoint {
            month,
            value: mean(&values),
        });
    }
    points
}
