//! End-to-end pipeline tests over the sample CSV fixture: load, eligibility
//! filtering, trend aggregation, seasonal aggregation, and map caching.

use chrono::{Datelike, NaiveDate};
use wildfire_aq::analysis::season::{SeasonKey, aggregate_for_season, season_cells};
use wildfire_aq::analysis::trend::{compute_trend, select_cities};
use wildfire_aq::cache::SeasonMapCache;
use wildfire_aq::dataset::{Dataset, Pollutant};
use wildfire_aq::groups::{AxisMode, GroupCatalog, OPPOSITION_ZONES, SYNERGY_ZONES};
use wildfire_aq::render::trend_chart::render_trend;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn load_fixture() -> Dataset {
    let bytes: &[u8] = include_bytes!("fixtures/air_quality_sample.csv");
    Dataset::from_reader(bytes).expect("fixture should load")
}

#[test]
fn test_fixture_loads_and_normalizes() {
    let data = load_fixture();
    assert!(!data.is_empty());
    assert_eq!(data.years(), vec![2017, 2021, 2025]);
    // Every month_start sits on the first of its month.
    assert!(data.rows().iter().all(|r| r.month_start.day() == 1));
}

#[test]
fn test_trend_pipeline_for_synergy_zones() {
    let data = load_fixture();
    let catalog = GroupCatalog::builtin();
    let group = catalog.group(SYNERGY_ZONES).unwrap();

    let selection = select_cities(&data, group);
    assert_eq!(
        selection.selected,
        vec!["Buffalo Narrows".to_string(), "Winnipeg_Ellens".to_string()]
    );
    assert!(selection.excluded.is_empty());
    assert!(selection.warning().is_none());

    let bundle = compute_trend(&data, &Pollutant::ALL, &selection.selected, group);
    assert_eq!(bundle.axis_mode, AxisMode::Split);

    // Buffalo Narrows July 2017 peak survives aggregation intact.
    let bn = bundle
        .pm25_cities
        .iter()
        .find(|s| s.city == "Buffalo Narrows")
        .unwrap();
    let july_2017 = bn
        .points
        .iter()
        .find(|p| p.month == NaiveDate::from_ymd_opt(2017, 7, 1).unwrap())
        .unwrap();
    assert_eq!(july_2017.value, 120.0);

    // Shading covers 2017 and 2021 but never 2025.
    let shaded_years: Vec<i32> = bundle.shading.iter().map(|(start, _)| start.year()).collect();
    assert_eq!(shaded_years, vec![2017, 2021]);
    for (start, end) in &bundle.shading {
        assert_eq!((start.month(), start.day()), (5, 1));
        assert_eq!((end.month(), end.day()), (9, 30));
    }

    let png = render_trend(&bundle, group).unwrap();
    assert_eq!(&png[..8], &PNG_MAGIC);
}

#[test]
fn test_trend_pipeline_for_opposition_zones_falls_back() {
    let data = load_fixture();
    let catalog = GroupCatalog::builtin();
    let group = catalog.group(OPPOSITION_ZONES).unwrap();

    // Thunder Bay has only 4 months; the whole group fails eligibility.
    let selection = select_cities(&data, group);
    assert!(selection.selected.is_empty());
    let warning = selection.warning().unwrap();
    assert!(warning.contains("Thunder Bay"));

    // The insight table degrades to empty without erroring.
    assert!(group.insight_rows(&selection.selected).is_empty());

    // The trend falls back to all cities carrying the selected pollutants.
    let bundle = compute_trend(&data, &Pollutant::ALL, &selection.selected, group);
    assert_eq!(bundle.axis_mode, AxisMode::Combined);
    assert!(!bundle.pm25_cities.is_empty());
    assert!(!bundle.pm25_average.is_empty());

    let png = render_trend(&bundle, group).unwrap();
    assert_eq!(&png[..8], &PNG_MAGIC);
}

#[test]
fn test_seasonal_aggregates_and_map_cache() {
    let data = load_fixture();

    // 2021 season: cells for both pollutants, max marker at 500.
    let cells = season_cells(&data, SeasonKey::new(2021));
    assert!(cells.iter().any(|c| c.pollutant == Pollutant::Pm25));
    assert!(cells.iter().any(|c| c.pollutant == Pollutant::O3));
    let max_pm25 = cells
        .iter()
        .filter(|c| c.pollutant == Pollutant::Pm25)
        .map(|c| c.marker_size)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(max_pm25, 500.0);

    let rows = aggregate_for_season(&data, SeasonKey::new(2021));
    assert!(rows.iter().all(|r| r.season == "2021 (May-Sep)"));
    let tb = rows.iter().find(|r| r.city == "Thunder Bay").unwrap();
    assert_eq!(tb.unit, "µg/m³");

    // The 2017 table works even though 2017 is not an offered map season.
    let rows_2017 = aggregate_for_season(&data, SeasonKey::new(2017));
    let bn = rows_2017
        .iter()
        .find(|r| r.city == "Buffalo Narrows" && r.parameter == Pollutant::Pm25)
        .unwrap();
    // Season months are May-Sep 2017: values 13, 14, 120, 16, 17.
    assert_eq!(bn.monthly_average, 36.0);
    assert_eq!(bn.unit, "µg/m³");

    // The cache offers 2021 only: 2017 predates the range, 2025 is excluded.
    let cache = SeasonMapCache::build(&data).unwrap();
    assert_eq!(cache.seasons(), vec![SeasonKey::new(2021)]);
    let png = cache.get(SeasonKey::new(2021)).unwrap();
    assert_eq!(&png[..8], &PNG_MAGIC);
    assert!(cache.get(SeasonKey::new(2025)).is_none());
}
