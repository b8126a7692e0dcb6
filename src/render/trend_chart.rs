//! The monthly trend chart.
//!
//! Combined mode renders one plot region with PM2.5 on the primary axis and
//! O₃ on a secondary axis; split mode stacks a PM2.5 peak band above the
//! main band. The axis decision arrives as the bundle's [`AxisMode`] flag,
//! never inferred here.

use anyhow::Result;
use chrono::{Datelike, Months, NaiveDate};
use plotters::prelude::*;

use crate::analysis::trend::{CitySeries, MonthlyPoint, TrendBundle};
use crate::groups::{AxisMode, CityGroup, Presentation};
use crate::render::{PlotResult, draw_png, shade};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;

/// Pixel height of the peak band in a split chart.
const PEAK_PANEL_HEIGHT: i32 = 170;

const SHADING_COLOR: RGBColor = RGBColor(0xFF, 0xA5, 0x00);
const SHADING_ALPHA: f64 = 0.2;
const CITY_LINE_ALPHA: f64 = 0.3;

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

/// Lightness cycle applied to per-city lines, so neighbours stay
/// distinguishable within the group color.
fn lightness_factor(idx: usize) -> f64 {
    0.8 + (idx % 5) as f64 * 0.1
}

fn points(series: &[MonthlyPoint]) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
    series.iter().map(|p| (p.month, p.value))
}

/// The x-axis range: first month through one month past the last, so the
/// final point never sits on the frame. Falls back to a fixed window when
/// the bundle has no data.
fn month_range(bundle: &TrendBundle) -> std::ops::Range<NaiveDate> {
    match bundle.month_span() {
        Some((first, last)) => first..last + Months::new(1),
        None => {
            let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
            start..start + Months::new(12)
        }
    }
}

/// Upper bound for the secondary O₃ axis, padded above the largest value.
fn o3_axis_top(bundle: &TrendBundle) -> f64 {
    let max = bundle
        .o3_cities
        .iter()
        .flat_map(|s| s.points.iter())
        .chain(bundle.o3_average.iter())
        .map(|p| p.value)
        .fold(0.0_f64, f64::max);
    if max > 0.0 { max * 1.15 } else { 0.05 }
}

fn title(bundle: &TrendBundle) -> String {
    let names: Vec<String> = bundle.pollutants.iter().map(ToString::to_string).collect();
    format!("Monthly {} Averages", names.join(", "))
}

/// Renders the trend chart for a computed bundle as PNG bytes.
pub fn render_trend(bundle: &TrendBundle, group: &CityGroup) -> Result<Vec<u8>> {
    let presentation = group.presentation;
    match bundle.axis_mode {
        AxisMode::Combined => render_combined(bundle, presentation),
        AxisMode::Split => render_split(bundle, presentation),
    }
}

fn render_combined(bundle: &TrendBundle, presentation: Presentation) -> Result<Vec<u8>> {
    let x_range = month_range(bundle);
    let (y_low, y_high) = presentation.pm25_main_band;
    let o3_top = o3_axis_top(bundle);
    let caption = title(bundle);

    draw_png(WIDTH, HEIGHT, move |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(&caption, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(34)
            .y_label_area_size(52)
            .right_y_label_area_size(52)
            .build_cartesian_2d(x_range.clone(), y_low..y_high)?
            .set_secondary_coord(x_range.clone(), 0.0..o3_top);

        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("PM2.5 (µg/m³)")
            .x_labels(bundle.years.len().max(1))
            .x_label_formatter(&|d: &NaiveDate| d.year().to_string())
            .light_line_style(&RGBColor(235, 235, 235))
            .draw()?;
        chart
            .configure_secondary_axes()
            .y_desc("O₃ (ppm)")
            .draw()?;

        draw_shading(&mut *chart, &bundle.shading, (y_low, y_high))?;
        draw_city_lines(&mut *chart, &bundle.pm25_cities, presentation.pm25_color)?;

        for (idx, series) in bundle.o3_cities.iter().enumerate() {
            let color = shade(presentation.o3_color, lightness_factor(idx));
            chart.draw_secondary_series(LineSeries::new(
                points(&series.points),
                color.mix(CITY_LINE_ALPHA).stroke_width(1),
            ))?;
        }

        if !bundle.pm25_average.is_empty() {
            let color = rgb(presentation.pm25_color);
            chart
                .draw_series(LineSeries::new(
                    points(&bundle.pm25_average),
                    color.stroke_width(2),
                ))?
                .label("Average PM2.5")
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
        }
        if !bundle.o3_average.is_empty() {
            let color = rgb(presentation.o3_color);
            chart
                .draw_secondary_series(LineSeries::new(
                    points(&bundle.o3_average),
                    color.stroke_width(2),
                ))?
                .label("Average O₃")
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.7))
            .border_style(&BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;

        Ok(())
    })
}

fn render_split(bundle: &TrendBundle, presentation: Presentation) -> Result<Vec<u8>> {
    let x_range = month_range(bundle);
    let peak = presentation.pm25_peak_band;
    let main = presentation.pm25_main_band;
    let o3_top = o3_axis_top(bundle);
    let caption = title(bundle);

    draw_png(WIDTH, HEIGHT, move |root| {
        let root = root.titled(&caption, ("sans-serif", 22))?;
        let (upper_area, lower_area) = root.split_vertically(PEAK_PANEL_HEIGHT);

        // Peak band: PM2.5 spikes only, no x labels.
        let mut upper = ChartBuilder::on(&upper_area)
            .margin(12)
            .x_label_area_size(0)
            .y_label_area_size(52)
            .right_y_label_area_size(52)
            .build_cartesian_2d(x_range.clone(), peak.0..peak.1)?;
        upper
            .configure_mesh()
            .y_desc("PM2.5 (µg/m³)")
            .x_labels(0)
            .light_line_style(&RGBColor(235, 235, 235))
            .draw()?;

        draw_shading(&mut upper, &bundle.shading, peak)?;
        draw_city_lines(&mut upper, &bundle.pm25_cities, presentation.pm25_color)?;
        if !bundle.pm25_average.is_empty() {
            let color = rgb(presentation.pm25_color);
            upper.draw_series(LineSeries::new(
                points(&bundle.pm25_average),
                color.stroke_width(2),
            ))?;
        }

        // Main band with the secondary O₃ axis.
        let mut lower = ChartBuilder::on(&lower_area)
            .margin(12)
            .x_label_area_size(34)
            .y_label_area_size(52)
            .right_y_label_area_size(52)
            .build_cartesian_2d(x_range.clone(), main.0..main.1)?
            .set_secondary_coord(x_range.clone(), 0.0..o3_top);
        lower
            .configure_mesh()
            .x_desc("Year")
            .y_desc("PM2.5 (µg/m³)")
            .x_labels(bundle.years.len().max(1))
            .x_label_formatter(&|d: &NaiveDate| d.year().to_string())
            .light_line_style(&RGBColor(235, 235, 235))
            .draw()?;
        lower
            .configure_secondary_axes()
            .y_desc("O₃ (ppm)")
            .draw()?;

        draw_shading(&mut *lower, &bundle.shading, main)?;
        draw_city_lines(&mut *lower, &bundle.pm25_cities, presentation.pm25_color)?;

        for (idx, series) in bundle.o3_cities.iter().enumerate() {
            let color = shade(presentation.o3_color, lightness_factor(idx));
            lower.draw_secondary_series(LineSeries::new(
                points(&series.points),
                color.mix(CITY_LINE_ALPHA).stroke_width(1),
            ))?;
        }

        if !bundle.pm25_average.is_empty() {
            let color = rgb(presentation.pm25_color);
            lower
                .draw_series(LineSeries::new(
                    points(&bundle.pm25_average),
                    color.stroke_width(2),
                ))?
                .label("Average PM2.5")
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
        }
        if !bundle.o3_average.is_empty() {
            let color = rgb(presentation.o3_color);
            lower
                .draw_secondary_series(LineSeries::new(
                    points(&bundle.o3_average),
                    color.stroke_width(2),
                ))?
                .label("Average O₃")
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
        }

        lower
            .configure_series_labels()
            .background_style(&WHITE.mix(0.7))
            .border_style(&BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;

        Ok(())
    })
}

/// Shades the wildfire spans across one plot region.
fn draw_shading<DB, Y>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedDate<NaiveDate>, Y>>,
    spans: &[(NaiveDate, NaiveDate)],
    band: (f64, f64),
) -> PlotResult
where
    DB: DrawingBackend<ErrorType = plotters_bitmap::BitMapBackendError>,
    Y: plotters::coord::ranged1d::Ranged<ValueType = f64>,
{
    for &(start, end) in spans {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(start, band.0), (end, band.1)],
            SHADING_COLOR.mix(SHADING_ALPHA).filled(),
        )))?;
    }
    Ok(())
}

/// Draws the translucent per-city PM2.5 lines with the lightness cycle.
fn draw_city_lines<DB, Y>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedDate<NaiveDate>, Y>>,
    series: &[CitySeries],
    base_color: (u8, u8, u8),
) -> PlotResult
where
    DB: DrawingBackend<ErrorType = plotters_bitmap::BitMapBackendError>,
    Y: plotters::coord::ranged1d::Ranged<ValueType = f64>,
{
    for (idx, city) in series.iter().enumerate() {
        let color = shade(base_color, lightness_factor(idx));
        chart.draw_series(LineSeries::new(
            points(&city.points),
            color.mix(CITY_LINE_ALPHA).stroke_width(1),
        ))?;
    }
    Ok(())
}
