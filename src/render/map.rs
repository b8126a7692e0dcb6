//! The seasonal geographic heatmap.

use anyhow::Result;
use plotters::prelude::*;

use crate::analysis::season::{SeasonCell, SeasonKey};
use crate::dataset::Pollutant;
use crate::render::draw_png;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 800;

// Canada-focused bounding box.
const LON_MIN: f64 = -165.0;
const LON_MAX: f64 = -52.0;
const LAT_MIN: f64 = 40.0;
const LAT_MAX: f64 = 83.0;

const MARKER_ALPHA: f64 = 0.6;

fn pollutant_color(pollutant: Pollutant) -> RGBColor {
    match pollutant {
        Pollutant::Pm25 => RED,
        Pollutant::O3 => RGBColor(0x80, 0x00, 0x80),
    }
}

/// Converts a 0..=500 marker size into a pixel radius. Sizes scale by area,
/// so the radius grows with the square root.
fn marker_radius(size: f64) -> i32 {
    (size.max(0.0).sqrt().round() as i32).max(1)
}

/// Renders the per-season scatter map as PNG bytes.
///
/// A pollutant with no cells gets no layer and no legend entry.
pub fn render_season_map(cells: &[SeasonCell], season: SeasonKey) -> Result<Vec<u8>> {
    draw_png(WIDTH, HEIGHT, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(
                format!("Air Quality in Canada - {}", season.label()),
                ("sans-serif", 24),
            )
            .margin(12)
            .x_label_area_size(36)
            .y_label_area_size(46)
            .build_cartesian_2d(LON_MIN..LON_MAX, LAT_MIN..LAT_MAX)?;

        chart
            .configure_mesh()
            .x_desc("Longitude")
            .y_desc("Latitude")
            .light_line_style(&RGBColor(230, 230, 230))
            .draw()?;

        for pollutant in Pollutant::ALL {
            let layer: Vec<&SeasonCell> =
                cells.iter().filter(|c| c.pollutant == pollutant).collect();
            if layer.is_empty() {
                continue;
            }

            let color = pollutant_color(pollutant);
            chart
                .draw_series(layer.iter().map(|c| {
                    Circle::new(
                        (c.longitude, c.latitude),
                        marker_radius(c.marker_size),
                        color.mix(MARKER_ALPHA).filled(),
                    )
                }))?
                .label(pollutant.to_string())
                .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.mix(MARKER_ALPHA).filled()));
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
