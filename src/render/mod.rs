//! Static raster rendering with plotters.
//!
//! Every chart draws onto a scoped in-memory bitmap surface that is
//! released before the PNG bytes are encoded; nothing here touches the
//! filesystem.

pub mod map;
pub mod trend_chart;

mod color;

pub(crate) use color::shade;

use anyhow::{Context, Result, anyhow};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackendError;
use std::io::Cursor;

pub(crate) type PlotResult = Result<(), DrawingAreaErrorKind<BitMapBackendError>>;

/// Runs `draw` against a scoped bitmap surface and encodes the result as
/// PNG bytes. The drawing buffer is released on every exit path, including
/// when `draw` fails.
pub(crate) fn draw_png<F>(width: u32, height: u32, draw: F) -> Result<Vec<u8>>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> PlotResult,
{
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow!("surface fill failed: {e}"))?;
        draw(&root).map_err(|e| anyhow!("chart rendering failed: {e}"))?;
        root.present()
            .map_err(|e| anyhow!("surface flush failed: {e}"))?;
    }

    let img = image::RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| anyhow!("bitmap buffer size mismatch"))?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .context("PNG encoding failed")?;
    Ok(png)
}

#[cfg(test)]
pub(crate) const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
