//! Wind barbs drawn from generated SVG glyphs.
//!
//! Each barb is an SVG document on a 100x100 canvas with the station at
//! the center and the staff pointing up (wind from the north). Pennants are
//! 50 knots, full barbs 10, half barbs 5; calm winds draw a circle. The
//! glyph is parsed with `usvg` once per knot value and rasterised with
//! `resvg`, rotated to the meteorological direction the wind blows from.

use std::collections::HashMap;
use std::f64::consts::PI;

use opg_common::Grid;
use tiny_skia::{Pixmap, Transform};
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::fill::check_axes;
use crate::frame::MapFrame;

/// m/s to knots
pub const MS_TO_KNOTS: f64 = 1.94384;

/// Side of the SVG canvas in user units.
const GLYPH_CANVAS: f32 = 100.0;

/// Configuration for wind barb rendering
#[derive(Debug, Clone)]
pub struct BarbConfig {
    /// Rendered size of the 100x100 glyph canvas in pixels
    pub size: f32,
    /// Draw every `stride`-th grid point along both axes
    pub stride: usize,
    /// Barb color, hex
    pub color: String,
    /// Multiplier from the field's units to knots
    pub knots_per_unit: f64,
}

impl Default for BarbConfig {
    fn default() -> Self {
        Self {
            size: 28.0,
            stride: 5,
            color: "#000000".to_string(),
            knots_per_unit: MS_TO_KNOTS,
        }
    }
}

/// One barb placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindBarb {
    pub row: usize,
    pub col: usize,
    pub x: f32,
    pub y: f32,
    /// Speed rounded to 5 knots
    pub knots: u32,
    /// Direction the wind blows from, degrees clockwise from north
    pub direction_deg: f64,
}

/// Convert U and V wind components to speed and direction.
///
/// Returns `(speed, direction_rad)`; the direction is the math angle
/// (counterclockwise from east) of the vector pointing where the wind comes
/// FROM, normalized to [0, 2π).
pub fn uv_to_speed_direction(u: f64, v: f64) -> (f64, f64) {
    let speed = (u * u + v * v).sqrt();
    let mut direction = (-v).atan2(-u);
    if direction < 0.0 {
        direction += 2.0 * PI;
    }
    (speed, direction)
}

/// Math angle to meteorological degrees (0 = from north, 90 = from east).
pub fn meteorological_direction(direction_rad: f64) -> f64 {
    (90.0 - direction_rad.to_degrees()).rem_euclid(360.0)
}

/// Speed in knots rounded to the nearest 5.
pub fn round_knots(knots: f64) -> u32 {
    if !knots.is_finite() || knots <= 0.0 {
        return 0;
    }
    ((knots / 5.0).round() * 5.0) as u32
}

/// Number of (pennants, full barbs, half barbs) for a rounded speed.
pub fn barb_parts(knots: u32) -> (u32, u32, u32) {
    let pennants = knots / 50;
    let rest = knots % 50;
    (pennants, rest / 10, (rest % 10) / 5)
}

/// SVG document for a barb of `knots` (already rounded), staff pointing up.
pub fn barb_svg(knots: u32, color: &str) -> String {
    let c = GLYPH_CANVAS / 2.0;
    let mut body = String::new();

    if knots == 0 {
        body.push_str(&format!(
            r#"<circle cx="{c}" cy="{c}" r="9" fill="none" stroke="{color}" stroke-width="4"/>"#
        ));
    } else {
        let tip = 4.0;
        let step = 9.0;
        let reach = 30.0;
        body.push_str(&format!(
            r#"<line x1="{c}" y1="{c}" x2="{c}" y2="{tip}" stroke="{color}" stroke-width="4" stroke-linecap="round"/>"#
        ));

        let (pennants, full, half) = barb_parts(knots);
        let mut y = tip;
        for _ in 0..pennants {
            body.push_str(&format!(
                r#"<polygon points="{c},{y} {x},{y} {c},{y2}" fill="{color}"/>"#,
                x = c + reach,
                y2 = y + step,
            ));
            y += step + 2.0;
        }
        // A lone half barb sits one step in from the tip so it reads as 5 kt
        if pennants == 0 && full == 0 {
            y += step;
        }
        for _ in 0..full {
            body.push_str(&feather(c, y, reach, color));
            y += step;
        }
        for _ in 0..half {
            body.push_str(&feather(c, y, reach / 2.0, color));
        }
    }

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{s}" height="{s}" viewBox="0 0 {s} {s}">{body}</svg>"#,
        s = GLYPH_CANVAS
    )
}

fn feather(c: f32, y: f32, length: f32, color: &str) -> String {
    format!(
        r#"<line x1="{c}" y1="{y}" x2="{x}" y2="{y2}" stroke="{color}" stroke-width="4" stroke-linecap="round"/>"#,
        x = c + length,
        y2 = y - length / 3.0,
    )
}

/// Grid indices to draw: every `stride`-th row and column, starting at 0.
pub fn subsample_indices(rows: usize, cols: usize, stride: usize) -> Vec<(usize, usize)> {
    let stride = stride.max(1);
    (0..rows)
        .step_by(stride)
        .flat_map(|r| (0..cols).step_by(stride).map(move |c| (r, c)))
        .collect()
}

/// Barbs that would be drawn for the given wind components.
///
/// Points with missing data or outside the frame are skipped.
pub fn plan_barbs(
    frame: &MapFrame,
    u: &Grid<f64>,
    v: &Grid<f64>,
    latitudes: &[f64],
    longitudes: &[f64],
    config: &BarbConfig,
) -> RenderResult<Vec<WindBarb>> {
    check_axes(u, latitudes, longitudes)?;
    u.ensure_same_shape("u wind", v, "v wind")?;

    let mut barbs = Vec::new();
    for (row, col) in subsample_indices(u.rows(), u.cols(), config.stride) {
        let (Some(&uu), Some(&vv)) = (u.get(row, col), v.get(row, col)) else {
            continue;
        };
        if !uu.is_finite() || !vv.is_finite() {
            continue;
        }
        let (x, y) = frame.to_pixel(longitudes[col], latitudes[row]);
        if !frame.contains_pixel(x, y) {
            continue;
        }
        let (speed, direction) = uv_to_speed_direction(uu, vv);
        barbs.push(WindBarb {
            row,
            col,
            x,
            y,
            knots: round_knots(speed * config.knots_per_unit),
            direction_deg: meteorological_direction(direction),
        });
    }
    Ok(barbs)
}

/// Draw wind barbs onto `pixmap`. Returns the barbs drawn.
pub fn render_wind_barbs(
    pixmap: &mut Pixmap,
    frame: &MapFrame,
    u: &Grid<f64>,
    v: &Grid<f64>,
    latitudes: &[f64],
    longitudes: &[f64],
    config: &BarbConfig,
) -> RenderResult<Vec<WindBarb>> {
    let barbs = plan_barbs(frame, u, v, latitudes, longitudes, config)?;

    let options = usvg::Options::default();
    let mut glyphs: HashMap<u32, usvg::Tree> = HashMap::new();
    let scale = config.size / GLYPH_CANVAS;
    let center = GLYPH_CANVAS / 2.0;

    for barb in &barbs {
        if !glyphs.contains_key(&barb.knots) {
            let svg = barb_svg(barb.knots, &config.color);
            let tree = usvg::Tree::from_str(&svg, &options)
                .map_err(|e| RenderError::Svg(format!("barb {} kt: {}", barb.knots, e)))?;
            glyphs.insert(barb.knots, tree);
        }
        let Some(tree) = glyphs.get(&barb.knots) else {
            continue;
        };

        let transform = Transform::from_translate(-center, -center)
            .post_rotate(barb.direction_deg as f32)
            .post_scale(scale, scale)
            .post_translate(barb.x, barb.y);
        resvg::render(tree, transform, &mut pixmap.as_mut());
    }

    debug!(barbs = barbs.len(), glyphs = glyphs.len(), "Rendered wind barbs");
    Ok(barbs)
}
