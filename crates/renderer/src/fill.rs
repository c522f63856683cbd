//! Filled rasters: binned contour fills and categorical cell maps.

use opg_common::{Grid, OpgError, Shape};
use tiny_skia::{ColorU8, Paint, Pixmap, Rect, Transform};
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::frame::MapFrame;
use crate::style::LevelPalette;

/// Fractional position of `value` on a monotonic axis (ascending or
/// descending). `None` outside the axis or for a degenerate axis.
pub fn fractional_index(axis: &[f64], value: f64) -> Option<f64> {
    let n = axis.len();
    if n < 2 || !value.is_finite() {
        return None;
    }
    let ascending = axis[n - 1] > axis[0];
    let (lo, hi) = if ascending { (axis[0], axis[n - 1]) } else { (axis[n - 1], axis[0]) };
    if value < lo || value > hi {
        return None;
    }

    // First index whose value lies past `value` along the axis direction.
    let upper = if ascending {
        axis.partition_point(|a| *a <= value)
    } else {
        axis.partition_point(|a| *a >= value)
    };
    let i = upper.clamp(1, n - 1) - 1;
    let (a0, a1) = (axis[i], axis[i + 1]);
    let span = a1 - a0;
    if span == 0.0 {
        return Some(i as f64);
    }
    Some(i as f64 + ((value - a0) / span).clamp(0.0, 1.0))
}

/// Axis value at a fractional index, linear between neighbours.
pub fn axis_value(axis: &[f64], index: f64) -> f64 {
    let n = axis.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return axis[0];
    }
    let i = (index.floor().max(0.0) as usize).min(n - 2);
    let t = index - i as f64;
    axis[i] + t * (axis[i + 1] - axis[i])
}

/// Bilinear sample of `grid` at fractional (row, col).
///
/// If any of the four corners is missing the nearest corner is used, so
/// fills reach right up to a coastline of NaNs without bleeding across it.
pub fn sample_bilinear(grid: &Grid<f64>, row: f64, col: f64) -> f64 {
    let r0 = row.floor().max(0.0) as usize;
    let c0 = col.floor().max(0.0) as usize;
    let r1 = (r0 + 1).min(grid.rows() - 1);
    let c1 = (c0 + 1).min(grid.cols() - 1);
    let tr = row - r0 as f64;
    let tc = col - c0 as f64;

    let at = |r: usize, c: usize| grid.get(r, c).copied().unwrap_or(f64::NAN);
    let (v00, v01, v10, v11) = (at(r0, c0), at(r0, c1), at(r1, c0), at(r1, c1));

    if v00.is_finite() && v01.is_finite() && v10.is_finite() && v11.is_finite() {
        let top = v00 + (v01 - v00) * tc;
        let bottom = v10 + (v11 - v10) * tc;
        return top + (bottom - top) * tr;
    }

    let r = if tr < 0.5 { r0 } else { r1 };
    let c = if tc < 0.5 { c0 } else { c1 };
    at(r, c)
}

/// Check a field against its coordinate axes (rows = latitudes).
pub fn check_axes(grid: &Grid<f64>, latitudes: &[f64], longitudes: &[f64]) -> RenderResult<()> {
    let axes = Shape::new(latitudes.len(), longitudes.len());
    if grid.shape() != axes {
        return Err(OpgError::ShapeMismatch {
            left: "field".to_string(),
            left_shape: grid.shape(),
            right: "latitude x longitude axes".to_string(),
            right_shape: axes,
        }
        .into());
    }
    if grid.rows() < 2 || grid.cols() < 2 {
        return Err(RenderError::InvalidInput(format!(
            "field {} is too small to contour",
            grid.shape()
        )));
    }
    Ok(())
}

/// Fill the frame with `palette` colors from a bilinear sample of `grid` at
/// every pixel center. Pixels outside the grid or on missing data stay
/// untouched. Returns the number of pixels painted.
pub fn render_filled_contours(
    pixmap: &mut Pixmap,
    frame: &MapFrame,
    grid: &Grid<f64>,
    latitudes: &[f64],
    longitudes: &[f64],
    palette: &LevelPalette,
) -> RenderResult<usize> {
    check_axes(grid, latitudes, longitudes)?;

    let width = pixmap.width();
    let (x0, y0, x1, y1) = frame.pixel_bounds(width, pixmap.height());
    let colors: Vec<_> = palette
        .colors()
        .iter()
        .map(|c| ColorU8::from_rgba(c[0], c[1], c[2], c[3]).premultiply())
        .collect();

    let pixels = pixmap.pixels_mut();
    let mut painted = 0usize;
    for py in y0..y1 {
        let (_, lat) = frame.to_geo(0.0, py as f32 + 0.5);
        let Some(row) = fractional_index(latitudes, lat) else {
            continue;
        };
        for px in x0..x1 {
            let (lon, _) = frame.to_geo(px as f32 + 0.5, 0.0);
            let Some(col) = fractional_index(longitudes, lon) else {
                continue;
            };
            if let Some(bin) = palette.bin(sample_bilinear(grid, row, col)) {
                pixels[(py * width + px) as usize] = colors[bin];
                painted += 1;
            }
        }
    }

    debug!(painted, bins = colors.len(), "Filled contours");
    Ok(painted)
}

/// Paint one rectangle per grid cell of a 2-D lon/lat mesh.
///
/// Cell edges sit halfway to the neighbouring centers. `color_of(row, col)`
/// returns `None` to leave a cell empty. Returns the number of cells painted.
pub fn render_cells<F>(
    pixmap: &mut Pixmap,
    frame: &MapFrame,
    longitude: &Grid<f64>,
    latitude: &Grid<f64>,
    mut color_of: F,
) -> RenderResult<usize>
where
    F: FnMut(usize, usize) -> Option<[u8; 4]>,
{
    longitude.ensure_same_shape("longitude", latitude, "latitude")?;
    let mask = frame.clip_mask(pixmap.width(), pixmap.height());
    let (rows, cols) = (longitude.rows(), longitude.cols());

    let mut paint = Paint::default();
    paint.anti_alias = false;
    let mut painted = 0;

    for r in 0..rows {
        for c in 0..cols {
            let Some(color) = color_of(r, c) else {
                continue;
            };
            let (Some(&lon), Some(&lat)) = (longitude.get(r, c), latitude.get(r, c)) else {
                continue;
            };
            if !lon.is_finite() || !lat.is_finite() {
                continue;
            }

            let half_lon = half_spacing(longitude, r, c, false);
            let half_lat = half_spacing(latitude, r, c, true);
            let (xa, ya) = frame.to_pixel(lon - half_lon, lat + half_lat);
            let (xb, yb) = frame.to_pixel(lon + half_lon, lat - half_lat);
            let Some(rect) = Rect::from_ltrb(xa.min(xb), ya.min(yb), xa.max(xb), ya.max(yb)) else {
                continue;
            };

            paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
            pixmap.fill_rect(rect, &paint, Transform::identity(), mask.as_ref());
            painted += 1;
        }
    }
    Ok(painted)
}

/// Half the distance to the next center along a row (`along_rows == false`)
/// or a column, falling back to the previous neighbour at the edge.
fn half_spacing(coords: &Grid<f64>, r: usize, c: usize, along_rows: bool) -> f64 {
    let here = coords.get(r, c).copied().unwrap_or(f64::NAN);
    let neighbour = if along_rows {
        coords.get(r + 1, c).or_else(|| r.checked_sub(1).and_then(|p| coords.get(p, c)))
    } else {
        coords.get(r, c + 1).or_else(|| c.checked_sub(1).and_then(|p| coords.get(r, p)))
    };
    match neighbour {
        Some(n) if n.is_finite() && (*n - here).abs() > 0.0 => (*n - here).abs() / 2.0,
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractional_index_both_directions() {
        let up = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(fractional_index(&up, 1.5), Some(1.5));
        assert_eq!(fractional_index(&up, 3.0), Some(3.0));
        assert_eq!(fractional_index(&up, 3.1), None);

        let down = [50.0, 49.0, 48.0];
        assert_eq!(fractional_index(&down, 49.0), Some(1.0));
        assert_eq!(fractional_index(&down, 48.5), Some(1.5));
        assert_eq!(fractional_index(&down, 50.0), Some(0.0));
        assert_eq!(fractional_index(&down, 51.0), None);
    }

    #[test]
    fn test_axis_value_inverts_index() {
        let down = [50.0, 49.0, 48.0];
        assert_eq!(axis_value(&down, 1.5), 48.5);
        assert_eq!(axis_value(&down, 2.0), 48.0);
    }

    #[test]
    fn test_bilinear_center() {
        let g = Grid::new(2, 2, vec![0.0, 10.0, 20.0, 30.0]).unwrap();
        assert_eq!(sample_bilinear(&g, 0.5, 0.5), 15.0);
        assert_eq!(sample_bilinear(&g, 1.0, 1.0), 30.0);
    }

    #[test]
    fn test_bilinear_nearest_near_nan() {
        let g = Grid::new(2, 2, vec![f64::NAN, 10.0, 20.0, 30.0]).unwrap();
        assert_eq!(sample_bilinear(&g, 0.9, 0.9), 30.0);
        assert!(sample_bilinear(&g, 0.1, 0.1).is_nan());
    }

    #[test]
    fn test_check_axes() {
        let g = Grid::filled(3, 4, 0.0);
        assert!(check_axes(&g, &[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0, 3.0]).is_ok());
        let err = check_axes(&g, &[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(err, RenderError::Opg(OpgError::ShapeMismatch { .. })));
    }
}
