//! Tests for contour tracing and rendering.

use opg_common::{GeoExtent, Grid};
use renderer::canvas::new_canvas;
use renderer::contour::{
    connect_segments, generate_contour_levels, march_squares, project_contours, render_contours, trace_contours,
    ContourConfig,
};
use renderer::{MapFrame, Rect};
use test_utils::{create_axis, create_geopotential_grid};

// ============================================================================
// Helpers
// ============================================================================

/// Cone peaking at the grid center.
fn cone(size: usize, peak: f64) -> Grid<f64> {
    let c = (size - 1) as f64 / 2.0;
    let data = (0..size * size)
        .map(|i| {
            let (r, col) = ((i / size) as f64, (i % size) as f64);
            peak - ((r - c).powi(2) + (col - c).powi(2)).sqrt()
        })
        .collect();
    Grid::new(size, size, data).unwrap()
}

fn frame() -> MapFrame {
    let extent = GeoExtent::new(0.0, 20.0, 0.0, 20.0).unwrap();
    MapFrame::new(extent, Rect::from_xywh(0.0, 0.0, 400.0, 400.0).unwrap())
}

// ============================================================================
// Tracing
// ============================================================================

#[test]
fn test_cone_gives_closed_rings() {
    let grid = cone(21, 10.0);
    let config = ContourConfig {
        levels: vec![2.5, 5.5, 8.5],
        smoothing_passes: 0,
        ..ContourConfig::default()
    };
    let contours = trace_contours(&grid, &config);
    assert_eq!(contours.len(), 3);
    assert!(contours.iter().all(|c| c.closed));

    // Each ring sits at its level's distance from the center
    for contour in &contours {
        let radius = 10.0 - contour.level;
        for p in &contour.points {
            let d = ((p.x as f64 - 10.0).powi(2) + (p.y as f64 - 10.0).powi(2)).sqrt();
            assert!((d - radius).abs() < 0.5, "level {} point at {}", contour.level, d);
        }
    }
}

#[test]
fn test_nan_cells_break_lines() {
    let mut data = vec![0.0; 5 * 5];
    for r in 0..5 {
        for c in 0..5 {
            data[r * 5 + c] = c as f64;
        }
    }
    let full = Grid::new(5, 5, data.clone()).unwrap();
    data[2 * 5 + 1] = f64::NAN;
    let holed = Grid::new(5, 5, data).unwrap();

    let full_lines = connect_segments(march_squares(&full, 1.5), 1.5);
    let holed_lines = connect_segments(march_squares(&holed, 1.5), 1.5);
    assert_eq!(full_lines.len(), 1);
    assert_eq!(holed_lines.len(), 2);
}

#[test]
fn test_levels_from_interval() {
    let levels = generate_contour_levels(5412.0, 5790.0, 60.0);
    assert_eq!(levels.first(), Some(&5460.0));
    assert_eq!(levels.last(), Some(&5760.0));
    assert_eq!(levels.len(), 6);
}

// ============================================================================
// Projection and rendering
// ============================================================================

#[test]
fn test_projection_uses_axes() {
    let grid = cone(21, 10.0);
    let config = ContourConfig {
        levels: vec![5.0],
        smoothing_passes: 0,
        ..ContourConfig::default()
    };
    let traced = trace_contours(&grid, &config);
    // Rows run north to south, so grid y=0 is the top of the frame
    let lats = create_axis(20.0, 0.0, 21);
    let lons = create_axis(0.0, 20.0, 21);
    let projected = project_contours(&traced, &lats, &lons, &frame());

    for (g, p) in traced[0].points.iter().zip(&projected[0].points) {
        assert!((p.x - g.x * 20.0).abs() < 1e-2);
        assert!((p.y - g.y * 20.0).abs() < 1e-2);
    }
}

#[test]
fn test_render_geopotential_with_labels() {
    let (cols, rows) = (41, 41);
    let height_m: Vec<f64> = create_geopotential_grid(cols, rows).iter().map(|z| z / 9.81).collect();
    let grid = Grid::new(rows, cols, height_m).unwrap();
    let lats = create_axis(20.0, 0.0, rows);
    let lons = create_axis(0.0, 20.0, cols);

    let (min, max) = grid.finite_range().unwrap();
    let config = ContourConfig {
        levels: generate_contour_levels(min, max, 60.0),
        label_spacing: 120.0,
        ..ContourConfig::default()
    };

    let mut pixmap = new_canvas(400, 400, [255, 255, 255, 255]).unwrap();
    let summary = render_contours(&mut pixmap, &frame(), &grid, &lats, &lons, &config).unwrap();

    assert!(summary.lines >= config.levels.len());
    assert!(!summary.labels.is_empty());
    for label in &summary.labels {
        assert!(config.levels.contains(&label.level));
        assert_eq!(label.text, format!("{:.0}", label.level));
        assert!(label.angle.abs() <= std::f32::consts::FRAC_PI_2 + 1e-4);
    }

    let inked = pixmap.pixels().iter().filter(|p| p.red() < 128).count();
    assert!(inked > 0);
}

#[test]
fn test_render_rejects_mismatched_axes() {
    let grid = cone(5, 3.0);
    let mut pixmap = new_canvas(50, 50, [255, 255, 255, 255]).unwrap();
    let config = ContourConfig {
        levels: vec![1.0],
        ..ContourConfig::default()
    };
    let result = render_contours(&mut pixmap, &frame(), &grid, &[0.0, 1.0], &[0.0, 1.0, 2.0, 3.0, 4.0], &config);
    assert!(result.is_err());
}
