//! Contour line (isoline) rendering using marching squares algorithm.
//!
//! Lines are traced in grid index space (x = column, y = row), smoothed,
//! then projected through the field's latitude/longitude axes onto a
//! [`MapFrame`] and stroked with inline value labels.

use opg_common::Grid;
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::debug;

use crate::error::RenderResult;
use crate::fill::{axis_value, check_axes};
use crate::frame::MapFrame;
use crate::style::format_level;
use crate::text::{self, Anchor, TextStyle};

/// A point in 2D space (grid or pixel coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f64,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Configuration for contour rendering
#[derive(Debug, Clone)]
pub struct ContourConfig {
    /// Contour levels to draw
    pub levels: Vec<f64>,
    /// Line width in pixels
    pub line_width: f32,
    /// Line color [R, G, B, A]
    pub line_color: [u8; 4],
    /// Number of Chaikin smoothing passes (0 = no smoothing)
    pub smoothing_passes: u32,
    pub labels_enabled: bool,
    /// Label cap height in pixels
    pub label_font_size: f32,
    /// Distance between labels along a line, in pixels
    pub label_spacing: f32,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            levels: vec![],
            line_width: 1.5,
            line_color: [0, 0, 0, 255],
            smoothing_passes: 1,
            labels_enabled: true,
            label_font_size: 9.0,
            label_spacing: 160.0,
        }
    }
}

impl ContourConfig {
    /// Label text for a level, precise enough for the level spacing.
    pub fn level_label(&self, level: f64) -> String {
        let step = self
            .levels
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(f64::INFINITY, f64::min);
        format_level(level, if step.is_finite() { step } else { 1.0 })
    }
}

/// Multiples of `interval` within `[min_value, max_value]`.
pub fn generate_contour_levels(min_value: f64, max_value: f64, interval: f64) -> Vec<f64> {
    if interval.is_nan() || interval <= 0.0 || min_value.is_nan() || max_value.is_nan() || max_value <= min_value {
        return vec![];
    }

    let first = (min_value / interval).ceil() as i64;
    let last = (max_value / interval).floor() as i64;
    (first..=last).map(|i| i as f64 * interval).collect()
}

/// Marching squares over a row-major grid.
///
/// Cells touching a NaN are skipped. Corners at exactly `level` count as
/// above it.
pub fn march_squares(grid: &Grid<f64>, level: f64) -> Vec<Segment> {
    let (height, width) = (grid.rows(), grid.cols());
    if width < 2 || height < 2 {
        return vec![];
    }

    let data = grid.as_slice();
    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0u8;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            segments.extend(cell_segments(cell_index, x as f32, y as f32, [tl, tr, br, bl], level));
        }
    }

    segments
}

/// Segments for one cell. Corners are `[tl, tr, br, bl]`.
fn cell_segments(cell_index: u8, x: f32, y: f32, corners: [f64; 4], level: f64) -> Vec<Segment> {
    let [tl, tr, br, bl] = corners;
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    let seg = |start: Point, end: Point| Segment { start, end };
    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![seg(left, top)],
        2 | 13 => vec![seg(top, right)],
        3 | 12 => vec![seg(left, right)],
        4 | 11 => vec![seg(right, bottom)],
        // Saddles: resolve by the cell mean
        5 | 10 => {
            let above = (tl + tr + br + bl) / 4.0 >= level;
            if (cell_index == 5) == above {
                vec![seg(left, bottom), seg(top, right)]
            } else {
                vec![seg(left, top), seg(right, bottom)]
            }
        }
        6 | 9 => vec![seg(top, bottom)],
        7 | 8 => vec![seg(left, bottom)],
        _ => vec![],
    }
}

/// Where `level` crosses the edge between two corner values.
fn interpolate_edge(x1: f32, y1: f32, x2: f32, y2: f32, val1: f64, val2: f64, level: f64) -> Point {
    if (val2 - val1).abs() < 1e-12 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }
    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0) as f32;
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Join unordered segments into polylines, growing each line at both ends.
pub fn connect_segments(segments: Vec<Segment>, level: f64) -> Vec<Contour> {
    const EPSILON: f32 = 0.001;

    let mut contours = Vec::new();
    let mut used = vec![false; segments.len()];

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let mut points = std::collections::VecDeque::from([segments[start_idx].start, segments[start_idx].end]);

        for at_back in [true, false] {
            loop {
                let tip = if at_back { points[points.len() - 1] } else { points[0] };
                let next = segments.iter().enumerate().find_map(|(i, seg)| {
                    if used[i] {
                        None
                    } else if seg.start.distance(&tip) < EPSILON {
                        Some((i, seg.end))
                    } else if seg.end.distance(&tip) < EPSILON {
                        Some((i, seg.start))
                    } else {
                        None
                    }
                });
                let Some((i, point)) = next else {
                    break;
                };
                used[i] = true;
                if at_back {
                    points.push_back(point);
                } else {
                    points.push_front(point);
                }
            }
        }

        let points: Vec<Point> = points.into();
        let closed = points.len() > 2 && points[0].distance(&points[points.len() - 1]) < EPSILON;
        contours.push(Contour { level, points, closed });
    }

    contours
}

/// Apply Chaikin's corner cutting algorithm for smoothing
pub fn smooth_contour(contour: &Contour, iterations: u32) -> Contour {
    if iterations == 0 || contour.points.len() < 3 {
        return contour.clone();
    }

    let mut points = contour.points.clone();

    for _ in 0..iterations {
        let n = points.len();
        let pairs = if contour.closed { n } else { n - 1 };
        let mut new_points = Vec::with_capacity(pairs * 2 + 2);

        if !contour.closed {
            new_points.push(points[0]);
        }
        for i in 0..pairs {
            let p1 = points[i];
            let p2 = points[(i + 1) % n];
            new_points.push(Point::new(0.75 * p1.x + 0.25 * p2.x, 0.75 * p1.y + 0.25 * p2.y));
            new_points.push(Point::new(0.25 * p1.x + 0.75 * p2.x, 0.25 * p1.y + 0.75 * p2.y));
        }
        if !contour.closed {
            new_points.push(points[n - 1]);
        }

        points = new_points;
    }

    Contour {
        level: contour.level,
        points,
        closed: contour.closed,
    }
}

/// Trace and smooth every configured level, in grid index space.
pub fn trace_contours(grid: &Grid<f64>, config: &ContourConfig) -> Vec<Contour> {
    let mut all = Vec::new();
    for &level in &config.levels {
        for contour in connect_segments(march_squares(grid, level), level) {
            all.push(smooth_contour(&contour, config.smoothing_passes));
        }
    }
    all
}

/// Map grid-space contours to pixels through the field axes.
pub fn project_contours(
    contours: &[Contour],
    latitudes: &[f64],
    longitudes: &[f64],
    frame: &MapFrame,
) -> Vec<Contour> {
    contours
        .iter()
        .map(|c| Contour {
            level: c.level,
            closed: c.closed,
            points: c
                .points
                .iter()
                .map(|p| {
                    let lon = axis_value(longitudes, p.x as f64);
                    let lat = axis_value(latitudes, p.y as f64);
                    let (x, y) = frame.to_pixel(lon, lat);
                    Point::new(x, y)
                })
                .collect(),
        })
        .collect()
}

/// Position and text of a contour label, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPosition {
    pub x: f32,
    pub y: f32,
    /// Rotation in radians, never upside down
    pub angle: f32,
    pub text: String,
    pub level: f64,
}

/// What [`render_contours`] drew.
#[derive(Debug, Clone, Default)]
pub struct ContourSummary {
    pub lines: usize,
    pub labels: Vec<LabelPosition>,
}

/// Trace, project and stroke contours of `grid` inside `frame`.
///
/// Rows of `grid` follow `latitudes` and columns follow `longitudes`.
/// Labels are drawn after every line so lines never cross a label box.
pub fn render_contours(
    pixmap: &mut Pixmap,
    frame: &MapFrame,
    grid: &Grid<f64>,
    latitudes: &[f64],
    longitudes: &[f64],
    config: &ContourConfig,
) -> RenderResult<ContourSummary> {
    check_axes(grid, latitudes, longitudes)?;

    let traced = trace_contours(grid, config);
    let contours = project_contours(&traced, latitudes, longitudes, frame);
    debug!(
        levels = config.levels.len(),
        lines = contours.len(),
        points = contours.iter().map(|c| c.points.len()).sum::<usize>(),
        "Traced contours"
    );

    let mask = frame.clip_mask(pixmap.width(), pixmap.height());
    let mut paint = Paint::default();
    let c = config.line_color;
    paint.set_color_rgba8(c[0], c[1], c[2], c[3]);
    paint.anti_alias = true;
    let stroke = Stroke {
        width: config.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let mut summary = ContourSummary::default();
    for contour in contours.iter().filter(|c| c.points.len() >= 2) {
        let mut pb = PathBuilder::new();
        pb.move_to(contour.points[0].x, contour.points[0].y);
        for point in &contour.points[1..] {
            pb.line_to(point.x, point.y);
        }
        if contour.closed {
            pb.close();
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), mask.as_ref());
            summary.lines += 1;
        }

        if config.labels_enabled {
            collect_label_positions(contour, config, frame, &mut summary.labels);
        }
    }

    let style = TextStyle::new(config.label_font_size, config.line_color)
        .anchored(Anchor::Middle)
        .with_background();
    for label in &summary.labels {
        text::draw_text(pixmap, &label.text, label.x, label.y, &style.rotated(label.angle));
    }

    Ok(summary)
}

fn contour_length(contour: &Contour) -> f32 {
    contour.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Evenly spaced labels along a pixel-space contour, kept inside the frame
/// and away from labels already placed.
fn collect_label_positions(
    contour: &Contour,
    config: &ContourConfig,
    frame: &MapFrame,
    positions: &mut Vec<LabelPosition>,
) {
    let total_length = contour_length(contour);
    if total_length < config.label_spacing * 0.5 {
        return;
    }

    let label_text = config.level_label(contour.level);
    let area = frame.area();
    let margin = config.label_font_size * 2.0;
    let min_distance = config.label_font_size * 4.0;

    let num_labels = ((total_length / config.label_spacing).floor() as usize).max(1);
    let spacing = total_length / (num_labels as f32 + 1.0);

    let mut accumulated = 0.0;
    let mut next_label_at = spacing;
    let mut placed = 0;

    for w in contour.points.windows(2) {
        let (p1, p2) = (w[0], w[1]);
        let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
        let segment_length = p1.distance(&p2);

        while placed < num_labels && segment_length > 0.0 && accumulated + segment_length >= next_label_at {
            let t = (next_label_at - accumulated) / segment_length;
            let (x, y) = (p1.x + t * dx, p1.y + t * dy);

            let inside = x > area.left() + margin
                && x < area.right() - margin
                && y > area.top() + margin
                && y < area.bottom() - margin;
            let crowded = positions
                .iter()
                .any(|pos| (pos.x - x).powi(2) + (pos.y - y).powi(2) < min_distance * min_distance);

            if inside && !crowded {
                let mut angle = dy.atan2(dx);
                if angle > std::f32::consts::FRAC_PI_2 {
                    angle -= std::f32::consts::PI;
                } else if angle < -std::f32::consts::FRAC_PI_2 {
                    angle += std::f32::consts::PI;
                }
                positions.push(LabelPosition {
                    x,
                    y,
                    angle,
                    text: label_text.clone(),
                    level: contour.level,
                });
            }

            next_label_at += spacing;
            placed += 1;
        }

        accumulated += segment_length;
        if placed >= num_labels {
            break;
        }
    }
}
