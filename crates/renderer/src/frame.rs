//! Map frames: where a lon/lat extent lands on the canvas.
//!
//! Projection is equirectangular. [`MapFrame::fit`] picks the largest
//! rectangle inside the available area whose aspect ratio matches the
//! extent with longitude scaled by the cosine of the middle latitude, which
//! keeps mid-latitude regions from looking stretched.

use opg_common::GeoExtent;
use tiny_skia::{FillRule, Mask, Paint, PathBuilder, Pixmap, Rect, Stroke, StrokeDash, Transform};

use crate::error::{RenderError, RenderResult};
use crate::style::format_level;
use crate::text::{self, Anchor, TextStyle};

/// A geographic extent mapped onto a pixel rectangle.
#[derive(Debug, Clone, Copy)]
pub struct MapFrame {
    extent: GeoExtent,
    area: Rect,
}

impl MapFrame {
    /// Map `extent` onto exactly `area`.
    pub fn new(extent: GeoExtent, area: Rect) -> Self {
        Self { extent, area }
    }

    /// Largest aspect-correct frame centered in `available`.
    pub fn fit(extent: GeoExtent, available: Rect) -> RenderResult<Self> {
        extent.validate()?;
        let mid_lat = (extent.min_lat + extent.max_lat) / 2.0;
        let geo_aspect = (extent.width() * mid_lat.to_radians().cos().max(0.1)) / extent.height();
        let box_aspect = (available.width() / available.height()) as f64;

        let (w, h) = if geo_aspect > box_aspect {
            (available.width(), available.width() / geo_aspect as f32)
        } else {
            (available.height() * geo_aspect as f32, available.height())
        };
        let x = available.x() + (available.width() - w) / 2.0;
        let y = available.y() + (available.height() - h) / 2.0;
        let area = Rect::from_xywh(x, y, w, h)
            .ok_or_else(|| RenderError::InvalidInput(format!("degenerate map area {}x{}", w, h)))?;
        Ok(Self { extent, area })
    }

    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Pixel position of a lon/lat point. Points outside the extent map
    /// outside the area.
    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f32, f32) {
        let fx = (lon - self.extent.min_lon) / self.extent.width();
        let fy = (self.extent.max_lat - lat) / self.extent.height();
        (
            self.area.x() + (fx as f32) * self.area.width(),
            self.area.y() + (fy as f32) * self.area.height(),
        )
    }

    /// Lon/lat under a pixel position.
    pub fn to_geo(&self, px: f32, py: f32) -> (f64, f64) {
        let fx = ((px - self.area.x()) / self.area.width()) as f64;
        let fy = ((py - self.area.y()) / self.area.height()) as f64;
        (
            self.extent.min_lon + fx * self.extent.width(),
            self.extent.max_lat - fy * self.extent.height(),
        )
    }

    pub fn contains_pixel(&self, px: f32, py: f32) -> bool {
        px >= self.area.left() && px <= self.area.right() && py >= self.area.top() && py <= self.area.bottom()
    }

    /// Integer pixel bounds covered by the frame, clamped to the canvas.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let x0 = self.area.left().floor().max(0.0) as u32;
        let y0 = self.area.top().floor().max(0.0) as u32;
        let x1 = (self.area.right().ceil() as u32).min(width);
        let y1 = (self.area.bottom().ceil() as u32).min(height);
        (x0, y0, x1, y1)
    }

    /// Mask restricting drawing to the frame.
    pub fn clip_mask(&self, width: u32, height: u32) -> Option<Mask> {
        let mut mask = Mask::new(width, height)?;
        let path = PathBuilder::from_rect(self.area);
        mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
        Some(mask)
    }

    pub fn draw_border(&self, pixmap: &mut Pixmap) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        let path = PathBuilder::from_rect(self.area);
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Dashed meridians and parallels every `step` degrees, labelled below
    /// and left of the frame.
    pub fn draw_graticule(&self, pixmap: &mut Pixmap, step: f64, text_size: f32) {
        if step.is_nan() || step <= 0.0 {
            return;
        }
        let mut paint = Paint::default();
        paint.set_color_rgba8(90, 90, 90, 160);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: 0.6,
            dash: StrokeDash::new(vec![3.0, 3.0], 0.0),
            ..Stroke::default()
        };
        let label_style = TextStyle::new(text_size, [40, 40, 40, 255]);
        let area = self.area;

        for lon in ticks(self.extent.min_lon, self.extent.max_lon, step) {
            let (x, _) = self.to_pixel(lon, self.extent.max_lat);
            let mut pb = PathBuilder::new();
            pb.move_to(x, area.top());
            pb.line_to(x, area.bottom());
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
            let label = format!("{}{}", format_level(lon.abs(), step), if lon < 0.0 { "W" } else { "E" });
            text::draw_text(
                pixmap,
                &label,
                x,
                area.bottom() + text_size * 1.2,
                &label_style.anchored(Anchor::Middle),
            );
        }

        for lat in ticks(self.extent.min_lat, self.extent.max_lat, step) {
            let (_, y) = self.to_pixel(self.extent.min_lon, lat);
            let mut pb = PathBuilder::new();
            pb.move_to(area.left(), y);
            pb.line_to(area.right(), y);
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
            let label = format!("{}{}", format_level(lat.abs(), step), if lat < 0.0 { "S" } else { "N" });
            text::draw_text(
                pixmap,
                &label,
                area.left() - text_size * 0.5,
                y,
                &label_style.anchored(Anchor::End),
            );
        }
    }
}

/// Multiples of `step` inside `[min, max]`.
fn ticks(min: f64, max: f64, step: f64) -> Vec<f64> {
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> MapFrame {
        let extent = GeoExtent::new(-125.0, -120.0, 45.0, 50.0).unwrap();
        MapFrame::new(extent, Rect::from_xywh(10.0, 20.0, 500.0, 250.0).unwrap())
    }

    #[test]
    fn test_corners() {
        let f = frame();
        assert_eq!(f.to_pixel(-125.0, 50.0), (10.0, 20.0));
        assert_eq!(f.to_pixel(-120.0, 45.0), (510.0, 270.0));
        let (x, y) = f.to_pixel(-122.5, 47.5);
        assert!((x - 260.0).abs() < 1e-3 && (y - 145.0).abs() < 1e-3);
    }

    #[test]
    fn test_round_trip() {
        let f = frame();
        let (px, py) = f.to_pixel(-123.3, 46.1);
        let (lon, lat) = f.to_geo(px, py);
        assert!((lon + 123.3).abs() < 1e-4);
        assert!((lat - 46.1).abs() < 1e-4);
    }

    #[test]
    fn test_fit_keeps_inside() {
        let extent = GeoExtent::new(-125.0, -120.0, 45.0, 50.0).unwrap();
        let available = Rect::from_xywh(0.0, 0.0, 400.0, 400.0).unwrap();
        let f = MapFrame::fit(extent, available).unwrap();
        let area = f.area();
        assert!(area.left() >= 0.0 && area.right() <= 400.0 + 1e-3);
        assert!(area.top() >= 0.0 && area.bottom() <= 400.0 + 1e-3);
        // cos(47.5 deg) < 1, so the frame is taller than wide
        assert!(area.height() > area.width());
    }

    #[test]
    fn test_ticks() {
        assert_eq!(ticks(-124.5, -120.5, 1.0), vec![-124.0, -123.0, -122.0, -121.0]);
        assert!(ticks(0.1, 0.9, 1.0).is_empty());
    }
}
