//! Cartesian axes for scatter plots.

use tiny_skia::{Pixmap, Rect};

use crate::canvas::{draw_line, fill_circle, stroke_rect};
use crate::text::{self, Anchor, TextStyle};

/// Linear mapping from a data interval to a pixel interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f32, f32),
}

impl LinearScale {
    /// A zero-width domain is widened by one unit each way.
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        let domain = if domain.1 > domain.0 {
            domain
        } else {
            (domain.0 - 1.0, domain.0 + 1.0)
        };
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f32 {
        let t = (value - self.domain.0) / (self.domain.1 - self.domain.0);
        self.range.0 + (t as f32) * (self.range.1 - self.range.0)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.domain.0 && value <= self.domain.1
    }
}

/// A plot area with x and y scales.
#[derive(Debug, Clone, Copy)]
pub struct Chart {
    pub area: Rect,
    pub x: LinearScale,
    pub y: LinearScale,
}

impl Chart {
    pub fn new(area: Rect, x_domain: (f64, f64), y_domain: (f64, f64)) -> Self {
        Self {
            area,
            x: LinearScale::new(x_domain, (area.left(), area.right())),
            y: LinearScale::new(y_domain, (area.bottom(), area.top())),
        }
    }

    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        (self.x.map(x), self.y.map(y))
    }

    /// Frame, ticks and tick labels. Ticks outside the domain are skipped.
    pub fn draw_axes(&self, pixmap: &mut Pixmap, x_ticks: &[(f64, String)], y_ticks: &[(f64, String)], text_size: f32) {
        let black = [0, 0, 0, 255];
        let grid = [0, 0, 0, 40];
        let tick_len = text_size * 0.5;
        let a = self.area;

        for (value, label) in x_ticks.iter().filter(|(v, _)| self.x.contains(*v)) {
            let x = self.x.map(*value);
            draw_line(pixmap, (x, a.top()), (x, a.bottom()), grid, 1.0);
            draw_line(pixmap, (x, a.bottom()), (x, a.bottom() + tick_len), black, 1.0);
            let style = TextStyle::new(text_size, black).anchored(Anchor::Middle);
            text::draw_text(pixmap, label, x, a.bottom() + tick_len + text_size, &style);
        }

        for (value, label) in y_ticks.iter().filter(|(v, _)| self.y.contains(*v)) {
            let y = self.y.map(*value);
            draw_line(pixmap, (a.left(), y), (a.right(), y), grid, 1.0);
            draw_line(pixmap, (a.left() - tick_len, y), (a.left(), y), black, 1.0);
            let style = TextStyle::new(text_size, black).anchored(Anchor::End);
            text::draw_text(pixmap, label, a.left() - tick_len * 2.0, y, &style);
        }

        stroke_rect(pixmap, a, black, 1.0);
    }

    /// Horizontal reference line at `y`, if inside the domain.
    pub fn draw_hline(&self, pixmap: &mut Pixmap, y: f64, color: [u8; 4], width: f32) {
        if self.y.contains(y) {
            let py = self.y.map(y);
            draw_line(pixmap, (self.area.left(), py), (self.area.right(), py), color, width);
        }
    }

    /// Dots for every point inside the domain; returns how many were drawn.
    pub fn scatter(&self, pixmap: &mut Pixmap, points: &[(f64, f64)], radius: f32, color: [u8; 4]) -> usize {
        let mut drawn = 0;
        for &(x, y) in points {
            if !x.is_finite() || !y.is_finite() || !self.x.contains(x) || !self.y.contains(y) {
                continue;
            }
            let (px, py) = self.to_pixel(x, y);
            fill_circle(pixmap, px, py, radius, color);
            drawn += 1;
        }
        drawn
    }
}
