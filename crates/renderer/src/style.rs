//! Color stops, level palettes and colorbars.

use serde::{Deserialize, Serialize};
use tiny_skia::{Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::error::{RenderError, RenderResult};
use crate::text::{self, Anchor, TextStyle};

/// Color stop for a gradient, in display units.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColorStop {
    pub value: f64,
    pub color: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl ColorStop {
    pub fn new(value: f64, color: &str) -> Self {
        Self {
            value,
            color: color.to_string(),
            label: None,
        }
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Parse `#RRGGBB` or `#RRGGBBAA`.
pub fn hex_to_rgba(hex: &str) -> Option<[u8; 4]> {
    let digits = hex.trim_start_matches('#');
    match digits.len() {
        6 => hex_to_rgb(digits).map(|(r, g, b)| [r, g, b, 255]),
        8 if digits.is_ascii() => {
            let (r, g, b) = hex_to_rgb(&digits[..6])?;
            let a = u8::from_str_radix(&digits[6..8], 16).ok()?;
            Some([r, g, b, a])
        }
        _ => None,
    }
}

/// Piecewise-linear color ramp over absolute values.
#[derive(Debug, Clone)]
pub struct Gradient {
    stops: Vec<(f64, [u8; 4])>,
}

impl Gradient {
    /// Build from stops in any order. Every color must parse.
    pub fn from_stops(stops: &[ColorStop]) -> RenderResult<Self> {
        if stops.is_empty() {
            return Err(RenderError::InvalidInput("gradient needs at least one color stop".into()));
        }
        let mut parsed = stops
            .iter()
            .map(|s| {
                if !s.value.is_finite() {
                    return Err(RenderError::InvalidInput(format!("non-finite stop value for {}", s.color)));
                }
                hex_to_rgba(&s.color)
                    .map(|c| (s.value, c))
                    .ok_or_else(|| RenderError::InvalidInput(format!("invalid color '{}'", s.color)))
            })
            .collect::<RenderResult<Vec<_>>>()?;
        parsed.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { stops: parsed })
    }

    pub fn min(&self) -> f64 {
        self.stops[0].0
    }

    pub fn max(&self) -> f64 {
        self.stops[self.stops.len() - 1].0
    }

    /// Color at `value`, clamped to the end stops.
    pub fn color_at(&self, value: f64) -> [u8; 4] {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if value.is_nan() || value <= first.0 {
            return first.1;
        }
        if value >= last.0 {
            return last.1;
        }

        let upper = self.stops.partition_point(|(v, _)| *v <= value);
        let (v0, c0) = self.stops[upper - 1];
        let (v1, c1) = self.stops[upper];
        let t = if (v1 - v0).abs() < f64::EPSILON {
            0.0
        } else {
            (value - v0) / (v1 - v0)
        };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2]), mix(c0[3], c1[3])]
    }

    /// Same ramp stretched linearly onto `[min, max]`.
    pub fn rescaled(&self, min: f64, max: f64) -> Self {
        let (lo, hi) = (self.min(), self.max());
        let span = hi - lo;
        let stops = self
            .stops
            .iter()
            .map(|(v, c)| {
                let t = if span.abs() < f64::EPSILON { 0.0 } else { (v - lo) / span };
                (min + t * (max - min), *c)
            })
            .collect();
        Self { stops }
    }
}

/// Discrete fill colors between contour levels.
///
/// `levels` are bin edges (strictly increasing), `colors[i]` fills
/// `[levels[i], levels[i + 1])`. Values below the first edge use the first
/// bin and values at or above the last edge use the last bin.
#[derive(Debug, Clone)]
pub struct LevelPalette {
    levels: Vec<f64>,
    colors: Vec<[u8; 4]>,
}

impl LevelPalette {
    pub fn new(levels: Vec<f64>, colors: Vec<[u8; 4]>) -> RenderResult<Self> {
        if levels.len() < 2 {
            return Err(RenderError::InvalidInput(format!(
                "need at least two levels, got {}",
                levels.len()
            )));
        }
        if levels.iter().any(|l| !l.is_finite()) || levels.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RenderError::InvalidInput("levels must be strictly increasing".into()));
        }
        if colors.len() + 1 != levels.len() {
            return Err(RenderError::InvalidInput(format!(
                "{} levels need {} colors, got {}",
                levels.len(),
                levels.len() - 1,
                colors.len()
            )));
        }
        Ok(Self { levels, colors })
    }

    /// Sample `gradient` at the middle of each bin.
    pub fn from_gradient(levels: Vec<f64>, gradient: &Gradient) -> RenderResult<Self> {
        let colors = levels
            .windows(2)
            .map(|w| gradient.color_at((w[0] + w[1]) / 2.0))
            .collect();
        Self::new(levels, colors)
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    /// Bin index of `value`; `None` for NaN.
    pub fn bin(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let upper = self.levels.partition_point(|l| *l <= value);
        Some(upper.saturating_sub(1).min(self.colors.len() - 1))
    }

    pub fn color_for(&self, value: f64) -> Option<[u8; 4]> {
        self.bin(value).map(|i| self.colors[i])
    }
}

/// Round `raw` up to 1, 2, 2.5 or 5 times a power of ten.
pub fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 2.5 {
        2.5
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Evenly spaced round levels spanning `[min, max]` in about `target_bins` bins.
///
/// A constant field still gets two levels around its value.
pub fn nice_levels(min: f64, max: f64, target_bins: usize) -> Vec<f64> {
    if !min.is_finite() || !max.is_finite() {
        return vec![0.0, 1.0];
    }
    let (min, max) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let step = nice_step((max - min) / target_bins.max(1) as f64);
    let start = (min / step).floor() * step;
    let end = (max / step).ceil() * step;
    let count = ((end - start) / step).round() as usize;
    (0..=count.max(1)).map(|i| start + i as f64 * step).collect()
}

/// Label text for a level, with as many decimals as the level spacing needs.
pub fn format_level(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 || step <= 0.0 {
        0
    } else {
        (-step.log10()).ceil().clamp(0.0, 4.0) as usize
    };
    let text = format!("{:.*}", decimals, value);
    // "-0" reads badly next to a zero line
    if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        text.trim_start_matches('-').to_string()
    } else {
        text
    }
}

/// Built-in ramps, selectable by name from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteName {
    Moisture,
    Precipitation,
    Temperature,
    Diverging,
    Geopotential,
}

impl PaletteName {
    /// Stops on a 0..1 scale; rescale to the data with [`Gradient::rescaled`].
    pub fn stops(&self) -> Vec<ColorStop> {
        let table: &[(f64, &str)] = match self {
            Self::Moisture => &[
                (0.0, "#FFFFFF"),
                (0.2, "#FFF3B0"),
                (0.4, "#FDB863"),
                (0.6, "#E66101"),
                (0.8, "#B2182B"),
                (1.0, "#5E3C99"),
            ],
            Self::Precipitation => &[
                (0.0, "#FFFFFF"),
                (0.15, "#C6DBEF"),
                (0.35, "#6BAED6"),
                (0.55, "#2171B5"),
                (0.7, "#41AB5D"),
                (0.85, "#FED976"),
                (1.0, "#E31A1C"),
            ],
            Self::Temperature => &[
                (0.0, "#313695"),
                (0.25, "#74ADD1"),
                (0.5, "#FFFFBF"),
                (0.75, "#F46D43"),
                (1.0, "#A50026"),
            ],
            Self::Diverging => &[(0.0, "#2166AC"), (0.5, "#F7F7F7"), (1.0, "#B2182B")],
            Self::Geopotential => &[
                (0.0, "#542788"),
                (0.33, "#3288BD"),
                (0.66, "#99D594"),
                (1.0, "#FEE08B"),
            ],
        };
        table.iter().map(|(v, c)| ColorStop::new(*v, c)).collect()
    }

    pub fn gradient(&self) -> Gradient {
        // Built-in tables always parse; fall back to gray if one ever doesn't.
        Gradient::from_stops(&self.stops()).unwrap_or_else(|_| Gradient {
            stops: vec![(0.0, [128, 128, 128, 255]), (1.0, [128, 128, 128, 255])],
        })
    }
}

/// One color per orientation octant, N first and clockwise.
pub const OCTANT_COLORS: [[u8; 4]; 8] = [
    [0x1F, 0x77, 0xB4, 255],
    [0x17, 0xBE, 0xCF, 255],
    [0x2C, 0xA0, 0x2C, 255],
    [0xBC, 0xBD, 0x22, 255],
    [0xFF, 0x7F, 0x0E, 255],
    [0xD6, 0x27, 0x28, 255],
    [0x94, 0x67, 0xBD, 255],
    [0x8C, 0x56, 0x4B, 255],
];

/// Horizontal colorbar with bin swatches, edge ticks and a caption below.
///
/// Tick labels are thinned so neighbours never overlap.
pub fn draw_colorbar(pixmap: &mut Pixmap, area: Rect, palette: &LevelPalette, caption: &str, text_size: f32) {
    let n = palette.colors().len();
    let swatch = area.width() / n as f32;

    let mut paint = Paint::default();
    paint.anti_alias = false;
    for (i, color) in palette.colors().iter().enumerate() {
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        if let Some(rect) = Rect::from_xywh(area.x() + i as f32 * swatch, area.y(), swatch.ceil(), area.height()) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    let mut outline = Paint::default();
    outline.set_color_rgba8(0, 0, 0, 255);
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    let frame = PathBuilder::from_rect(area);
    pixmap.stroke_path(&frame, &outline, &stroke, Transform::identity(), None);

    let levels = palette.levels();
    let step = levels[1] - levels[0];
    let labels: Vec<String> = levels.iter().map(|l| format_level(*l, step)).collect();
    let widest = labels.iter().map(|l| text::text_width(l, text_size)).fold(0.0f32, f32::max);
    let every = ((widest + text_size) / swatch).ceil().max(1.0) as usize;

    let tick_style = TextStyle::new(text_size, [0, 0, 0, 255]).anchored(Anchor::Middle);
    let label_y = area.bottom() + text_size * 1.2;
    for (i, label) in labels.iter().enumerate().step_by(every) {
        let x = area.x() + i as f32 * swatch;
        let mut tick = PathBuilder::new();
        tick.move_to(x, area.bottom());
        tick.line_to(x, area.bottom() + text_size * 0.4);
        if let Some(path) = tick.finish() {
            pixmap.stroke_path(&path, &outline, &stroke, Transform::identity(), None);
        }
        text::draw_text(pixmap, label, x, label_y, &tick_style);
    }

    if !caption.is_empty() {
        let caption_y = label_y + text_size * 1.8;
        text::draw_text(pixmap, caption, area.x() + area.width() / 2.0, caption_y, &tick_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#FF0000"), Some((255, 0, 0)));
        assert_eq!(hex_to_rgb("#00FF00"), Some((0, 255, 0)));
        assert_eq!(hex_to_rgb("0000FF"), Some((0, 0, 255)));
        assert_eq!(hex_to_rgb("#GGGGGG"), None);
        assert_eq!(hex_to_rgba("#FF000080"), Some([255, 0, 0, 128]));
        assert_eq!(hex_to_rgba("#FFF"), None);
    }

    #[test]
    fn test_gradient_interpolates_and_clamps() {
        let g = Gradient::from_stops(&[ColorStop::new(10.0, "#FFFFFF"), ColorStop::new(0.0, "#000000")]).unwrap();
        assert_eq!(g.color_at(-5.0), [0, 0, 0, 255]);
        assert_eq!(g.color_at(20.0), [255, 255, 255, 255]);
        assert_eq!(g.color_at(5.0), [128, 128, 128, 255]);
    }

    #[test]
    fn test_palette_bins() {
        let p = LevelPalette::new(vec![0.0, 1.0, 2.0], vec![[1, 0, 0, 255], [2, 0, 0, 255]]).unwrap();
        assert_eq!(p.bin(-3.0), Some(0));
        assert_eq!(p.bin(0.5), Some(0));
        assert_eq!(p.bin(1.0), Some(1));
        assert_eq!(p.bin(9.0), Some(1));
        assert_eq!(p.bin(f64::NAN), None);
    }

    #[test]
    fn test_palette_rejects_bad_levels() {
        assert!(LevelPalette::new(vec![0.0, 0.0], vec![[0; 4]]).is_err());
        assert!(LevelPalette::new(vec![0.0, 1.0], vec![]).is_err());
    }

    #[test]
    fn test_nice_levels() {
        assert!((nice_step(0.7) - 1.0).abs() < 1e-12);
        assert!((nice_step(23.0) - 25.0).abs() < 1e-12);
        let levels = nice_levels(3.2, 47.9, 10);
        assert_eq!(levels.first(), Some(&0.0));
        assert_eq!(levels.last(), Some(&50.0));
        assert!(nice_levels(5.0, 5.0, 10).len() >= 2);
    }

    #[test]
    fn test_format_level() {
        assert_eq!(format_level(250.0, 50.0), "250");
        assert_eq!(format_level(2.5, 0.5), "2.5");
        assert_eq!(format_level(-0.0001, 1.0), "0");
    }

    #[test]
    fn test_builtin_palettes_parse() {
        for name in [
            PaletteName::Moisture,
            PaletteName::Precipitation,
            PaletteName::Temperature,
            PaletteName::Diverging,
            PaletteName::Geopotential,
        ] {
            let g = Gradient::from_stops(&name.stops()).unwrap();
            assert_eq!(g.min(), 0.0);
            assert_eq!(g.max(), 1.0);
        }
    }
}
