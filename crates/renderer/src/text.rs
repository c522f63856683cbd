//! Stroke-font text for titles, axis ticks and map labels.
//!
//! Glyphs are polylines on a 4x6 grid (x right, y down, baseline at y=6)
//! stroked with round caps, so text scales and rotates without a font file.
//! Lowercase letters render as uppercase. Unknown characters render as a
//! blank advance.

use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Glyph box width in grid units.
const GLYPH_WIDTH: f32 = 4.0;
/// Cap height in grid units.
const GLYPH_HEIGHT: f32 = 6.0;
/// Advance between glyph origins in grid units.
const ADVANCE: f32 = 5.5;

/// Horizontal alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

/// How to draw a run of text.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    /// Cap height in pixels
    pub size: f32,
    pub color: [u8; 4],
    pub anchor: Anchor,
    /// Rotation in radians, clockwise on screen
    pub angle: f32,
    /// Draw a translucent white box behind the text
    pub background: bool,
}

impl TextStyle {
    pub fn new(size: f32, color: [u8; 4]) -> Self {
        Self {
            size,
            color,
            anchor: Anchor::Start,
            angle: 0.0,
            background: false,
        }
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn rotated(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_background(mut self) -> Self {
        self.background = true;
        self
    }
}

/// Rendered width of `text` in pixels at cap height `size`.
pub fn text_width(text: &str, size: f32) -> f32 {
    let n = text.chars().count();
    if n == 0 {
        return 0.0;
    }
    let unit = size / GLYPH_HEIGHT;
    ((n - 1) as f32 * ADVANCE + GLYPH_WIDTH) * unit
}

/// Draw `text` with its vertical center at `y` and its anchor at `x`.
pub fn draw_text(pixmap: &mut Pixmap, text: &str, x: f32, y: f32, style: &TextStyle) {
    if text.is_empty() || style.size <= 0.0 {
        return;
    }

    let unit = style.size / GLYPH_HEIGHT;
    let width = text_width(text, style.size);
    let left = match style.anchor {
        Anchor::Start => 0.0,
        Anchor::Middle => -width / 2.0,
        Anchor::End => -width,
    };
    let top = -style.size / 2.0;

    let (sin_a, cos_a) = style.angle.sin_cos();
    let place = |lx: f32, ly: f32| -> (f32, f32) { (lx * cos_a - ly * sin_a + x, lx * sin_a + ly * cos_a + y) };

    if style.background {
        let pad = style.size * 0.35;
        let corners = [
            (left - pad, top - pad),
            (left + width + pad, top - pad),
            (left + width + pad, top + style.size + pad),
            (left - pad, top + style.size + pad),
        ];
        let mut pb = PathBuilder::new();
        for (i, (cx, cy)) in corners.iter().enumerate() {
            let (px, py) = place(*cx, *cy);
            if i == 0 {
                pb.move_to(px, py);
            } else {
                pb.line_to(px, py);
            }
        }
        pb.close();
        if let Some(path) = pb.finish() {
            let mut bg = Paint::default();
            bg.set_color_rgba8(255, 255, 255, 220);
            bg.anti_alias = true;
            pixmap.fill_path(&path, &bg, FillRule::Winding, Transform::identity(), None);
        }
    }

    let mut pb = PathBuilder::new();
    for (i, ch) in text.chars().enumerate() {
        let origin = left + i as f32 * ADVANCE * unit;
        for stroke in glyph(ch) {
            for (j, (gx, gy)) in stroke.iter().enumerate() {
                let (px, py) = place(origin + gx * unit, top + gy * unit);
                if j == 0 {
                    pb.move_to(px, py);
                } else {
                    pb.line_to(px, py);
                }
            }
        }
    }

    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(style.color[0], style.color[1], style.color[2], style.color[3]);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: (unit * 0.7).max(1.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Whether `ch` has a glyph (space counts).
pub fn is_supported(ch: char) -> bool {
    ch == ' ' || !glyph(ch).is_empty()
}

type Polyline = &'static [(f32, f32)];

const RING: Polyline = &[(1.0, 0.0), (3.0, 0.0), (4.0, 1.0), (4.0, 5.0), (3.0, 6.0), (1.0, 6.0), (0.0, 5.0), (0.0, 1.0), (1.0, 0.0)];
const BOWL: Polyline = &[(0.0, 6.0), (0.0, 0.0), (3.0, 0.0), (4.0, 1.0), (4.0, 2.0), (3.0, 3.0), (0.0, 3.0)];

fn glyph(ch: char) -> &'static [Polyline] {
    match ch.to_ascii_uppercase() {
        'A' => &[&[(0.0, 6.0), (0.0, 2.0), (2.0, 0.0), (4.0, 2.0), (4.0, 6.0)], &[(0.0, 4.0), (4.0, 4.0)]],
        'B' => &[
            &[(0.0, 0.0), (0.0, 6.0), (3.0, 6.0), (4.0, 5.0), (4.0, 4.0), (3.0, 3.0), (0.0, 3.0)],
            &[(0.0, 0.0), (3.0, 0.0), (4.0, 1.0), (4.0, 2.0), (3.0, 3.0)],
        ],
        'C' => &[&[(4.0, 1.0), (3.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 5.0), (1.0, 6.0), (3.0, 6.0), (4.0, 5.0)]],
        'D' => &[&[(0.0, 0.0), (0.0, 6.0), (2.0, 6.0), (4.0, 4.0), (4.0, 2.0), (2.0, 0.0), (0.0, 0.0)]],
        'E' => &[&[(4.0, 0.0), (0.0, 0.0), (0.0, 6.0), (4.0, 6.0)], &[(0.0, 3.0), (3.0, 3.0)]],
        'F' => &[&[(4.0, 0.0), (0.0, 0.0), (0.0, 6.0)], &[(0.0, 3.0), (3.0, 3.0)]],
        'G' => &[&[
            (4.0, 1.0),
            (3.0, 0.0),
            (1.0, 0.0),
            (0.0, 1.0),
            (0.0, 5.0),
            (1.0, 6.0),
            (3.0, 6.0),
            (4.0, 5.0),
            (4.0, 3.0),
            (2.0, 3.0),
        ]],
        'H' => &[&[(0.0, 0.0), (0.0, 6.0)], &[(4.0, 0.0), (4.0, 6.0)], &[(0.0, 3.0), (4.0, 3.0)]],
        'I' => &[&[(1.0, 0.0), (3.0, 0.0)], &[(2.0, 0.0), (2.0, 6.0)], &[(1.0, 6.0), (3.0, 6.0)]],
        'J' => &[&[(4.0, 0.0), (4.0, 5.0), (3.0, 6.0), (1.0, 6.0), (0.0, 5.0)]],
        'K' => &[&[(0.0, 0.0), (0.0, 6.0)], &[(4.0, 0.0), (0.0, 3.0), (4.0, 6.0)]],
        'L' => &[&[(0.0, 0.0), (0.0, 6.0), (4.0, 6.0)]],
        'M' => &[&[(0.0, 6.0), (0.0, 0.0), (2.0, 3.0), (4.0, 0.0), (4.0, 6.0)]],
        'N' => &[&[(0.0, 6.0), (0.0, 0.0), (4.0, 6.0), (4.0, 0.0)]],
        'O' => &[RING],
        'P' => &[BOWL],
        'Q' => &[RING, &[(2.5, 4.5), (4.0, 6.0)]],
        'R' => &[BOWL, &[(2.0, 3.0), (4.0, 6.0)]],
        'S' => &[&[
            (4.0, 1.0),
            (3.0, 0.0),
            (1.0, 0.0),
            (0.0, 1.0),
            (0.0, 2.0),
            (1.0, 3.0),
            (3.0, 3.0),
            (4.0, 4.0),
            (4.0, 5.0),
            (3.0, 6.0),
            (1.0, 6.0),
            (0.0, 5.0),
        ]],
        'T' => &[&[(0.0, 0.0), (4.0, 0.0)], &[(2.0, 0.0), (2.0, 6.0)]],
        'U' => &[&[(0.0, 0.0), (0.0, 5.0), (1.0, 6.0), (3.0, 6.0), (4.0, 5.0), (4.0, 0.0)]],
        'V' => &[&[(0.0, 0.0), (2.0, 6.0), (4.0, 0.0)]],
        'W' => &[&[(0.0, 0.0), (1.0, 6.0), (2.0, 3.0), (3.0, 6.0), (4.0, 0.0)]],
        'X' => &[&[(0.0, 0.0), (4.0, 6.0)], &[(4.0, 0.0), (0.0, 6.0)]],
        'Y' => &[&[(0.0, 0.0), (2.0, 3.0), (4.0, 0.0)], &[(2.0, 3.0), (2.0, 6.0)]],
        'Z' => &[&[(0.0, 0.0), (4.0, 0.0), (0.0, 6.0), (4.0, 6.0)]],
        '0' => &[RING, &[(0.5, 5.0), (3.5, 1.0)]],
        '1' => &[&[(1.0, 1.0), (2.0, 0.0), (2.0, 6.0)], &[(1.0, 6.0), (3.0, 6.0)]],
        '2' => &[&[(0.0, 1.0), (1.0, 0.0), (3.0, 0.0), (4.0, 1.0), (4.0, 2.0), (0.0, 6.0), (4.0, 6.0)]],
        '3' => &[
            &[
                (0.0, 1.0),
                (1.0, 0.0),
                (3.0, 0.0),
                (4.0, 1.0),
                (4.0, 2.0),
                (3.0, 3.0),
                (4.0, 4.0),
                (4.0, 5.0),
                (3.0, 6.0),
                (1.0, 6.0),
                (0.0, 5.0),
            ],
            &[(1.5, 3.0), (3.0, 3.0)],
        ],
        '4' => &[&[(3.0, 6.0), (3.0, 0.0), (0.0, 4.0), (4.0, 4.0)]],
        '5' => &[&[(4.0, 0.0), (0.0, 0.0), (0.0, 3.0), (3.0, 3.0), (4.0, 4.0), (4.0, 5.0), (3.0, 6.0), (0.0, 6.0)]],
        '6' => &[&[
            (3.0, 0.0),
            (1.0, 0.0),
            (0.0, 1.0),
            (0.0, 5.0),
            (1.0, 6.0),
            (3.0, 6.0),
            (4.0, 5.0),
            (4.0, 4.0),
            (3.0, 3.0),
            (0.0, 3.0),
        ]],
        '7' => &[&[(0.0, 0.0), (4.0, 0.0), (1.0, 6.0)]],
        '8' => &[
            &[
                (1.0, 3.0),
                (0.0, 4.0),
                (0.0, 5.0),
                (1.0, 6.0),
                (3.0, 6.0),
                (4.0, 5.0),
                (4.0, 4.0),
                (3.0, 3.0),
                (1.0, 3.0),
                (0.0, 2.0),
                (0.0, 1.0),
                (1.0, 0.0),
                (3.0, 0.0),
                (4.0, 1.0),
                (4.0, 2.0),
                (3.0, 3.0),
            ],
        ],
        '9' => &[&[
            (4.0, 3.0),
            (1.0, 3.0),
            (0.0, 2.0),
            (0.0, 1.0),
            (1.0, 0.0),
            (3.0, 0.0),
            (4.0, 1.0),
            (4.0, 5.0),
            (3.0, 6.0),
            (1.0, 6.0),
        ]],
        '-' => &[&[(0.5, 3.0), (3.5, 3.0)]],
        '+' => &[&[(0.5, 3.0), (3.5, 3.0)], &[(2.0, 1.5), (2.0, 4.5)]],
        '=' => &[&[(0.5, 2.0), (3.5, 2.0)], &[(0.5, 4.0), (3.5, 4.0)]],
        '.' => &[&[(2.0, 5.6), (2.0, 6.0)]],
        ',' => &[&[(2.0, 5.0), (1.5, 7.0)]],
        ':' => &[&[(2.0, 1.6), (2.0, 2.0)], &[(2.0, 4.6), (2.0, 5.0)]],
        '/' => &[&[(0.0, 6.0), (4.0, 0.0)]],
        '(' => &[&[(3.0, 0.0), (2.0, 1.0), (2.0, 5.0), (3.0, 6.0)]],
        ')' => &[&[(1.0, 0.0), (2.0, 1.0), (2.0, 5.0), (1.0, 6.0)]],
        '_' => &[&[(0.0, 6.0), (4.0, 6.0)]],
        '%' => &[
            &[(0.0, 6.0), (4.0, 0.0)],
            &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)],
            &[(3.0, 5.0), (4.0, 5.0), (4.0, 6.0), (3.0, 6.0), (3.0, 5.0)],
        ],
        '\u{b0}' => &[&[(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 0.0)]],
        _ => &[],
    }
}
