//! Tests for color ramps, level palettes and colorbars.

use renderer::canvas::new_canvas;
use renderer::style::{draw_colorbar, nice_levels, OCTANT_COLORS};
use renderer::{ColorStop, Gradient, LevelPalette, PaletteName, Rect};

// ============================================================================
// Gradients
// ============================================================================

#[test]
fn test_rescaled_builtin_ramp_spans_data() {
    let g = PaletteName::Temperature.gradient().rescaled(-30.0, 10.0);
    assert_eq!(g.min(), -30.0);
    assert_eq!(g.max(), 10.0);
    // First and last stop colors survive the rescale
    assert_eq!(g.color_at(-30.0), [0x31, 0x36, 0x95, 255]);
    assert_eq!(g.color_at(10.0), [0xA5, 0x00, 0x26, 255]);
    // Midpoint lands on the middle stop
    assert_eq!(g.color_at(-10.0), [0xFF, 0xFF, 0xBF, 255]);
}

#[test]
fn test_gradient_rejects_bad_colors() {
    assert!(Gradient::from_stops(&[]).is_err());
    assert!(Gradient::from_stops(&[ColorStop::new(0.0, "not-a-color")]).is_err());
    assert!(Gradient::from_stops(&[ColorStop::new(f64::NAN, "#000000")]).is_err());
}

#[test]
fn test_gradient_alpha_channel() {
    let g = Gradient::from_stops(&[ColorStop::new(0.0, "#00000000"), ColorStop::new(1.0, "#000000FF")]).unwrap();
    assert_eq!(g.color_at(0.0)[3], 0);
    assert_eq!(g.color_at(1.0)[3], 255);
}

// ============================================================================
// Level palettes
// ============================================================================

#[test]
fn test_palette_from_gradient_samples_bin_middles() {
    let g = Gradient::from_stops(&[ColorStop::new(0.0, "#000000"), ColorStop::new(100.0, "#C8C8C8")]).unwrap();
    let p = LevelPalette::from_gradient(vec![0.0, 50.0, 100.0], &g).unwrap();
    assert_eq!(p.colors().len(), 2);
    assert_eq!(p.colors()[0], [50, 50, 50, 255]);
    assert_eq!(p.colors()[1], [150, 150, 150, 255]);
    assert_eq!(p.color_for(75.0), Some([150, 150, 150, 255]));
}

#[test]
fn test_palette_with_nice_levels_covers_range() {
    let levels = nice_levels(0.0, 812.0, 8);
    let p = LevelPalette::from_gradient(levels.clone(), &PaletteName::Moisture.gradient().rescaled(0.0, 812.0)).unwrap();
    assert_eq!(p.levels(), levels.as_slice());
    assert_eq!(p.bin(0.0), Some(0));
    assert_eq!(p.bin(812.0), Some(p.colors().len() - 1));
}

#[test]
fn test_octant_colors_distinct() {
    for (i, a) in OCTANT_COLORS.iter().enumerate() {
        for b in &OCTANT_COLORS[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

// ============================================================================
// Colorbar
// ============================================================================

#[test]
fn test_colorbar_draws_each_bin() {
    let colors = vec![[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]];
    let p = LevelPalette::new(vec![0.0, 10.0, 20.0, 30.0], colors.clone()).unwrap();
    let mut pixmap = new_canvas(200, 80, [255, 255, 255, 255]).unwrap();
    let area = Rect::from_xywh(20.0, 10.0, 150.0, 20.0).unwrap();

    draw_colorbar(&mut pixmap, area, &p, "IVT (KG M-1 S-1)", 8.0);

    // Sample the middle of each 50 px swatch
    for (i, expected) in colors.iter().enumerate() {
        let x = 20 + 25 + 50 * i as u32;
        let px = pixmap.pixel(x, 20).unwrap();
        assert_eq!([px.red(), px.green(), px.blue(), px.alpha()], *expected, "swatch {}", i);
    }

    // Tick labels and caption land below the bar
    let below = (32..80)
        .flat_map(|y| (0..200).map(move |x| (x, y)))
        .filter(|&(x, y)| pixmap.pixel(x, y).map(|p| p.red() < 128).unwrap_or(false))
        .count();
    assert!(below > 0);
}
