//! Raster primitives for facet maps, OPG scatter plots and reanalysis panels.
//!
//! Everything draws onto a caller-owned `tiny_skia::Pixmap`; [`png::write_png`]
//! turns the finished figure into a file.

pub mod barbs;
pub mod canvas;
pub mod chart;
pub mod contour;
pub mod error;
pub mod fill;
pub mod frame;
pub mod png;
pub mod style;
pub mod text;

pub use error::{RenderError, RenderResult};
pub use frame::MapFrame;
pub use style::{ColorStop, Gradient, LevelPalette, PaletteName};

pub use tiny_skia::{Pixmap, Rect};
