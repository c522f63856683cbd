//! Figure composition.
//!
//! Each figure is built in two steps: `prepare` checks every precondition
//! (shapes, facet presence, extents) without touching the filesystem, and
//! `render` draws and writes the PNG. The pipeline prepares every enabled
//! figure before rendering any of them, so bad inputs never leave a partial
//! set of images behind.

pub mod daily;
pub mod overview;
pub mod timeseries;

pub use daily::{daily_file_name, DailyPanels, DayOutput, PanelSummary};
pub use overview::{OverviewOutput, OverviewPlot, OVERVIEW_FILE};
pub use timeseries::{timeseries_file_name, TimeseriesOutput, TimeseriesPlot};

use renderer::canvas::new_canvas;
use renderer::text::{draw_text, Anchor, TextStyle};
use renderer::{Pixmap, RenderResult};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

/// White canvas with a centered title across the top.
fn titled_canvas(width: u32, height: u32, title: &str, title_size: f32) -> RenderResult<Pixmap> {
    let mut pixmap = new_canvas(width, height, WHITE)?;
    let style = TextStyle::new(title_size, BLACK).anchored(Anchor::Middle);
    draw_text(&mut pixmap, title, width as f32 / 2.0, title_size * 1.5, &style);
    Ok(pixmap)
}
