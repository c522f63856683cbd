//! Orientation overview map.
//!
//! The orientation grid is drawn as an eight-category raster with flat
//! cells masked out, the designated facet is labelled at its centroid and a
//! legend strip explains the octant colors.

use std::path::{Path, PathBuf};

use ingestion::{facet_centroid, mask_flat, validate, FacetLayers, Octant};
use opg_common::{FacetId, Grid};
use renderer::canvas::{fill_rect, stroke_rect};
use renderer::fill::render_cells;
use renderer::png::write_png;
use renderer::style::OCTANT_COLORS;
use renderer::text::{draw_text, Anchor, TextStyle};
use renderer::{MapFrame, Rect, RenderError};
use tracing::{debug, info};

use super::{titled_canvas, BLACK};
use crate::config::OverviewConfig;
use crate::error::PlotResult;

pub const OVERVIEW_FILE: &str = "orientation_overview.png";

/// A validated overview, ready to draw.
#[derive(Debug)]
pub struct OverviewPlot<'a> {
    layers: &'a FacetLayers,
    masked: Grid<Option<u8>>,
    facet: FacetId,
    centroid: (f64, f64),
    config: &'a OverviewConfig,
}

/// Where the facet label went.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacetLabel {
    pub facet: FacetId,
    pub lon: f64,
    pub lat: f64,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewOutput {
    pub path: PathBuf,
    /// Cells painted (every cell with a non-flat orientation code)
    pub cells: usize,
    /// Always exactly one label.
    pub labels: Vec<FacetLabel>,
}

impl<'a> OverviewPlot<'a> {
    /// Check the layers and locate `facet`.
    ///
    /// A facet without cells is [`RenderError::FacetNotFound`].
    pub fn prepare(layers: &'a FacetLayers, facet: FacetId, config: &'a OverviewConfig) -> PlotResult<Self> {
        validate::facet_layers(layers)?;
        config.extent.validate()?;

        let centroid = facet_centroid(&layers.facets, &layers.longitude, &layers.latitude, facet)?;
        let masked = mask_flat(&layers.orientation);
        debug!(
            facet = %facet,
            lon = centroid.0,
            lat = centroid.1,
            cells = layers.cell_count(facet),
            "Located facet"
        );

        Ok(Self {
            layers,
            masked,
            facet,
            centroid,
            config,
        })
    }

    /// Orientation codes as drawn: flat cells are `None`.
    pub fn masked(&self) -> &Grid<Option<u8>> {
        &self.masked
    }

    /// (median longitude, median latitude) of the facet's cells.
    pub fn centroid(&self) -> (f64, f64) {
        self.centroid
    }

    pub fn render(&self, output_dir: &Path) -> PlotResult<OverviewOutput> {
        let cfg = self.config;
        let title_size = 16.0;
        let text_size = 10.0;
        let mut pixmap = titled_canvas(cfg.width, cfg.height, "FACET ORIENTATION", title_size)?;

        let legend_height = 60.0;
        let available = Rect::from_ltrb(
            56.0,
            title_size * 3.0,
            cfg.width as f32 - 20.0,
            cfg.height as f32 - legend_height - 24.0,
        )
        .ok_or_else(|| RenderError::InvalidInput(format!("overview {}x{} leaves no map area", cfg.width, cfg.height)))?;
        let frame = MapFrame::fit(cfg.extent, available)?;

        let masked = &self.masked;
        let cells = render_cells(
            &mut pixmap,
            &frame,
            &self.layers.longitude,
            &self.layers.latitude,
            |r, c| {
                let code = masked.get(r, c).copied().flatten()?;
                Octant::from_code(code).map(|o| OCTANT_COLORS[o.code() as usize - 1])
            },
        )?;

        frame.draw_graticule(&mut pixmap, cfg.graticule_step, text_size);
        frame.draw_border(&mut pixmap);

        let (lon, lat) = self.centroid;
        let (x, y) = frame.to_pixel(lon, lat);
        let label_style = TextStyle::new(cfg.label_size, BLACK)
            .anchored(Anchor::Middle)
            .with_background();
        draw_text(&mut pixmap, &self.facet.to_string(), x, y, &label_style);
        let label = FacetLabel {
            facet: self.facet,
            lon,
            lat,
            x,
            y,
        };

        let legend = Rect::from_xywh(
            frame.area().left(),
            cfg.height as f32 - legend_height,
            frame.area().width(),
            legend_height * 0.4,
        );
        if let Some(legend) = legend {
            draw_legend(&mut pixmap, legend, text_size);
        }

        let path = output_dir.join(OVERVIEW_FILE);
        write_png(&path, &pixmap)?;
        info!(
            path = %path.display(),
            facet = %self.facet,
            cells,
            "Wrote orientation overview"
        );

        Ok(OverviewOutput {
            path,
            cells,
            labels: vec![label],
        })
    }
}

/// One swatch per octant with its compass label underneath.
fn draw_legend(pixmap: &mut renderer::Pixmap, area: Rect, text_size: f32) {
    let slot = area.width() / Octant::ALL.len() as f32;
    let swatch = (slot * 0.6).min(area.height() * 1.6);
    let style = TextStyle::new(text_size, BLACK).anchored(Anchor::Middle);

    for (i, octant) in Octant::ALL.iter().enumerate() {
        let cx = area.left() + slot * (i as f32 + 0.5);
        if let Some(rect) = Rect::from_xywh(cx - swatch / 2.0, area.top(), swatch, area.height()) {
            fill_rect(pixmap, rect, OCTANT_COLORS[i]);
            stroke_rect(pixmap, rect, BLACK, 1.0);
        }
        draw_text(pixmap, octant.label(), cx, area.bottom() + text_size * 1.2, &style);
    }
}

/// Prepare and render in one step.
pub fn render_overview(
    layers: &FacetLayers,
    facet: FacetId,
    config: &OverviewConfig,
    output_dir: &Path,
) -> PlotResult<OverviewOutput> {
    OverviewPlot::prepare(layers, facet, config)?.render(output_dir)
}
