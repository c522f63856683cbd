//! Daily ERA5 panels.
//!
//! One figure per day with the six variables on a 2x3 grid of maps sharing
//! one extent: five filled panels with colorbars and the 500 hPa height as
//! labelled contour lines. Selected panels get 700 hPa wind barbs.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ingestion::{validate, AtmosVariable, Atmosphere, LoadError};
use opg_common::Grid;
use renderer::barbs::{render_wind_barbs, BarbConfig, MS_TO_KNOTS};
use renderer::contour::{generate_contour_levels, render_contours, ContourConfig};
use renderer::fill::{check_axes, render_filled_contours};
use renderer::png::write_png;
use renderer::style::{draw_colorbar, hex_to_rgba};
use renderer::text::{draw_text, Anchor, TextStyle};
use renderer::{MapFrame, Pixmap, Rect, RenderError};
use tracing::{debug, info};

use super::{titled_canvas, BLACK};
use crate::config::DailyConfig;
use crate::error::PlotResult;

/// Panels per row.
const COLUMNS: usize = 3;
const TITLE_HEIGHT: f32 = 36.0;

/// `era5_panels_<YYYY-MM-DD>.png`
pub fn daily_file_name(day: NaiveDate) -> String {
    format!("era5_panels_{}.png", day.format("%Y-%m-%d"))
}

/// What one panel drew.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSummary {
    pub variable: AtmosVariable,
    /// Pixels painted by the fill (0 for the line contour panel)
    pub painted: usize,
    pub contour_lines: usize,
    pub contour_labels: usize,
    pub barbs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayOutput {
    pub day: NaiveDate,
    pub path: PathBuf,
    pub panels: Vec<PanelSummary>,
}

/// Validated daily figures, ready to draw.
#[derive(Debug)]
pub struct DailyPanels<'a> {
    atmosphere: &'a Atmosphere,
    days: Vec<NaiveDate>,
    config: &'a DailyConfig,
}

impl<'a> DailyPanels<'a> {
    /// Check that all six fields share grid and time axis and that the grid
    /// can be contoured. An atmosphere without days is valid and draws nothing.
    pub fn prepare(atmosphere: &'a Atmosphere, config: &'a DailyConfig) -> PlotResult<Self> {
        validate::atmosphere(atmosphere)?;
        config.extent.validate()?;

        let days = atmosphere.days();
        if !days.is_empty() {
            let ivt = &atmosphere.ivt;
            let blank = Grid::filled(ivt.latitudes().len(), ivt.longitudes().len(), 0.0);
            check_axes(&blank, ivt.latitudes(), ivt.longitudes())?;
        }
        if hex_to_rgba(&config.barbs.color).is_none() {
            return Err(RenderError::InvalidInput(format!("invalid barb color '{}'", config.barbs.color)).into());
        }

        debug!(days = days.len(), grid = %atmosphere.ivt.grid_shape(), "Prepared daily panels");
        Ok(Self {
            atmosphere,
            days,
            config,
        })
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    /// Draw and write one figure per day.
    pub fn render(&self, output_dir: &Path) -> PlotResult<Vec<DayOutput>> {
        let mut outputs = Vec::with_capacity(self.days.len());
        for day in &self.days {
            outputs.push(self.render_day(*day, output_dir)?);
        }
        info!(files = outputs.len(), dir = %output_dir.display(), "Wrote daily panels");
        Ok(outputs)
    }

    fn render_day(&self, day: NaiveDate, output_dir: &Path) -> PlotResult<DayOutput> {
        let cfg = self.config;
        let daily = |variable: AtmosVariable| -> PlotResult<Grid<f64>> {
            self.atmosphere
                .field(variable)
                .daily(day)
                .ok_or_else(|| LoadError::MissingData(format!("{} has no data on {}", variable, day)).into())
        };
        let u = daily(AtmosVariable::UWind700)?;
        let v = daily(AtmosVariable::VWind700)?;

        let rows = AtmosVariable::ALL.len().div_ceil(COLUMNS);
        let width = cfg.panel_width * COLUMNS as u32;
        let height = TITLE_HEIGHT as u32 + cfg.panel_height * rows as u32;
        let title = format!("ERA5 {}", day.format("%Y-%m-%d"));
        // The figure lives for this iteration only.
        let mut pixmap = titled_canvas(width, height, &title, 14.0)?;

        let mut panels = Vec::with_capacity(AtmosVariable::ALL.len());
        for (i, variable) in AtmosVariable::ALL.into_iter().enumerate() {
            let (row, col) = (i / COLUMNS, i % COLUMNS);
            let cell = Rect::from_xywh(
                (col as u32 * cfg.panel_width) as f32,
                TITLE_HEIGHT + (row as u32 * cfg.panel_height) as f32,
                cfg.panel_width as f32,
                cfg.panel_height as f32,
            )
            .ok_or_else(|| RenderError::InvalidInput("empty panel".to_string()))?;

            let grid = if variable == AtmosVariable::UWind700 {
                u.clone()
            } else if variable == AtmosVariable::VWind700 {
                v.clone()
            } else {
                daily(variable)?
            };
            let summary = self.draw_panel(&mut pixmap, cell, variable, &grid, (&u, &v))?;
            debug!(
                day = %day,
                variable = %variable,
                painted = summary.painted,
                lines = summary.contour_lines,
                barbs = summary.barbs,
                "Drew panel"
            );
            panels.push(summary);
        }

        let path = output_dir.join(daily_file_name(day));
        write_png(&path, &pixmap)?;
        info!(day = %day, path = %path.display(), "Wrote daily panels");
        Ok(DayOutput { day, path, panels })
    }

    fn draw_panel(
        &self,
        pixmap: &mut Pixmap,
        cell: Rect,
        variable: AtmosVariable,
        grid: &Grid<f64>,
        wind: (&Grid<f64>, &Grid<f64>),
    ) -> PlotResult<PanelSummary> {
        let cfg = self.config;
        let field = self.atmosphere.field(variable);
        let (lats, lons) = (field.latitudes(), field.longitudes());
        let text_size = 8.0;

        let heading = format!("{} ({})", variable.title(), variable.display_units());
        let heading_style = TextStyle::new(9.0, BLACK).anchored(Anchor::Middle);
        draw_text(pixmap, &heading, cell.x() + cell.width() / 2.0, cell.y() + 12.0, &heading_style);

        let available = Rect::from_ltrb(
            cell.left() + 40.0,
            cell.top() + 26.0,
            cell.right() - 12.0,
            cell.bottom() - 64.0,
        )
        .ok_or_else(|| RenderError::InvalidInput(format!("panel {}x{} too small", cell.width(), cell.height())))?;
        let frame = MapFrame::fit(cfg.extent, available)?;

        let mut summary = PanelSummary {
            variable,
            painted: 0,
            contour_lines: 0,
            contour_labels: 0,
            barbs: 0,
        };

        let below = frame.area().bottom() + text_size * 2.4;
        if variable == AtmosVariable::Geopotential500 {
            let levels = grid
                .finite_range()
                .map(|(min, max)| generate_contour_levels(min, max, cfg.contour_interval))
                .unwrap_or_default();
            let contour_config = ContourConfig {
                levels,
                line_width: 1.2,
                label_font_size: text_size,
                ..ContourConfig::default()
            };
            let drawn = render_contours(pixmap, &frame, grid, lats, lons, &contour_config)?;
            summary.contour_lines = drawn.lines;
            summary.contour_labels = drawn.labels.len();

            let note = format!("CONTOUR INTERVAL {} M", cfg.contour_interval);
            let style = TextStyle::new(text_size, BLACK).anchored(Anchor::Middle);
            draw_text(pixmap, &note, cell.x() + cell.width() / 2.0, below + text_size * 2.0, &style);
        } else {
            let palette = cfg.fill_style(variable).palette_for(grid)?;
            summary.painted = render_filled_contours(pixmap, &frame, grid, lats, lons, &palette)?;

            let bar = Rect::from_xywh(
                frame.area().left(),
                below,
                frame.area().width(),
                text_size * 1.2,
            );
            if let Some(bar) = bar {
                draw_colorbar(pixmap, bar, &palette, variable.display_units(), text_size);
            }
        }

        frame.draw_graticule(pixmap, cfg.graticule_step, text_size);
        frame.draw_border(pixmap);

        if cfg.barbs.panels.contains(&variable) {
            let barb_config = BarbConfig {
                size: cfg.barbs.size,
                stride: cfg.barbs.stride,
                color: cfg.barbs.color.clone(),
                knots_per_unit: MS_TO_KNOTS,
            };
            let (u, v) = wind;
            summary.barbs = render_wind_barbs(pixmap, &frame, u, v, lats, lons, &barb_config)?.len();
        }

        Ok(summary)
    }
}

/// Prepare and render in one step.
pub fn render_daily_panels(
    atmosphere: &Atmosphere,
    config: &DailyConfig,
    output_dir: &Path,
) -> PlotResult<Vec<DayOutput>> {
    DailyPanels::prepare(atmosphere, config)?.render(output_dir)
}
