//! OPG time series for one facet.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use ingestion::OpgSeries;
use opg_common::{DateRange, FacetId};
use renderer::chart::Chart;
use renderer::png::write_png;
use renderer::style::{format_level, hex_to_rgba, nice_levels};
use renderer::text::{draw_text, Anchor, TextStyle};
use renderer::{Rect, RenderError};
use tracing::info;

use super::{titled_canvas, BLACK};
use crate::config::TimeseriesConfig;
use crate::error::PlotResult;

pub fn timeseries_file_name(facet: FacetId) -> String {
    format!("opg_timeseries_{}.png", facet)
}

/// A facet's column of the OPG table, ready to plot.
#[derive(Debug, Clone)]
pub struct TimeseriesPlot<'a> {
    facet: FacetId,
    points: Vec<(NaiveDate, f64)>,
    missing: usize,
    span: DateRange,
    config: &'a TimeseriesConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesOutput {
    pub path: PathBuf,
    pub points: usize,
    /// Dates without a value; these are gaps, not zeros.
    pub missing: usize,
}

impl<'a> TimeseriesPlot<'a> {
    /// Extract `facet` from the table. A facet without a column, or an empty
    /// table, cannot be plotted.
    pub fn prepare(series: &OpgSeries, facet: FacetId, config: &'a TimeseriesConfig) -> PlotResult<Self> {
        let column = series.column(facet).ok_or(RenderError::FacetNotFound(facet))?;
        let span = series
            .date_span()
            .ok_or_else(|| RenderError::InvalidInput("OPG table has no rows".to_string()))?;
        if hex_to_rgba(&config.color).is_none() {
            return Err(RenderError::InvalidInput(format!("invalid point color '{}'", config.color)).into());
        }

        let total = column.len();
        let points: Vec<(NaiveDate, f64)> = column
            .into_iter()
            .filter_map(|(date, value)| value.filter(|v| v.is_finite()).map(|v| (date, v)))
            .collect();
        let missing = total - points.len();

        Ok(Self {
            facet,
            points,
            missing,
            span,
            config,
        })
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn render(&self, output_dir: &Path) -> PlotResult<TimeseriesOutput> {
        let cfg = self.config;
        let title_size = 14.0;
        let text_size = 9.0;
        let title = format!("OPG FACET {}", self.facet);
        let mut pixmap = titled_canvas(cfg.width, cfg.height, &title, title_size)?;

        let area = Rect::from_ltrb(70.0, title_size * 3.0, cfg.width as f32 - 24.0, cfg.height as f32 - 40.0)
            .ok_or_else(|| RenderError::InvalidInput(format!("timeseries {}x{} leaves no plot area", cfg.width, cfg.height)))?;

        let x_max = (self.span.end - self.span.start).num_days() as f64;
        let (y_min, y_max) = self.value_range();
        let y_levels = nice_levels(y_min, y_max, 6);
        let y_domain = (
            y_levels.first().copied().unwrap_or(-1.0),
            y_levels.last().copied().unwrap_or(1.0),
        );
        let chart = Chart::new(area, (0.0, x_max.max(1.0)), y_domain);

        let step = y_levels.get(1).zip(y_levels.first()).map(|(b, a)| b - a).unwrap_or(1.0);
        let y_ticks: Vec<(f64, String)> = y_levels.iter().map(|v| (*v, format_level(*v, step))).collect();
        chart.draw_axes(&mut pixmap, &self.x_ticks(), &y_ticks, text_size);
        chart.draw_hline(&mut pixmap, 0.0, [90, 90, 90, 255], 1.0);

        let color = hex_to_rgba(&cfg.color).unwrap_or(BLACK);
        let xy: Vec<(f64, f64)> = self
            .points
            .iter()
            .map(|(date, v)| ((*date - self.span.start).num_days() as f64, *v))
            .collect();
        let drawn = chart.scatter(&mut pixmap, &xy, cfg.point_radius, color);

        let axis_style = TextStyle::new(text_size, BLACK)
            .anchored(Anchor::Middle)
            .rotated(-std::f32::consts::FRAC_PI_2);
        draw_text(&mut pixmap, "OPG (MM/KM)", 18.0, area.top() + area.height() / 2.0, &axis_style);

        let path = output_dir.join(timeseries_file_name(self.facet));
        write_png(&path, &pixmap)?;
        info!(
            path = %path.display(),
            facet = %self.facet,
            points = drawn,
            missing = self.missing,
            "Wrote OPG time series"
        );

        Ok(TimeseriesOutput {
            path,
            points: drawn,
            missing: self.missing,
        })
    }

    /// Value range including zero so the zero line is always visible.
    fn value_range(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((0.0f64, 0.0f64), |(lo, hi), (_, v)| (lo.min(*v), hi.max(*v)))
    }

    /// January 1st of every year inside the span; month starts when the span
    /// covers less than two year boundaries.
    fn x_ticks(&self) -> Vec<(f64, String)> {
        let offset = |d: NaiveDate| (d - self.span.start).num_days() as f64;
        let years: Vec<(f64, String)> = (self.span.start.year()..=self.span.end.year())
            .filter_map(|y| NaiveDate::from_ymd_opt(y, 1, 1))
            .filter(|d| self.span.contains(*d))
            .map(|d| (offset(d), d.year().to_string()))
            .collect();
        if years.len() >= 2 {
            return years;
        }

        let mut ticks = Vec::new();
        let mut month = NaiveDate::from_ymd_opt(self.span.start.year(), self.span.start.month(), 1);
        while let Some(d) = month {
            if d > self.span.end {
                break;
            }
            if d >= self.span.start {
                ticks.push((offset(d), d.format("%Y-%m").to_string()));
            }
            month = d.checked_add_months(chrono::Months::new(1));
        }
        ticks
    }
}

/// Prepare and render in one step.
pub fn render_timeseries(
    series: &OpgSeries,
    facet: FacetId,
    config: &TimeseriesConfig,
    output_dir: &Path,
) -> PlotResult<TimeseriesOutput> {
    TimeseriesPlot::prepare(series, facet, config)?.render(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, m, d).unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(timeseries_file_name(FacetId(2131)), "opg_timeseries_2131.png");
    }

    #[test]
    fn test_missing_values_are_gaps() {
        let series = OpgSeries::new(
            vec![day(1, 1), day(1, 2), day(1, 3)],
            vec![FacetId(2131)],
            vec![vec![Some(0.4)], vec![None], vec![Some(-0.2)]],
        )
        .unwrap();
        let config = TimeseriesConfig::default();
        let plot = TimeseriesPlot::prepare(&series, FacetId(2131), &config).unwrap();
        assert_eq!(plot.points(), &[(day(1, 1), 0.4), (day(1, 3), -0.2)]);
        assert_eq!(plot.missing, 1);
        assert_eq!(plot.value_range(), (-0.2, 0.4));
    }

    #[test]
    fn test_month_ticks_for_short_span() {
        let series = OpgSeries::new(
            vec![day(1, 15), day(3, 20)],
            vec![FacetId(1)],
            vec![vec![Some(1.0)], vec![Some(2.0)]],
        )
        .unwrap();
        let config = TimeseriesConfig::default();
        let plot = TimeseriesPlot::prepare(&series, FacetId(1), &config).unwrap();
        let labels: Vec<String> = plot.x_ticks().into_iter().map(|(_, l)| l).collect();
        assert_eq!(labels, vec!["2017-02", "2017-03"]);
    }
}
