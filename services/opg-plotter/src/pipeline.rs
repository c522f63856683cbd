//! The three-stage pipeline: load facets, load ERA5, render.

use std::path::PathBuf;

use ingestion::{load_atmosphere, load_facet_layers, load_opg_series, Atmosphere, FacetLayers, OpgSeries};
use tracing::info;

use crate::config::PlotterConfig;
use crate::error::PlotResult;
use crate::rendering::{DailyPanels, DayOutput, OverviewOutput, OverviewPlot, TimeseriesOutput, TimeseriesPlot};

/// Which figures to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    pub overview: bool,
    pub timeseries: bool,
    pub daily: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            overview: true,
            timeseries: true,
            daily: true,
        }
    }
}

/// Everything the pipeline wrote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub overview: Option<OverviewOutput>,
    pub timeseries: Option<TimeseriesOutput>,
    pub daily: Vec<DayOutput>,
}

impl PipelineReport {
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        files.extend(self.overview.iter().map(|o| o.path.clone()));
        files.extend(self.timeseries.iter().map(|t| t.path.clone()));
        files.extend(self.daily.iter().map(|d| d.path.clone()));
        files
    }
}

/// Inputs of the enabled stages.
struct Inputs {
    layers: Option<FacetLayers>,
    series: Option<OpgSeries>,
    atmosphere: Option<Atmosphere>,
}

fn load_inputs(config: &PlotterConfig, stages: Stages) -> PlotResult<Inputs> {
    let facet_dir = &config.paths.facet_dir;
    let layers = if stages.overview {
        Some(load_facet_layers(facet_dir, &config.facet_files)?)
    } else {
        None
    };
    let series = if stages.timeseries {
        let series = load_opg_series(&facet_dir.join(&config.facet_files.opg))?;
        info!(dates = series.len(), facets = series.facets().len(), "Loaded OPG table");
        Some(series)
    } else {
        None
    };
    let atmosphere = if stages.daily {
        Some(load_atmosphere(&config.paths.era5_dir, &config.era5_files, &config.period)?)
    } else {
        None
    };
    Ok(Inputs {
        layers,
        series,
        atmosphere,
    })
}

/// Load the inputs of every enabled stage, check all figures, then write them.
///
/// Nothing is written unless every enabled figure passed its checks.
pub fn run(config: &PlotterConfig, stages: Stages) -> PlotResult<PipelineReport> {
    let inputs = load_inputs(config, stages)?;

    let overview = inputs
        .layers
        .as_ref()
        .map(|layers| OverviewPlot::prepare(layers, config.overview.facet, &config.overview))
        .transpose()?;
    let timeseries = inputs
        .series
        .as_ref()
        .map(|series| TimeseriesPlot::prepare(series, config.timeseries_facet(), &config.timeseries))
        .transpose()?;
    let daily = inputs
        .atmosphere
        .as_ref()
        .map(|atmosphere| DailyPanels::prepare(atmosphere, &config.daily))
        .transpose()?;

    let output_dir = &config.paths.output_dir;
    let report = PipelineReport {
        overview: overview.map(|plot| plot.render(output_dir)).transpose()?,
        timeseries: timeseries.map(|plot| plot.render(output_dir)).transpose()?,
        daily: match daily {
            Some(panels) => panels.render(output_dir)?,
            None => Vec::new(),
        },
    };

    info!(
        files = report.files().len(),
        dir = %output_dir.display(),
        "Pipeline complete"
    );
    Ok(report)
}
