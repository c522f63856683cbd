//! Facet OPG plotter.
//!
//! Loads the facet tables and ERA5 extracts through `ingestion`, composes
//! the overview map, the OPG time series and the daily panels with
//! `renderer`, and writes them as PNG files.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod rendering;

pub use config::{load_config, PlotterConfig};
pub use error::{PlotError, PlotResult};
pub use pipeline::{run, PipelineReport, Stages};
