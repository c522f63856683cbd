//! Facet OPG plotter.
//!
//! Reads the facet CSV tables and the six ERA5 NetCDF extracts and writes
//! the orientation overview, one OPG time series and one panel figure per
//! day of the configured period.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use opg_common::time::parse_date;
use opg_common::FacetId;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use opg_plotter::{load_config, run, PlotterConfig, Stages};

#[derive(Parser, Debug)]
#[command(name = "opg-plotter")]
#[command(about = "Plot facet orientation, OPG time series and daily ERA5 panels")]
struct Args {
    /// Configuration file path (built-in defaults when it does not exist)
    #[arg(short, long, default_value = "config/opg-plotter.yaml")]
    config: PathBuf,

    /// Directory with the facet CSV tables
    #[arg(long, env = "OPG_FACET_DIR")]
    facet_dir: Option<PathBuf>,

    /// Directory with the ERA5 NetCDF extracts
    #[arg(long, env = "OPG_ERA5_DIR")]
    era5_dir: Option<PathBuf>,

    /// Where PNG files are written
    #[arg(short, long, env = "OPG_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// First day of the daily panels (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last day of the daily panels, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Facet labelled on the overview and plotted in the time series
    #[arg(short, long)]
    facet: Option<u32>,

    #[arg(long)]
    skip_overview: bool,

    #[arg(long)]
    skip_timeseries: bool,

    #[arg(long)]
    skip_daily: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Command-line values take precedence over the configuration file.
    fn apply(&self, config: &mut PlotterConfig) -> Result<()> {
        if let Some(dir) = &self.facet_dir {
            config.paths.facet_dir = dir.clone();
        }
        if let Some(dir) = &self.era5_dir {
            config.paths.era5_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.paths.output_dir = dir.clone();
        }
        if let Some(start) = &self.start {
            config.period.start = parse_date(start).with_context(|| format!("Invalid --start '{}'", start))?;
        }
        if let Some(end) = &self.end {
            config.period.end = parse_date(end).with_context(|| format!("Invalid --end '{}'", end))?;
        }
        if let Some(facet) = self.facet {
            config.overview.facet = FacetId(facet);
            config.timeseries.facet = Some(FacetId(facet));
        }
        Ok(())
    }

    fn stages(&self) -> Stages {
        Stages {
            overview: !self.skip_overview,
            timeseries: !self.skip_timeseries,
            daily: !self.skip_daily,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    info!("Starting OPG plotter");

    let mut config = load_config(&args.config)?;
    args.apply(&mut config)?;
    config.validate().context("Invalid configuration")?;

    let stages = args.stages();
    info!(
        facet_dir = %config.paths.facet_dir.display(),
        era5_dir = %config.paths.era5_dir.display(),
        output_dir = %config.paths.output_dir.display(),
        start = %config.period.start,
        end = %config.period.end,
        facet = %config.overview.facet,
        ?stages,
        "Resolved configuration"
    );

    let report = run(&config, stages).context("Plotting failed")?;

    info!(
        files = report.files().len(),
        days = report.daily.len(),
        "Done"
    );
    Ok(())
}
