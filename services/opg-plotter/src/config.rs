//! Plotter configuration.
//!
//! Loaded from a YAML file whose sections all have defaults, so a partial
//! file (or no file at all) works:
//!
//! ```yaml
//! paths:
//!   facet_dir: data/facets
//!   era5_dir: data/era5
//!   output_dir: output
//! period:
//!   start: 2017-01-07
//!   end: 2017-01-12
//! overview:
//!   facet: 2131
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use ingestion::{AtmosFiles, AtmosVariable, FacetFiles};
use opg_common::{DateRange, FacetId, GeoExtent, Grid};
use renderer::style::nice_levels;
use renderer::{ColorStop, Gradient, LevelPalette, PaletteName, RenderResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Top level
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotterConfig {
    pub paths: PathsConfig,
    pub facet_files: FacetFiles,
    pub era5_files: AtmosFiles,
    /// Closed interval of days plotted as daily panels.
    pub period: DateRange,
    pub overview: OverviewConfig,
    pub timeseries: TimeseriesConfig,
    pub daily: DailyConfig,
}

impl Default for PlotterConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            facet_files: FacetFiles::default(),
            era5_files: AtmosFiles::default(),
            period: DateRange::new(ymd(2017, 1, 7), ymd(2017, 1, 12)),
            overview: OverviewConfig::default(),
            timeseries: TimeseriesConfig::default(),
            daily: DailyConfig::default(),
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub facet_dir: PathBuf,
    pub era5_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            facet_dir: PathBuf::from("data/facets"),
            era5_dir: PathBuf::from("data/era5"),
            output_dir: PathBuf::from("output"),
        }
    }
}

// ============================================================================
// Figures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    /// Facet labelled on the map.
    pub facet: FacetId,
    pub extent: GeoExtent,
    pub width: u32,
    pub height: u32,
    /// Graticule spacing in degrees
    pub graticule_step: f64,
    pub label_size: f32,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            facet: FacetId(2131),
            extent: GeoExtent {
                min_lon: -125.0,
                max_lon: -116.5,
                min_lat: 45.5,
                max_lat: 49.0,
            },
            width: 1000,
            height: 760,
            graticule_step: 1.0,
            label_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeseriesConfig {
    /// Facet whose OPG column is plotted; the overview facet when unset.
    pub facet: Option<FacetId>,
    pub width: u32,
    pub height: u32,
    pub point_radius: f32,
    pub color: String,
}

impl Default for TimeseriesConfig {
    fn default() -> Self {
        Self {
            facet: None,
            width: 1400,
            height: 560,
            point_radius: 2.0,
            color: "#1F77B4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyConfig {
    pub extent: GeoExtent,
    /// Size of one of the six panels in pixels.
    pub panel_width: u32,
    pub panel_height: u32,
    pub graticule_step: f64,
    /// Spacing of the 500 hPa height contours in metres.
    pub contour_interval: f64,
    pub barbs: BarbSettings,
    /// Fill style overrides per variable. Variables not listed use built-in styles.
    pub fills: BTreeMap<AtmosVariable, FillStyle>,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            extent: GeoExtent {
                min_lon: -140.0,
                max_lon: -110.0,
                min_lat: 35.0,
                max_lat: 55.0,
            },
            panel_width: 520,
            panel_height: 440,
            graticule_step: 10.0,
            contour_interval: 60.0,
            barbs: BarbSettings::default(),
            fills: BTreeMap::new(),
        }
    }
}

impl DailyConfig {
    /// Fill style of a panel, falling back to the built-in one.
    pub fn fill_style(&self, variable: AtmosVariable) -> FillStyle {
        self.fills
            .get(&variable)
            .cloned()
            .unwrap_or_else(|| FillStyle::builtin(variable))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarbSettings {
    /// Plot every `stride`-th grid point along both axes.
    pub stride: usize,
    /// Glyph size in pixels
    pub size: f32,
    pub color: String,
    /// Panels that get the 700 hPa wind overlay.
    pub panels: Vec<AtmosVariable>,
}

impl Default for BarbSettings {
    fn default() -> Self {
        Self {
            stride: 5,
            size: 24.0,
            color: "#000000".to_string(),
            panels: vec![AtmosVariable::Ivt, AtmosVariable::Temperature700],
        }
    }
}

/// How a filled panel picks its levels and colors.
///
/// Levels come from `levels` when given, otherwise about `bins` round
/// levels spanning the day's data (centered on zero when `symmetric`).
/// Colors come from `stops` when given, otherwise from `palette` stretched
/// over the levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillStyle {
    pub palette: PaletteName,
    pub stops: Vec<ColorStop>,
    pub levels: Option<Vec<f64>>,
    pub bins: usize,
    pub symmetric: bool,
}

impl Default for FillStyle {
    fn default() -> Self {
        Self {
            palette: PaletteName::Moisture,
            stops: Vec::new(),
            levels: None,
            bins: 10,
            symmetric: false,
        }
    }
}

impl FillStyle {
    pub fn builtin(variable: AtmosVariable) -> Self {
        let (palette, symmetric) = match variable {
            AtmosVariable::Ivt => (PaletteName::Moisture, false),
            AtmosVariable::Precipitation => (PaletteName::Precipitation, false),
            AtmosVariable::Temperature700 => (PaletteName::Temperature, false),
            AtmosVariable::UWind700 | AtmosVariable::VWind700 => (PaletteName::Diverging, true),
            AtmosVariable::Geopotential500 => (PaletteName::Geopotential, false),
        };
        Self {
            palette,
            symmetric,
            ..Self::default()
        }
    }

    /// Level palette for one day's grid.
    pub fn palette_for(&self, grid: &Grid<f64>) -> RenderResult<LevelPalette> {
        let levels = match &self.levels {
            Some(levels) => levels.clone(),
            None => {
                let (min, max) = grid.finite_range().unwrap_or((0.0, 1.0));
                if self.symmetric {
                    let reach = min.abs().max(max.abs());
                    nice_levels(-reach, reach, self.bins)
                } else {
                    nice_levels(min, max, self.bins)
                }
            }
        };

        let gradient = if self.stops.is_empty() {
            let lo = levels.first().copied().unwrap_or(0.0);
            let hi = levels.last().copied().unwrap_or(1.0);
            self.palette.gradient().rescaled(lo, hi)
        } else {
            Gradient::from_stops(&self.stops)?
        };
        LevelPalette::from_gradient(levels, &gradient)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load configuration from `path`, or the defaults when it does not exist.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PlotterConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "No configuration file, using built-in defaults");
        return Ok(PlotterConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plotter config from {:?}", path))?;
    let config: PlotterConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse plotter config from {:?}", path))?;

    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Finest graticule spacing accepted, in degrees.
pub const MIN_GRATICULE_STEP: f64 = 0.01;

impl PlotterConfig {
    /// Reject settings no figure can be drawn with.
    pub fn validate(&self) -> Result<()> {
        self.overview
            .extent
            .validate()
            .context("overview.extent")?;
        self.daily.extent.validate().context("daily.extent")?;

        if self.overview.width < 100 || self.overview.height < 100 {
            bail!(
                "overview size {}x{} is too small",
                self.overview.width,
                self.overview.height
            );
        }
        if self.timeseries.width < 100 || self.timeseries.height < 100 {
            bail!(
                "timeseries size {}x{} is too small",
                self.timeseries.width,
                self.timeseries.height
            );
        }
        if self.daily.panel_width < 100 || self.daily.panel_height < 100 {
            bail!(
                "daily panel size {}x{} is too small",
                self.daily.panel_width,
                self.daily.panel_height
            );
        }
        if !(self.daily.contour_interval.is_finite() && self.daily.contour_interval > 0.0) {
            bail!("daily.contour_interval must be positive");
        }
        if self.daily.barbs.stride == 0 {
            bail!("daily.barbs.stride must be at least 1");
        }
        for (name, step) in [
            ("overview.graticule_step", self.overview.graticule_step),
            ("daily.graticule_step", self.daily.graticule_step),
        ] {
            if !(step.is_finite() && step >= MIN_GRATICULE_STEP) {
                bail!("{} must be at least {} degrees, got {}", name, MIN_GRATICULE_STEP, step);
            }
        }

        for (variable, style) in &self.daily.fills {
            let variable = variable.config_key();
            if style.bins == 0 {
                bail!("daily.fills.{}: bins must be at least 1", variable);
            }
            if let Some(levels) = &style.levels {
                if levels.len() < 2 || levels.windows(2).any(|w| w[1] <= w[0]) {
                    bail!(
                        "daily.fills.{}: levels must be at least two increasing values",
                        variable
                    );
                }
            }
            if !style.stops.is_empty() {
                Gradient::from_stops(&style.stops)
                    .with_context(|| format!("daily.fills.{}.stops", variable))?;
            }
        }

        if self.period.start > self.period.end {
            warn!(
                start = %self.period.start,
                end = %self.period.end,
                "Period ends before it starts; no daily panels will be drawn"
            );
        }
        Ok(())
    }

    /// Facet plotted in the time series.
    pub fn timeseries_facet(&self) -> FacetId {
        self.timeseries.facet.unwrap_or(self.overview.facet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = PlotterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.period.num_days(), 6);
        assert_eq!(config.timeseries_facet(), FacetId(2131));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
paths:
  output_dir: /tmp/figures
period:
  start: 2017-01-01
  end: 2017-01-31
daily:
  contour_interval: 30
  fills:
    precipitation:
      levels: [0, 5, 10, 25, 50]
"#;
        let config: PlotterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("/tmp/figures"));
        assert_eq!(config.paths.facet_dir, PathBuf::from("data/facets"));
        assert_eq!(config.period.num_days(), 31);
        assert_eq!(config.daily.contour_interval, 30.0);
        assert_eq!(config.daily.barbs.stride, 5);

        let tp = config.daily.fill_style(AtmosVariable::Precipitation);
        assert_eq!(tp.levels, Some(vec![0.0, 5.0, 10.0, 25.0, 50.0]));
        assert_eq!(tp.bins, 10);
        assert_eq!(
            config.daily.fill_style(AtmosVariable::UWind700),
            FillStyle::builtin(AtmosVariable::UWind700)
        );
    }

    #[test]
    fn test_validate_rejects_bad_levels() {
        let mut config = PlotterConfig::default();
        config.daily.fills.insert(
            AtmosVariable::Ivt,
            FillStyle {
                levels: Some(vec![100.0, 50.0]),
                ..FillStyle::default()
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fill_errors_name_the_yaml_key() {
        let mut config = PlotterConfig::default();
        config.daily.fills.insert(
            AtmosVariable::Temperature700,
            FillStyle {
                bins: 0,
                ..FillStyle::default()
            },
        );
        let message = format!("{:#}", config.validate().unwrap_err());
        assert!(message.contains("daily.fills.temperature700"), "{}", message);

        for variable in AtmosVariable::ALL {
            let yaml = serde_yaml::to_string(&variable).unwrap();
            assert_eq!(yaml.trim(), variable.config_key());
        }
    }

    #[test]
    fn test_validate_rejects_tiny_graticule_step() {
        let mut config = PlotterConfig::default();
        config.overview.graticule_step = 0.0;
        assert!(config.validate().is_err());

        let mut config = PlotterConfig::default();
        config.daily.graticule_step = 0.001;
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("daily.graticule_step"), "{}", message);

        let mut config = PlotterConfig::default();
        config.daily.graticule_step = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = PlotterConfig::default();
        config.overview.graticule_step = MIN_GRATICULE_STEP;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_stride() {
        let mut config = PlotterConfig::default();
        config.daily.barbs.stride = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_symmetric_levels_center_on_zero() {
        let grid = Grid::new(1, 3, vec![-3.0, 1.0, 12.0]).unwrap();
        let palette = FillStyle::builtin(AtmosVariable::VWind700)
            .palette_for(&grid)
            .unwrap();
        let levels = palette.levels();
        assert_eq!(levels.first().map(|l| -l), levels.last().copied());
        assert!(levels.contains(&0.0));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config("/nonexistent/opg-plotter.yaml").unwrap();
        assert_eq!(config, PlotterConfig::default());
    }
}
