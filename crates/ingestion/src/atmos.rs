//! ERA5 atmospheric fields in display units.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use netcdf_parser::{read_variable, RawField, VariableRequest};
use opg_common::{DateRange, Grid, Shape};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LoadError, Result};
use crate::units::{AtmosVariable, DailyReduction};
use crate::validate;

/// File names of the six ERA5 extracts, relative to the ERA5 directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosFiles {
    pub ivt: String,
    pub precipitation: String,
    pub temperature_700: String,
    pub u_wind_700: String,
    pub v_wind_700: String,
    pub geopotential_500: String,
}

impl Default for AtmosFiles {
    fn default() -> Self {
        Self {
            ivt: "era5_ivt.nc".to_string(),
            precipitation: "era5_tp.nc".to_string(),
            temperature_700: "era5_t700.nc".to_string(),
            u_wind_700: "era5_u700.nc".to_string(),
            v_wind_700: "era5_v700.nc".to_string(),
            geopotential_500: "era5_z500.nc".to_string(),
        }
    }
}

impl AtmosFiles {
    pub fn file_for(&self, variable: AtmosVariable) -> &str {
        match variable {
            AtmosVariable::Ivt => &self.ivt,
            AtmosVariable::Precipitation => &self.precipitation,
            AtmosVariable::Temperature700 => &self.temperature_700,
            AtmosVariable::UWind700 => &self.u_wind_700,
            AtmosVariable::VWind700 => &self.v_wind_700,
            AtmosVariable::Geopotential500 => &self.geopotential_500,
        }
    }
}

/// One variable on a `(time, latitude, longitude)` grid, in display units.
///
/// Latitude and longitude are 1-D axes; `values` is time-major with one
/// row-major plane per time step.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosField {
    variable: AtmosVariable,
    times: Vec<NaiveDateTime>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    values: Vec<f64>,
}

impl AtmosField {
    /// Build a field from values already in display units.
    pub fn new(
        variable: AtmosVariable,
        times: Vec<NaiveDateTime>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let expected = times.len() * latitudes.len() * longitudes.len();
        if values.len() != expected {
            return Err(LoadError::MissingData(format!(
                "{}: {} values for {} times on a {}x{} grid",
                variable,
                values.len(),
                times.len(),
                latitudes.len(),
                longitudes.len()
            )));
        }
        Ok(Self {
            variable,
            times,
            latitudes,
            longitudes,
            values,
        })
    }

    /// Convert a field read from NetCDF into display units.
    ///
    /// A field read from a different pressure level than the variable's
    /// nominal one is rejected.
    pub fn from_raw(variable: AtmosVariable, raw: RawField) -> Result<Self> {
        if let (Some(expected), Some(found)) = (variable.level_hpa(), raw.level) {
            if (expected - found).abs() >= 0.5 {
                return Err(LoadError::MissingData(format!(
                    "{} needs {} hPa but '{}' holds {} hPa",
                    variable, expected, raw.name, found
                )));
            }
        }
        if let Some(units) = raw.units.as_deref() {
            if !units_match(units, variable.source_units()) {
                warn!(
                    variable = %variable,
                    found = units,
                    expected = variable.source_units(),
                    "Unexpected source units, converting anyway"
                );
            }
        }
        let RawField {
            times,
            latitudes,
            longitudes,
            mut values,
            ..
        } = raw;
        variable.conversion().apply_in_place(&mut values);
        Self::new(variable, times, latitudes, longitudes, values)
    }

    pub fn variable(&self) -> AtmosVariable {
        self.variable
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Horizontal grid shape (latitudes x longitudes).
    pub fn grid_shape(&self) -> Shape {
        Shape::new(self.latitudes.len(), self.longitudes.len())
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    fn plane(&self, t: usize) -> &[f64] {
        let plane = self.grid_shape().len();
        &self.values[t * plane..(t + 1) * plane]
    }

    /// The grid of time step `t`.
    pub fn step(&self, t: usize) -> Option<Grid<f64>> {
        if t >= self.times.len() {
            return None;
        }
        Grid::new(self.latitudes.len(), self.longitudes.len(), self.plane(t).to_vec()).ok()
    }

    /// Keep only the time steps whose calendar day lies in `range`.
    ///
    /// A range that matches nothing yields an empty field on the same grid.
    pub fn subset(&self, range: &DateRange) -> Self {
        let mut times = Vec::new();
        let mut values = Vec::new();
        for (t, time) in self.times.iter().enumerate() {
            if range.contains_datetime(time) {
                times.push(*time);
                values.extend_from_slice(self.plane(t));
            }
        }
        Self {
            variable: self.variable,
            times,
            latitudes: self.latitudes.clone(),
            longitudes: self.longitudes.clone(),
            values,
        }
    }

    /// Distinct calendar days on the time axis, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.times
            .iter()
            .map(|t| t.date())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Reduce all time steps of `day` to one grid: summed for accumulations,
    /// averaged otherwise. NaN cells are skipped; a cell that is NaN at every
    /// step stays NaN.
    pub fn daily(&self, day: NaiveDate) -> Option<Grid<f64>> {
        let steps: Vec<usize> = (0..self.times.len())
            .filter(|&t| self.times[t].date() == day)
            .collect();
        if steps.is_empty() {
            return None;
        }

        let plane = self.grid_shape().len();
        let mut sum = vec![0.0; plane];
        let mut count = vec![0u32; plane];
        for &t in &steps {
            for (i, v) in self.plane(t).iter().enumerate() {
                if v.is_finite() {
                    sum[i] += v;
                    count[i] += 1;
                }
            }
        }

        let reduction = self.variable.daily_reduction();
        let data = sum
            .into_iter()
            .zip(count)
            .map(|(s, n)| match (n, reduction) {
                (0, _) => f64::NAN,
                (_, DailyReduction::Sum) => s,
                (n, DailyReduction::Mean) => s / n as f64,
            })
            .collect();
        Grid::new(self.latitudes.len(), self.longitudes.len(), data).ok()
    }
}

fn units_match(found: &str, expected: &str) -> bool {
    let normalize = |s: &str| s.replace("**", "").replace('^', "").replace(' ', "");
    normalize(found) == normalize(expected)
}

/// The six fields of one ERA5 extract, on a shared grid and time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Atmosphere {
    pub ivt: AtmosField,
    pub precipitation: AtmosField,
    pub temperature_700: AtmosField,
    pub u_wind_700: AtmosField,
    pub v_wind_700: AtmosField,
    pub geopotential_500: AtmosField,
}

impl Atmosphere {
    /// Assemble and validate the six fields.
    pub fn new(fields: [AtmosField; 6]) -> Result<Self> {
        let [ivt, precipitation, temperature_700, u_wind_700, v_wind_700, geopotential_500] =
            fields;
        let atmosphere = Self {
            ivt,
            precipitation,
            temperature_700,
            u_wind_700,
            v_wind_700,
            geopotential_500,
        };
        for variable in AtmosVariable::ALL {
            let field = atmosphere.field(variable);
            if field.variable() != variable {
                return Err(LoadError::MissingData(format!(
                    "expected {} in slot {}, found {}",
                    variable,
                    variable,
                    field.variable()
                )));
            }
        }
        validate::atmosphere(&atmosphere)?;
        Ok(atmosphere)
    }

    pub fn field(&self, variable: AtmosVariable) -> &AtmosField {
        match variable {
            AtmosVariable::Ivt => &self.ivt,
            AtmosVariable::Precipitation => &self.precipitation,
            AtmosVariable::Temperature700 => &self.temperature_700,
            AtmosVariable::UWind700 => &self.u_wind_700,
            AtmosVariable::VWind700 => &self.v_wind_700,
            AtmosVariable::Geopotential500 => &self.geopotential_500,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &AtmosField> {
        AtmosVariable::ALL.into_iter().map(move |v| self.field(v))
    }

    /// Days present on the shared time axis.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.ivt.days()
    }

    pub fn subset(&self, range: &DateRange) -> Self {
        Self {
            ivt: self.ivt.subset(range),
            precipitation: self.precipitation.subset(range),
            temperature_700: self.temperature_700.subset(range),
            u_wind_700: self.u_wind_700.subset(range),
            v_wind_700: self.v_wind_700.subset(range),
            geopotential_500: self.geopotential_500.subset(range),
        }
    }
}

/// Read one variable from its file and convert it to display units.
pub fn load_field(path: &Path, variable: AtmosVariable) -> Result<AtmosField> {
    let mut request = VariableRequest {
        names: variable.nc_names().iter().map(|s| s.to_string()).collect(),
        level_hpa: None,
    };
    if let Some(hpa) = variable.level_hpa() {
        request = request.at_level(hpa);
    }
    let raw = read_variable(path, &request).map_err(|e| LoadError::netcdf(path, e))?;
    debug!(
        variable = %variable,
        nc_name = %raw.name,
        steps = raw.times.len(),
        "Read ERA5 variable"
    );
    AtmosField::from_raw(variable, raw)
}

/// Load the six ERA5 variables, convert units and restrict them to `range`.
pub fn load_atmosphere(dir: &Path, files: &AtmosFiles, range: &DateRange) -> Result<Atmosphere> {
    let mut loaded = Vec::with_capacity(AtmosVariable::ALL.len());
    for variable in AtmosVariable::ALL {
        let path = dir.join(files.file_for(variable));
        loaded.push(load_field(&path, variable)?.subset(range));
    }

    let fields: [AtmosField; 6] = loaded
        .try_into()
        .map_err(|_| LoadError::MissingData("expected six atmospheric fields".to_string()))?;
    let atmosphere = Atmosphere::new(fields)?;

    info!(
        dir = %dir.display(),
        start = %range.start,
        end = %range.end,
        steps = atmosphere.ivt.len(),
        days = atmosphere.days().len(),
        grid = %atmosphere.ivt.grid_shape(),
        "Loaded ERA5 fields"
    );
    Ok(atmosphere)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn raw(name: &str, values: Vec<f64>) -> RawField {
        RawField {
            name: name.to_string(),
            units: None,
            times: vec![at(1, 0), at(1, 12)],
            latitudes: vec![48.0, 47.0],
            longitudes: vec![-124.0],
            level: None,
            values,
        }
    }

    #[test]
    fn test_from_raw_converts() {
        let field =
            AtmosField::from_raw(AtmosVariable::Temperature700, raw("t", vec![273.15, 283.15, 263.15, 273.15]))
                .unwrap();
        assert!(field.values()[0].abs() < 1e-9);
        assert!((field.values()[1] - 10.0).abs() < 1e-9);
        assert_eq!(field.grid_shape(), Shape::new(2, 1));
    }

    #[test]
    fn test_from_raw_rejects_wrong_level() {
        let mut t850 = raw("t", vec![273.15; 4]);
        t850.level = Some(850.0);
        let err = AtmosField::from_raw(AtmosVariable::Temperature700, t850).unwrap_err();
        assert!(matches!(err, LoadError::MissingData(ref m) if m.contains("850")));

        let mut t700 = raw("t", vec![273.15; 4]);
        t700.level = Some(700.0);
        assert!(AtmosField::from_raw(AtmosVariable::Temperature700, t700).is_ok());

        // Surface variables carry no level to compare
        let mut tp = raw("tp", vec![0.0; 4]);
        tp.level = Some(1000.0);
        assert!(AtmosField::from_raw(AtmosVariable::Precipitation, tp).is_ok());
    }

    #[test]
    fn test_from_raw_rejects_bad_length() {
        assert!(AtmosField::from_raw(AtmosVariable::Ivt, raw("ivt", vec![1.0; 3])).is_err());
    }

    #[test]
    fn test_daily_sum_and_mean() {
        let precip =
            AtmosField::from_raw(AtmosVariable::Precipitation, raw("tp", vec![0.001, 0.0, 0.002, f64::NAN]))
                .unwrap();
        let day = precip.daily(at(1, 0).date()).unwrap();
        assert!((day.as_slice()[0] - 3.0).abs() < 1e-9);
        assert_eq!(day.as_slice()[1], 0.0);

        let ivt = AtmosField::from_raw(AtmosVariable::Ivt, raw("ivt", vec![100.0, 200.0, 300.0, 400.0])).unwrap();
        let day = ivt.daily(at(1, 0).date()).unwrap();
        assert_eq!(day.as_slice(), &[200.0, 300.0]);

        assert!(ivt.daily(at(2, 0).date()).is_none());
    }

    #[test]
    fn test_days_are_distinct() {
        let ivt = AtmosField::from_raw(AtmosVariable::Ivt, raw("ivt", vec![0.0; 4])).unwrap();
        assert_eq!(ivt.days(), vec![at(1, 0).date()]);
    }

    #[test]
    fn test_units_match_ignores_spacing() {
        assert!(units_match("m**2 s**-2", "m2 s-2"));
        assert!(units_match("K", "K"));
        assert!(!units_match("kg m**-2", "m"));
    }

    #[test]
    fn test_file_for() {
        let files = AtmosFiles::default();
        assert_eq!(files.file_for(AtmosVariable::Geopotential500), "era5_z500.nc");
    }
}
