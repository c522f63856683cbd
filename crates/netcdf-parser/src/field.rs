//! Decoded variable contents.

use chrono::NaiveDateTime;

use crate::error::{NetCdfError, NetCdfResult};

/// A single variable read from an ERA5 file, reduced to `(time, lat, lon)`.
///
/// `values` is time-major: plane `t` occupies
/// `values[t * plane_len()..(t + 1) * plane_len()]`, rows running along
/// `latitudes` and columns along `longitudes`. Packed and missing cells
/// have already been decoded; missing cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    /// Variable name inside the file
    pub name: String,
    /// `units` attribute, if present
    pub units: Option<String>,
    pub times: Vec<NaiveDateTime>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    /// Pressure level (hPa) the values were taken from
    pub level: Option<f64>,
    pub values: Vec<f64>,
}

impl RawField {
    pub fn plane_len(&self) -> usize {
        self.latitudes.len() * self.longitudes.len()
    }

    /// Values of time step `t`.
    pub fn step(&self, t: usize) -> Option<&[f64]> {
        let plane = self.plane_len();
        self.values.get(t * plane..(t + 1) * plane)
    }

    /// Check that `values` matches the axes.
    pub fn validate(&self) -> NetCdfResult<()> {
        let expected = self.times.len() * self.plane_len();
        if self.values.len() != expected {
            return Err(NetCdfError::InvalidFormat(format!(
                "{}: {} values for {} times x {} lats x {} lons",
                self.name,
                self.values.len(),
                self.times.len(),
                self.latitudes.len(),
                self.longitudes.len()
            )));
        }
        Ok(())
    }
}

/// CF packing attributes of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            add_offset: 0.0,
            fill_value: None,
            missing_value: None,
        }
    }
}

impl Packing {
    fn is_missing(&self, raw: f64) -> bool {
        !raw.is_finite()
            || self.fill_value.is_some_and(|f| raw == f)
            || self.missing_value.is_some_and(|m| raw == m)
    }

    /// Decode stored values in place; fill and missing cells become NaN.
    pub fn unpack(&self, values: &mut [f64]) {
        for v in values.iter_mut() {
            *v = if self.is_missing(*v) {
                f64::NAN
            } else {
                *v * self.scale_factor + self.add_offset
            };
        }
    }
}
