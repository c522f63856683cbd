//! Geographic extents for map panels.

use serde::{Deserialize, Serialize};

use crate::error::{OpgError, OpgResult};

/// A longitude/latitude rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl GeoExtent {
    /// Create an extent, rejecting empty or inverted rectangles.
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> OpgResult<Self> {
        let extent = Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        };
        extent.validate()?;
        Ok(extent)
    }

    /// Parse "min_lon,max_lon,min_lat,max_lat" (the order map extents are
    /// usually written in).
    pub fn from_csv_string(s: &str) -> OpgResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(OpgError::InvalidExtent(format!(
                "'{}': expected 'min_lon,max_lon,min_lat,max_lat'",
                s
            )));
        }
        let mut values = [0.0; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| OpgError::InvalidExtent(format!("invalid number '{}'", part)))?;
        }
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Check ordering and finiteness.
    pub fn validate(&self) -> OpgResult<()> {
        let finite = [self.min_lon, self.max_lon, self.min_lat, self.max_lat]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(OpgError::InvalidExtent(format!("{:?} has non-finite bounds", self)));
        }
        if self.min_lon >= self.max_lon || self.min_lat >= self.max_lat {
            return Err(OpgError::InvalidExtent(format!("{:?} is empty or inverted", self)));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}
