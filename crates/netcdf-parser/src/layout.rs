//! Dimension layout of gridded reanalysis variables.
//!
//! ERA5 extracts come in a few naming flavours depending on the download
//! route (`latitude`/`lat`, `time`/`valid_time`, `level`/`pressure_level`).
//! The layout is resolved by name and must follow `time, [level,] lat, lon`.

use crate::error::{NetCdfError, NetCdfResult};

/// What a dimension indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRole {
    Time,
    Level,
    Latitude,
    Longitude,
}

impl AxisRole {
    /// Classify a dimension by its name.
    pub fn from_dim_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "time" | "valid_time" | "t" => Some(AxisRole::Time),
            "level" | "pressure_level" | "plev" | "isobaricinhpa" | "lev" => Some(AxisRole::Level),
            "latitude" | "lat" | "y" => Some(AxisRole::Latitude),
            "longitude" | "lon" | "x" => Some(AxisRole::Longitude),
            _ => None,
        }
    }
}

/// A named dimension with its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    pub name: String,
    pub len: usize,
}

/// Resolved dimension layout of one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLayout {
    pub time: Axis,
    pub level: Option<Axis>,
    pub latitude: Axis,
    pub longitude: Axis,
}

impl VariableLayout {
    /// Resolve the layout from `(name, len)` pairs in storage order.
    pub fn resolve(variable: &str, dims: &[(String, usize)]) -> NetCdfResult<Self> {
        let roles: Vec<AxisRole> = dims
            .iter()
            .map(|(name, _)| {
                AxisRole::from_dim_name(name).ok_or_else(|| {
                    NetCdfError::InvalidFormat(format!(
                        "{}: unrecognised dimension '{}'",
                        variable, name
                    ))
                })
            })
            .collect::<NetCdfResult<_>>()?;

        let axis = |i: usize| Axis {
            name: dims[i].0.clone(),
            len: dims[i].1,
        };

        match roles.as_slice() {
            [AxisRole::Time, AxisRole::Latitude, AxisRole::Longitude] => Ok(Self {
                time: axis(0),
                level: None,
                latitude: axis(1),
                longitude: axis(2),
            }),
            [AxisRole::Time, AxisRole::Level, AxisRole::Latitude, AxisRole::Longitude] => {
                Ok(Self {
                    time: axis(0),
                    level: Some(axis(1)),
                    latitude: axis(2),
                    longitude: axis(3),
                })
            }
            _ => Err(NetCdfError::InvalidFormat(format!(
                "{}: expected dimensions (time, [level,] latitude, longitude), found ({})",
                variable,
                dims.iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// Number of values in one horizontal plane.
    pub fn plane_len(&self) -> usize {
        self.latitude.len * self.longitude.len
    }

    /// Number of stored levels (1 without a level axis).
    pub fn level_count(&self) -> usize {
        self.level.as_ref().map_or(1, |l| l.len)
    }

    /// Total number of stored values.
    pub fn total_len(&self) -> usize {
        self.time.len * self.level_count() * self.plane_len()
    }
}

/// Find the index of a pressure level (hPa) on a level coordinate.
///
/// Coordinates stored in Pa are recognised and compared after scaling.
pub fn find_level(levels: &[f64], hpa: f64) -> Option<usize> {
    levels
        .iter()
        .position(|&v| (v - hpa).abs() < 0.5)
        .or_else(|| levels.iter().position(|&v| (v - hpa * 100.0).abs() < 50.0))
}

/// Pick the index of the requested level on a level coordinate.
///
/// A single stored level is only accepted when it is the requested one, so
/// an 850 hPa extract cannot stand in for a 700 hPa variable. Without a
/// request, a single level is taken as is and several levels are an error.
pub fn select_level(variable: &str, levels: &[f64], requested: Option<f64>) -> NetCdfResult<usize> {
    match (levels.len(), requested) {
        (0, _) => Err(NetCdfError::MissingData(format!("{}: empty level axis", variable))),
        (_, Some(hpa)) => find_level(levels, hpa).ok_or_else(|| {
            NetCdfError::MissingData(format!("{}: level {} hPa not in {:?}", variable, hpa, levels))
        }),
        (1, None) => Ok(0),
        (n, None) => Err(NetCdfError::MissingData(format!(
            "{}: {} levels stored but no level requested",
            variable, n
        ))),
    }
}

/// Keep one level out of `[time, level, plane]` storage.
pub fn extract_level(values: &[f64], layout: &VariableLayout, level: usize) -> Vec<f64> {
    let plane = layout.plane_len();
    let nlev = layout.level_count();
    let mut out = Vec::with_capacity(layout.time.len * plane);
    for t in 0..layout.time.len {
        let start = (t * nlev + level) * plane;
        out.extend_from_slice(&values[start..start + plane]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(spec: &[(&str, usize)]) -> Vec<(String, usize)> {
        spec.iter().map(|(n, l)| (n.to_string(), *l)).collect()
    }

    #[test]
    fn test_resolve_surface_variable() {
        let layout = VariableLayout::resolve(
            "tp",
            &dims(&[("time", 31), ("latitude", 81), ("longitude", 121)]),
        )
        .unwrap();
        assert!(layout.level.is_none());
        assert_eq!(layout.plane_len(), 81 * 121);
        assert_eq!(layout.total_len(), 31 * 81 * 121);
    }

    #[test]
    fn test_resolve_pressure_variable_with_new_names() {
        let layout = VariableLayout::resolve(
            "t",
            &dims(&[("valid_time", 4), ("pressure_level", 2), ("lat", 3), ("lon", 5)]),
        )
        .unwrap();
        assert_eq!(layout.level_count(), 2);
        assert_eq!(layout.latitude.name, "lat");
    }

    #[test]
    fn test_resolve_rejects_transposed_grid() {
        let err = VariableLayout::resolve(
            "t",
            &dims(&[("time", 1), ("longitude", 5), ("latitude", 3)]),
        )
        .unwrap_err();
        assert!(matches!(err, NetCdfError::InvalidFormat(_)));
    }

    #[test]
    fn test_resolve_rejects_unknown_dimension() {
        assert!(VariableLayout::resolve("t", &dims(&[("ensemble", 10)])).is_err());
    }

    #[test]
    fn test_find_level_hpa_and_pa() {
        assert_eq!(find_level(&[500.0, 700.0, 850.0], 700.0), Some(1));
        assert_eq!(find_level(&[50000.0, 70000.0], 500.0), Some(0));
        assert_eq!(find_level(&[850.0], 700.0), None);
    }

    #[test]
    fn test_select_level_single_must_match_request() {
        assert_eq!(select_level("t", &[700.0], Some(700.0)).unwrap(), 0);
        assert_eq!(select_level("z", &[50000.0], Some(500.0)).unwrap(), 0);

        let err = select_level("t", &[850.0], Some(700.0)).unwrap_err();
        assert!(matches!(err, NetCdfError::MissingData(ref m) if m.contains("700")));
        let err = select_level("z", &[700.0], Some(500.0)).unwrap_err();
        assert!(matches!(err, NetCdfError::MissingData(_)));
    }

    #[test]
    fn test_select_level_without_request() {
        assert_eq!(select_level("t", &[850.0], None).unwrap(), 0);
        assert!(select_level("t", &[500.0, 700.0], None).is_err());
        assert!(select_level("t", &[], Some(700.0)).is_err());
    }

    #[test]
    fn test_select_level_on_profile() {
        assert_eq!(select_level("t", &[500.0, 700.0, 850.0], Some(700.0)).unwrap(), 1);
        assert!(select_level("t", &[500.0, 850.0], Some(700.0)).is_err());
    }

    #[test]
    fn test_extract_level() {
        let layout = VariableLayout::resolve(
            "t",
            &dims(&[("time", 2), ("level", 2), ("latitude", 1), ("longitude", 2)]),
        )
        .unwrap();
        // t0l0, t0l1, t1l0, t1l1 planes of two values each
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert_eq!(extract_level(&values, &layout, 1), vec![3.0, 4.0, 7.0, 8.0]);
        assert_eq!(extract_level(&values, &layout, 0), vec![1.0, 2.0, 5.0, 6.0]);
    }
}
