//! Native NetCDF reading using the netcdf library.
//!
//! The netcdf crate wraps libnetcdf/HDF5. Values are read as `f64` through
//! libnetcdf's type conversion, then CF packing attributes are applied by
//! hand because libnetcdf does not apply them.

use std::path::Path;
use std::sync::Once;

use opg_common::CfTimeAxis;
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::field::{Packing, RawField};
use crate::layout::{extract_level, select_level, AxisRole, VariableLayout};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// This function disables that output by calling H5Eset_auto2 with null handlers.
/// It only needs to be called once per process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Which variable to read, and from which pressure level.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRequest {
    /// Names to try in order; the first one present in the file wins.
    pub names: Vec<String>,
    /// Pressure level in hPa. Ignored for variables without a level axis.
    pub level_hpa: Option<f64>,
}

impl VariableRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            level_hpa: None,
        }
    }

    pub fn with_alias(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn at_level(mut self, hpa: f64) -> Self {
        self.level_hpa = Some(hpa);
        self
    }
}

/// Short description of a data variable, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub dimensions: Vec<(String, usize)>,
    pub units: Option<String>,
}

/// List the variables of a file with their dimensions.
pub fn list_variables<P: AsRef<Path>>(path: P) -> NetCdfResult<Vec<VariableInfo>> {
    let file = open(path.as_ref())?;
    Ok(file
        .variables()
        .map(|var| VariableInfo {
            name: var.name(),
            dimensions: dimensions_of(&var),
            units: get_string_attr(&var, "units"),
        })
        .collect())
}

/// Read one variable into a [`RawField`].
///
/// A level axis is reduced to `request.level_hpa`, which must be on it; a
/// length-1 axis without a request is squeezed. A variable without a level
/// axis but with a scalar level coordinate must carry the requested level.
pub fn read_variable<P: AsRef<Path>>(path: P, request: &VariableRequest) -> NetCdfResult<RawField> {
    let path = path.as_ref();
    let file = open(path)?;

    let var = request
        .names
        .iter()
        .find_map(|name| file.variable(name))
        .ok_or_else(|| {
            let found: Vec<String> = file.variables().map(|v| v.name()).collect();
            NetCdfError::MissingData(format!(
                "{}: none of [{}] present (variables: {})",
                path.display(),
                request.names.join(", "),
                found.join(", ")
            ))
        })?;
    let name = var.name();

    let layout = VariableLayout::resolve(&name, &dimensions_of(&var))?;
    debug!(
        variable = %name,
        path = %path.display(),
        times = layout.time.len,
        levels = layout.level_count(),
        lats = layout.latitude.len,
        lons = layout.longitude.len,
        "Reading NetCDF variable"
    );

    let times = read_time_axis(&file, &layout.time.name)?;
    let latitudes = read_coordinate(&file, &layout.latitude.name)?;
    let longitudes = read_coordinate(&file, &layout.longitude.name)?;

    let mut values: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;
    if values.len() != layout.total_len() {
        return Err(NetCdfError::InvalidFormat(format!(
            "{}: read {} values, layout needs {}",
            name,
            values.len(),
            layout.total_len()
        )));
    }

    let packing = Packing {
        scale_factor: get_f64_attr(&var, "scale_factor").unwrap_or(1.0),
        add_offset: get_f64_attr(&var, "add_offset").unwrap_or(0.0),
        fill_value: get_f64_attr(&var, "_FillValue"),
        missing_value: get_f64_attr(&var, "missing_value"),
    };
    packing.unpack(&mut values);

    let (values, level) = match &layout.level {
        None => (values, scalar_level(&file, &name, request.level_hpa)?),
        Some(axis) => {
            let levels = read_coordinate(&file, &axis.name)?;
            let index = select_level(&name, &levels, request.level_hpa)?;
            let level = levels.get(index).copied().map(to_hpa);
            (extract_level(&values, &layout, index), level)
        }
    };

    let field = RawField {
        name,
        units: get_string_attr(&var, "units"),
        times,
        latitudes,
        longitudes,
        level,
        values,
    };
    field.validate()?;
    Ok(field)
}

fn open(path: &Path) -> NetCdfResult<netcdf::File> {
    silence_hdf5_errors();

    // Surface a missing file as io::ErrorKind::NotFound rather than a
    // generic libnetcdf failure.
    std::fs::metadata(path)?;

    netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })
}

fn dimensions_of(var: &netcdf::Variable) -> Vec<(String, usize)> {
    var.dimensions()
        .iter()
        .map(|d| (d.name(), d.len()))
        .collect()
}

fn read_coordinate(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} coordinate variable", name)))?;
    let mut values: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;
    let packing = Packing {
        scale_factor: get_f64_attr(&var, "scale_factor").unwrap_or(1.0),
        add_offset: get_f64_attr(&var, "add_offset").unwrap_or(0.0),
        ..Packing::default()
    };
    packing.unpack(&mut values);
    Ok(values)
}

fn read_time_axis(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<chrono::NaiveDateTime>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} coordinate variable", name)))?;
    let units = get_string_attr(&var, "units")
        .ok_or_else(|| NetCdfError::MissingData(format!("units attribute of {}", name)))?;
    let axis = CfTimeAxis::parse(&units)?;
    let offsets: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;
    offsets
        .into_iter()
        .map(|o| {
            axis.decode(o)
                .map_err(|e| NetCdfError::InvalidFormat(format!("{} axis: {}", name, e)))
        })
        .collect()
}

/// The level of a variable stored without a level dimension.
///
/// Single-level extracts often keep the level as a scalar coordinate
/// variable. When one is present it has to match the request; otherwise the
/// requested level is reported as read.
fn scalar_level(file: &netcdf::File, name: &str, requested: Option<f64>) -> NetCdfResult<Option<f64>> {
    let scalar = file.variables().find(|v| {
        v.dimensions().is_empty() && AxisRole::from_dim_name(&v.name()) == Some(AxisRole::Level)
    });
    let Some(var) = scalar else {
        return Ok(requested);
    };
    let stored: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", var.name(), e)))?;
    if stored.is_empty() {
        return Ok(requested);
    }
    let index = select_level(name, &stored, requested)?;
    Ok(stored.get(index).copied().map(to_hpa))
}

/// Level coordinates stored in Pa are reported in hPa.
fn to_hpa(level: f64) -> f64 {
    if level > 2000.0 {
        level / 100.0
    } else {
        level
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

// Helper to get f64 attribute using TryInto
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        netcdf::AttributeValue::Strs(mut v) if !v.is_empty() => Some(v.remove(0)),
        _ => None,
    }
}
