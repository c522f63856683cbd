//! Consistency checks run before anything is rendered.

use opg_common::{Grid, OpgError, OpgResult, Shape};

use crate::atmos::{AtmosField, Atmosphere};
use crate::error::{LoadError, Result};
use crate::facets::FacetLayers;

/// Coordinate axes closer than this (degrees) are considered equal.
const AXIS_TOLERANCE: f64 = 1e-6;

/// All five facet layers must share one shape.
pub fn facet_layers(layers: &FacetLayers) -> OpgResult<()> {
    let reference = &layers.elevation;
    reference.ensure_same_shape("elevation", &layers.facets, "facets")?;
    reference.ensure_same_shape("elevation", &layers.latitude, "latitude")?;
    reference.ensure_same_shape("elevation", &layers.longitude, "longitude")?;
    reference.ensure_same_shape("elevation", &layers.orientation, "orientation")?;
    Ok(())
}

/// Check a grid against the facet mesh.
pub fn same_mesh<T>(layers: &FacetLayers, name: &str, grid: &Grid<T>) -> OpgResult<()> {
    layers.elevation.ensure_same_shape("elevation", grid, name)
}

/// All six atmospheric fields must share grid shape, axes and time axis.
pub fn atmosphere(atmosphere: &Atmosphere) -> Result<()> {
    let reference = &atmosphere.ivt;
    for field in atmosphere.fields().skip(1) {
        same_grid(reference, field)?;
    }
    Ok(())
}

fn same_grid(reference: &AtmosField, other: &AtmosField) -> Result<()> {
    let (a, b) = (reference.grid_shape(), other.grid_shape());
    if a != b {
        return Err(shape_mismatch(reference, a, other, b).into());
    }
    if !axes_match(reference.latitudes(), other.latitudes())
        || !axes_match(reference.longitudes(), other.longitudes())
    {
        return Err(LoadError::Inconsistent(format!(
            "{} and {} are on different latitude/longitude axes",
            reference.variable(),
            other.variable()
        )));
    }
    if reference.times() != other.times() {
        return Err(LoadError::Inconsistent(format!(
            "{} has {} time steps, {} has {} (or they differ)",
            reference.variable(),
            reference.len(),
            other.variable(),
            other.len()
        )));
    }
    Ok(())
}

fn shape_mismatch(left: &AtmosField, left_shape: Shape, right: &AtmosField, right_shape: Shape) -> OpgError {
    OpgError::ShapeMismatch {
        left: left.variable().key().to_string(),
        left_shape,
        right: right.variable().key().to_string(),
        right_shape,
    }
}

fn axes_match(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= AXIS_TOLERANCE)
}
