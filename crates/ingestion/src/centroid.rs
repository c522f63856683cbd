//! Facet centroids for map labels.

use opg_common::{FacetId, Grid, OpgError, OpgResult};

/// Median of the finite values, averaging the two middle values for an
/// even count. `None` when nothing finite remains.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(|a, b| a.total_cmp(b));
    let mid = finite.len() / 2;
    Some(if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    })
}

/// Label position of a facet: (median longitude, median latitude) over its cells.
///
/// A facet without cells, or whose cells all lack coordinates, is
/// [`OpgError::FacetNotFound`].
pub fn facet_centroid(
    facets: &Grid<Option<FacetId>>,
    longitude: &Grid<f64>,
    latitude: &Grid<f64>,
    facet: FacetId,
) -> OpgResult<(f64, f64)> {
    facets.ensure_same_shape("facets", longitude, "longitude")?;
    facets.ensure_same_shape("facets", latitude, "latitude")?;

    let (lons, lats): (Vec<f64>, Vec<f64>) = facets
        .iter()
        .zip(longitude.iter().zip(latitude.iter()))
        .filter(|(id, _)| **id == Some(facet))
        .map(|(_, (lon, lat))| (*lon, *lat))
        .unzip();

    match (median(&lons), median(&lats)) {
        (Some(lon), Some(lat)) => Ok((lon, lat)),
        _ => Err(OpgError::FacetNotFound(facet)),
    }
}
