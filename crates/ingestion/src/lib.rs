//! Facet table and ERA5 field loading.
//!
//! Provides the two loading stages of the OPG pipeline:
//!
//! - facet layers (elevation, facet ids, coordinates, orientation) and the
//!   observed OPG table, read from CSV
//! - the six ERA5 fields, read from NetCDF, converted to display units and
//!   restricted to a date interval
//!
//! plus the pure helpers the renderers rely on: the orientation mask,
//! facet centroids and cross-layer shape validation.

pub mod atmos;
pub mod centroid;
pub mod error;
pub mod facets;
pub mod orientation;
pub mod units;
pub mod validate;

// Re-exports
pub use atmos::{load_atmosphere, load_field, AtmosField, AtmosFiles, Atmosphere};
pub use centroid::{facet_centroid, median};
pub use error::{LoadError, Result};
pub use facets::{load_facet_layers, load_matrix, load_opg_series, FacetFiles, FacetLayers, OpgSeries};
pub use orientation::{mask_flat, Octant, FLAT_CODE};
pub use units::{AtmosVariable, DailyReduction, UnitConversion};
