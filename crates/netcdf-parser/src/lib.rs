//! NetCDF parser for ERA5 reanalysis extracts.
//!
//! Reads one gridded variable per call into a [`RawField`] on a
//! `(time, latitude, longitude)` layout, decoding the CF time axis and any
//! packing attributes along the way. Pressure-level variables are reduced to
//! a single level.
//!
//! # Example
//!
//! ```ignore
//! use netcdf_parser::{read_variable, VariableRequest};
//!
//! let t700 = read_variable("era5_t700.nc", &VariableRequest::new("t").at_level(700.0))?;
//! println!("{} steps of {} x {}", t700.times.len(), t700.latitudes.len(), t700.longitudes.len());
//! ```

pub mod error;
pub mod field;
pub mod layout;
mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use field::{Packing, RawField};
pub use layout::{AxisRole, VariableLayout};
pub use native::{list_variables, read_variable, silence_hdf5_errors, VariableInfo, VariableRequest};
