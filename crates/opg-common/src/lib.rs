//! Common types shared across the facet OPG workspace.
//!
//! Everything here is plain data: the row-major [`Grid`] that backs every
//! spatial layer, facet identifiers, geographic extents and the calendar
//! helpers used by the date-range filter.

pub mod error;
pub mod extent;
pub mod facet;
pub mod grid;
pub mod time;

pub use error::{OpgError, OpgResult};
pub use extent::GeoExtent;
pub use facet::FacetId;
pub use grid::{Grid, Shape};
pub use time::{CfTimeAxis, DateRange, TimeParseError};
