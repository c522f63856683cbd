//! Error types for rendering operations.

use opg_common::{FacetId, OpgError};
use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),

    #[error("SVG rendering failed: {0}")]
    Svg(String),

    #[error("Facet {0} cannot be plotted: no cells or no OPG column")]
    FacetNotFound(FacetId),

    #[error("Invalid render input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Opg(#[from] OpgError),
}
