//! Error type for figure composition.

use ingestion::LoadError;
use opg_common::OpgError;
use renderer::RenderError;
use thiserror::Error;

/// Failures while preparing or writing a figure.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<OpgError> for PlotError {
    fn from(err: OpgError) -> Self {
        match err {
            OpgError::FacetNotFound(facet) => PlotError::Render(RenderError::FacetNotFound(facet)),
            other => PlotError::Render(RenderError::Opg(other)),
        }
    }
}

impl PlotError {
    /// Whether the failure is a shape mismatch between layers used together.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self,
            PlotError::Render(RenderError::Opg(OpgError::ShapeMismatch { .. }))
                | PlotError::Load(LoadError::Opg(OpgError::ShapeMismatch { .. }))
        )
    }
}

pub type PlotResult<T> = std::result::Result<T, PlotError>;
