//! Error types for the ingestion crate.

use std::path::PathBuf;

use netcdf_parser::NetCdfError;
use opg_common::OpgError;
use thiserror::Error;

/// Errors that can occur while loading facet tables and ERA5 fields.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}{}: {message}", path.display(), line.map(|l| format!(" line {}", l)).unwrap_or_default())]
    Parse {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },

    #[error("Failed to read NetCDF {}: {source}", path.display())]
    NetCdf {
        path: PathBuf,
        #[source]
        source: NetCdfError,
    },

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Inconsistent inputs: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Opg(#[from] OpgError),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: Option<u64>, message: impl Into<String>) -> Self {
        LoadError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Wrap a NetCDF failure, surfacing file-level I/O errors as [`LoadError::Io`].
    pub(crate) fn netcdf(path: impl Into<PathBuf>, source: NetCdfError) -> Self {
        match source {
            NetCdfError::IoError(io) => LoadError::io(path, io),
            other => LoadError::NetCdf {
                path: path.into(),
                source: other,
            },
        }
    }

    /// Whether the failure is a missing input file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;
