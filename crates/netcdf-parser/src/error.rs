//! Error types for NetCDF parsing operations.

use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension, level or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Time axis units that cannot be decoded
    #[error("Invalid time axis: {0}")]
    InvalidTime(#[from] opg_common::TimeParseError),
}

impl NetCdfError {
    /// Whether the error means the file itself does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NetCdfError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
