//! Error types for beam generation.
//!
//! Every failure is fatal to the generation call: configuration problems
//! are reported before any sampling happens, invalid model parameters when
//! the model is constructed, and unit mismatches wherever two quantities
//! meet.

use std::path::PathBuf;

use thiserror::Error;

use crate::units::UnitError;

/// Beam generation error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing, conflicting or malformed user configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The distribution type tag is unknown or not valid for the coordinate.
    #[error("distribution type '{kind}' is not supported for coordinate '{coordinate}'")]
    UnsupportedDistribution { kind: String, coordinate: String },

    /// Only cathode starts are implemented.
    #[error("beam start '{0}' is not supported")]
    UnsupportedStartType(String),

    /// Parameters violate the physical meaning of a distribution.
    #[error("invalid distribution parameters: {0}")]
    InvalidParameters(String),

    /// Unit parsing or dimensional mismatch.
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// Distribution table could not be read.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Distribution table was read but its contents are malformed.
    #[error("malformed distribution file '{path}': {reason}")]
    FileFormat { path: PathBuf, reason: String },

    /// JSON input could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
