//! Crate-wide error type.
//!
//! Every failure in the pipeline is fatal and surfaces synchronously to the
//! caller; nothing here is retried. Variants are grouped by what went wrong:
//!
//! - schema: a required column or field is absent
//! - resource: an input file is missing or unreadable
//! - configuration: a mandatory option is missing or inconsistent
//! - parse: a value could not be interpreted
//! - collaborator: the extinction evaluator or the sampler failed
//!
//! `exit_code()` maps each variant to the binary's exit status:
//! 2 (input/config), 3 (resource) or 4 (computation).

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GrbError>;

/// Boxed error returned by external collaborators (samplers, result objects).
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum GrbError {
    /// Required columns or fields are absent. The message always lists the full set.
    #[error("{source_name} is missing required columns; required columns are: [{}]", .required.join(", "))]
    MissingColumns {
        source_name: String,
        required: Vec<String>,
    },

    #[error("input file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "fits")]
    #[error("FITS error in '{}': {source}", .path.display())]
    Fits {
        path: PathBuf,
        #[source]
        source: fitsio::errors::Error,
    },

    #[error("{source_name}:{line}: {message}")]
    InvalidRow {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("invalid time '{input}': {reason}")]
    InvalidTime { input: String, reason: String },

    #[error("count-rate input requires a flux conversion factor")]
    MissingConversionFactor,

    #[error("header of '{}' is missing the '{key}' keyword", .path.display())]
    MissingReferenceEpoch { key: &'static str, path: PathBuf },

    #[error("no spectral index supplied: provide 'photon_index' or the deprecated 'beta_X'")]
    MissingSpectralIndex,

    #[error("`{list}` must have length {expected}, got {actual}")]
    ParameterLength {
        list: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("missing model parameter `{name}`")]
    MissingParameter { name: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("extinction evaluation failed: {0}")]
    Extinction(String),

    #[error(transparent)]
    Sampler(BoxedError),
}

impl GrbError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            GrbError::FileNotFound { path }
        } else {
            GrbError::Io { path, source }
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        let path = path.into();
        match source.kind() {
            csv::ErrorKind::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                GrbError::FileNotFound { path }
            }
            _ => GrbError::Csv { path, source },
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            GrbError::FileNotFound { .. } | GrbError::Io { .. } => 3,
            GrbError::Extinction(_) | GrbError::Sampler(_) => 4,
            #[cfg(feature = "fits")]
            GrbError::Fits { .. } => 3,
            _ => 2,
        }
    }
}
