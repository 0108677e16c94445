use std::path::PathBuf;

use biosis_core::RegistrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value '{key}' in {path}: {message}")]
    InvalidConfig {
        path: PathBuf,
        key: String,
        message: String,
    },

    #[error("invalid unit manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid unit '{unit}': {message}")]
    InvalidUnit { unit: String, message: String },

    #[error("{unit}: function '{function}': {source}")]
    Registration {
        unit: String,
        function: String,
        #[source]
        source: RegistrationError,
    },

    /// A unit cannot be loaded on this machine. Discovery skips these.
    #[error("unit '{unit}' not loaded: {reason}")]
    MissingRequirement { unit: String, reason: String },

    #[error("{message}\n  hint: {hint}")]
    Environment { message: String, hint: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether discovery should skip the unit and keep going.
    pub fn is_skippable(&self) -> bool {
        matches!(self, StoreError::MissingRequirement { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
