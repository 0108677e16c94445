use std::path::PathBuf;

use biosis_core::ReconcileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// The surface cannot be compiled on this machine. Not fatal to the
    /// other surfaces.
    #[error("{message}\n  hint: {hint}")]
    Environment { message: String, hint: String },

    #[error("deck folder '{folder}' used by {function} does not exist")]
    MissingFolder { folder: String, function: String },

    #[error("malformed manifest {path}: {message}")]
    MalformedManifest { path: PathBuf, message: String },

    #[error("icon {path} not found")]
    MissingIcon { path: PathBuf },

    #[error("failed to install task {task}: {message}")]
    TaskInstall { task: String, message: String },

    #[error("{message}\n  hint: compile from a terminal with administrator privileges")]
    AccessDenied { message: String },

    #[error("command '{program}' failed: {message}")]
    Command { program: String, message: String },

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

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl CompileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CompileError::Json {
            path: path.into(),
            source,
        }
    }

    pub fn environment(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CompileError::Environment {
            message: message.into(),
            hint: hint.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Fail with an environment error unless running on Windows.
pub fn require_windows(what: &str) -> Result<()> {
    if cfg!(windows) {
        Ok(())
    } else {
        Err(CompileError::environment(
            format!("{what} requires Windows"),
            "compile this surface on a Windows machine",
        ))
    }
}
