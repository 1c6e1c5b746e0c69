use std::io;

use thiserror::Error;

/// Errors that can occur while building the runfiles index or resolving a
/// runfile through it.
#[derive(Error, Debug)]
pub enum RunfilesError {
    #[error("runfiles unavailable: {message}")]
    Unavailable { message: String },

    #[error("cannot find runfile: {path}")]
    NotFound { path: String },

    #[error("invalid runfile path: {message} (path: {path:?})")]
    InvalidPath { message: String, path: String },

    #[error("manifest error: {message} (path: {path}, line: {line})")]
    Manifest {
        message: String,
        path: String,
        line: usize,
    },

    #[error("repo mapping error: {message} (path: {path}, line: {line})")]
    RepoMapping {
        message: String,
        path: String,
        line: usize,
    },
}

impl RunfilesError {
    /// Returns `true` if the index was built but had no entry for the path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RunfilesError::NotFound { .. })
    }

    /// Returns `true` if the index itself could not be constructed.
    pub fn is_unavailable(&self) -> bool {
        !matches!(
            self,
            RunfilesError::NotFound { .. } | RunfilesError::InvalidPath { .. }
        )
    }
}

impl From<RunfilesError> for io::Error {
    fn from(err: RunfilesError) -> Self {
        let kind = match &err {
            RunfilesError::NotFound { .. } => io::ErrorKind::NotFound,
            RunfilesError::InvalidPath { .. } => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// Convenience alias for results using `RunfilesError`.
pub type Result<T> = std::result::Result<T, RunfilesError>;
