//! Error types for the polling watcher.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from watcher operations.
///
/// `InvalidFile`, `InitialRead` and `InvalidDuration` are construction-time
/// failures.
/// `Open` and `Read` are transient scan failures delivered on the error
/// channel; they never stop the scan loop.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Invalid file {path}: {source}")]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The strategy failed on the first read while building a descriptor.
    #[error("Failed initial read of {path}: {source}")]
    InitialRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid duration: poll interval must be non-zero")]
    InvalidDuration,

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `start()` on a watcher that is running or already stopped.
    #[error("Watcher already started")]
    AlreadyStarted,

    #[error("Failed to spawn scan thread: {source}")]
    SpawnFailed {
        #[source]
        source: io::Error,
    },

    #[error("Watcher is not running")]
    NotRunning,
}

impl WatchError {
    /// Path of the file this error concerns, for per-file errors.
    pub fn path(&self) -> Option<&Path> {
        match self {
            WatchError::InvalidFile { path, .. }
            | WatchError::InitialRead { path, .. }
            | WatchError::Open { path, .. }
            | WatchError::Read { path, .. } => Some(path),
            _ => None,
        }
    }

    /// True for failures that happen during a scan and are retried next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, WatchError::Open { .. } | WatchError::Read { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_file_errors() {
        let err = WatchError::Read {
            path: PathBuf::from("a.txt"),
            source: io::Error::other("boom"),
        };
        assert_eq!(err.path(), Some(Path::new("a.txt")));
        assert!(err.is_transient());
        assert!(err.to_string().contains("a.txt"));

        assert_eq!(WatchError::InvalidDuration.path(), None);
        assert!(!WatchError::InvalidDuration.is_transient());
    }
}
