//! Error types for the diff crate.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while comparing output trees.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// One of the roots to compare does not exist or is not a directory.
    #[error("comparison root {0:?} is not a directory")]
    MissingRoot(PathBuf),

    /// A file or directory could not be read during comparison.
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A path below a root is not valid UTF-8 and cannot be reported.
    #[error("path {0:?} is not valid UTF-8")]
    NonUtf8Path(PathBuf),
}

impl DiffError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
