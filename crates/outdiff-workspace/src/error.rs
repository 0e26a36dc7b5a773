use std::io;
use std::path::PathBuf;

/// Errors that can occur while managing the workspace.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// The workspace path is the guarded directory or one of its ancestors.
    #[error("configuration error: workspace {path:?} contains the working directory {guard:?}")]
    UnsafePath { path: PathBuf, guard: PathBuf },

    /// The working directory could not be determined.
    #[error("cannot determine working directory: {0}")]
    CurrentDir(#[source] io::Error),

    /// A filesystem operation failed.
    #[error("workspace I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WorkspaceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for workspace results.
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
