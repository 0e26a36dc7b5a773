use std::io;
use std::path::PathBuf;

/// Errors that can occur while retrieving a historical snapshot.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The repository could not be opened.
    #[error("cannot open repository at {path:?}: {source}")]
    OpenRepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// The reference does not name a tree.
    #[error("invalid reference '{reference}': {source}")]
    InvalidReference {
        reference: String,
        #[source]
        source: git2::Error,
    },

    /// The archive of the tree could not be produced.
    #[error("cannot archive '{reference}': {message}")]
    Archive { reference: String, message: String },

    /// An archive entry would land outside the destination.
    #[error("archive of '{reference}' contains unsafe entry {path:?}")]
    UnsafeEntry { reference: String, path: String },

    /// Writing an extracted entry failed.
    #[error("cannot write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Convenience alias for retrieval results.
pub type RetrievalResult<T> = Result<T, RetrievalError>;
