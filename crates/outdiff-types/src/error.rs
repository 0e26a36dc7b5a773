use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid record path {0:?}: expected <group>/<item>.<ext>")]
    InvalidRecordPath(String),

    #[error("path {0:?} is not a plain relative path")]
    UnsafePath(String),

    #[error("path {0:?} is not valid UTF-8")]
    NonUtf8Path(String),
}
