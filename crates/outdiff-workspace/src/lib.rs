//! Disposable workspace for outdiff runs.
//!
//! A [`Workspace`] owns one temporary directory that is wiped and recreated at
//! the start of every run. Both operations refuse to touch a directory that
//! contains the caller's working directory.

pub mod error;
pub mod workspace;

pub use error::{WorkspaceError, WorkspaceResult};
pub use workspace::Workspace;
