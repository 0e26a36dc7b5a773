//! Historical snapshot retrieval for outdiff.
//!
//! A snapshot is a complete, independent copy of the repository tree as it
//! existed at some version-control reference. Retrieval happens in two steps:
//! a [`SnapshotArchiver`] produces a transient [`SnapshotArchive`], and the
//! [`SnapshotRetriever`] unpacks every entry under a destination directory.
//!
//! # Key Types
//!
//! - [`SnapshotArchiver`] / [`GitArchiver`] -- Archive production at a reference
//! - [`SnapshotArchive`] / [`ArchiveEntry`] -- Enumerable archive contents
//! - [`SnapshotRetriever`] -- Extraction into an isolated directory
//! - [`Snapshot`] / [`SnapshotOrigin`] -- A materialised (or live) tree

pub mod archive;
pub mod error;
pub mod git;
pub mod retriever;

pub use archive::{ArchiveEntry, SnapshotArchive, SnapshotArchiver};
pub use error::{RetrievalError, RetrievalResult};
pub use git::GitArchiver;
pub use retriever::{Snapshot, SnapshotOrigin, SnapshotRetriever};
