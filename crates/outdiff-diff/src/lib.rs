//! Diff engine for outdiff.
//!
//! Compares two exported output trees, computes unified text diffs for files
//! whose content differs, and aggregates everything into a [`DiffReport`].
//!
//! # Key Types
//!
//! - [`compare_trees`] -- Recursive tree comparison producing classified [`TreeEntry`] values
//! - [`BlobDiff`] / [`DiffHunk`] / [`DiffLine`] -- Line-level diff with unified rendering
//! - [`DiffReporter`] / [`ReportObserver`] -- Report building with progressive notifications
//!
//! [`DiffReport`]: outdiff_types::DiffReport
//! [`TreeEntry`]: outdiff_types::TreeEntry

pub mod blob_diff;
pub mod error;
pub mod report;
pub mod tree_diff;

pub use blob_diff::{diff_blobs, BlobDiff, DiffHunk, DiffLine, DEFAULT_CONTEXT};
pub use error::{DiffError, DiffResult};
pub use report::{DiffReporter, NullObserver, ReportObserver};
pub use tree_diff::compare_trees;
