//! Foundation types for outdiff.
//!
//! This crate provides the data model shared by every stage of the export
//! regression pipeline. Every other outdiff crate depends on `outdiff-types`.
//!
//! # Key Types
//!
//! - [`RecordRef`] / [`Record`] -- Input records handed to export plugins
//! - [`ExportRequest`] / [`ExportOptions`] -- The immutable per-run export inputs
//! - [`OutputFile`] -- One file emitted by an export plugin
//! - [`TreeEntry`] / [`EntryState`] -- One classified path from a tree comparison
//! - [`DiffReport`] -- The pipeline's durable result

pub mod entry;
pub mod error;
pub mod export;
pub mod path;
pub mod record;
pub mod report;

pub use entry::{EntryKind, EntryState, TreeEntry};
pub use error::TypeError;
pub use export::{ExportOptions, ExportRequest, OutputFile};
pub use path::{join_relative, normalize_relative};
pub use record::{Record, RecordRef};
pub use report::DiffReport;
