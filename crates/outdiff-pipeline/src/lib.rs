//! Pipeline orchestration for outdiff.
//!
//! Exports a set of fixtures with the current version of a plugin and with the
//! version found at a version-control reference, then reports which output
//! files were removed, added or changed.
//!
//! # Key Types
//!
//! - [`Pipeline`] / [`PipelineRequest`] -- One regression run, start to finish
//! - [`PipelineConfig`] / [`CleanupPolicy`] -- Paths, diff context, and workspace cleanup
//! - [`PipelineState`] -- The run's state machine
//! - [`PipelineObserver`] / [`ConsoleObserver`] -- Progressive console reporting
//! - [`PipelineError`] / [`ErrorKind`] -- Failure classification

pub mod config;
pub mod console;
pub mod error;
pub mod pipeline;
pub mod state;

pub use config::{CleanupPolicy, PipelineConfig};
pub use console::ConsoleObserver;
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PipelineObserver, PipelineRequest};
pub use state::PipelineState;

pub use outdiff_types::DiffReport;
