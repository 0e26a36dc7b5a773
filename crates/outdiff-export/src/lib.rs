//! Export execution for outdiff.
//!
//! An export plugin turns a set of records into a named set of output files.
//! Plugins are never linked into the binary: each snapshot carries its own
//! plugin definitions under `plugins/<key>/plugin.toml`, and the
//! [`PluginRegistry`] instantiates them per snapshot, so the current and the
//! historical run never share an instance.
//!
//! # Key Types
//!
//! - [`ExportPlugin`] / [`PendingExport`] -- The plugin capability interface
//! - [`PluginRegistry`] -- Plugin kinds and per-snapshot loading
//! - [`CommandPlugin`] -- Out-of-process plugin speaking JSON over stdio
//! - [`TemplatePlugin`] -- Declarative plugin rendering text templates
//! - [`RecordResolver`] / [`FixtureResolver`] -- Record resolution per snapshot
//! - [`ExportRunner`] -- Load, invoke, and persist one export

pub mod command;
pub mod error;
pub mod plugin;
pub mod record;
pub mod registry;
pub mod runner;
pub mod template;

pub use command::CommandPlugin;
pub use error::{ExportError, ExportResult};
pub use plugin::{ExportPlugin, PendingExport};
pub use record::{FixtureResolver, RecordResolver};
pub use registry::{PluginRegistry, PluginSource, MANIFEST_FILE};
pub use runner::ExportRunner;
pub use template::TemplatePlugin;
