use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outdiff_diff::DEFAULT_CONTEXT;

use crate::error::{PipelineError, PipelineResult};

/// Name of the workspace directory under the repository root.
pub const DEFAULT_WORKSPACE_DIR: &str = "tmp";

/// Configuration for a [`Pipeline`](crate::Pipeline).
///
/// Every field has a default, so a TOML file only needs to name what it
/// changes:
///
/// ```toml
/// repo_root = "."
/// context_lines = 5
///
/// [cleanup]
/// on_failure = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Root of the live tree and of the git repository.
    pub repo_root: PathBuf,
    /// Disposable workspace; `<repo_root>/tmp` when unset.
    pub workspace_root: Option<PathBuf>,
    /// Fixture directory, relative to a snapshot root.
    pub fixtures_dir: PathBuf,
    /// Plugin directory, relative to a snapshot root.
    pub plugins_dir: PathBuf,
    /// Unchanged lines kept around each change in a diff.
    pub context_lines: usize,
    pub cleanup: CleanupPolicy,
    /// Export timestamp handed to both plugins; the run's start time when unset.
    pub date: Option<DateTime<Utc>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            workspace_root: None,
            fixtures_dir: PathBuf::from("fixtures"),
            plugins_dir: PathBuf::from("plugins"),
            context_lines: DEFAULT_CONTEXT,
            cleanup: CleanupPolicy::default(),
            date: None,
        }
    }
}

/// When the workspace is removed after a run.
///
/// By default it is kept in both cases so the outputs can be inspected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanupPolicy {
    pub on_success: bool,
    pub on_failure: bool,
}

impl PipelineConfig {
    /// A default configuration rooted at `repo_root`.
    pub fn for_repo(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(raw: &str) -> PipelineResult<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| PipelineError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> PipelineResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// The effective workspace root.
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(|| self.repo_root.join(DEFAULT_WORKSPACE_DIR))
    }

    /// Check that the snapshot-relative directories stay inside a snapshot.
    pub fn validate(&self) -> PipelineResult<()> {
        for (name, dir) in [("fixtures_dir", &self.fixtures_dir), ("plugins_dir", &self.plugins_dir)] {
            if outdiff_types::normalize_relative(dir).is_err() {
                return Err(PipelineError::Config(format!(
                    "{name} must be a relative path inside the repository, got {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
