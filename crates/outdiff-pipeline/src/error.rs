use std::fmt;

use outdiff_diff::DiffError;
use outdiff_export::ExportError;
use outdiff_snapshot::RetrievalError;
use outdiff_types::TypeError;
use outdiff_workspace::WorkspaceError;

/// The failure categories a run can end in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unsafe workspace path, invalid configuration or fixture path.
    Configuration,
    /// The historical snapshot could not be produced.
    Retrieval,
    /// A plugin has no usable entry point.
    PluginLoad,
    /// Running an export or writing its output failed.
    Export,
    /// An output file could not be read during comparison.
    Comparison,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration error",
            Self::Retrieval => "retrieval error",
            Self::PluginLoad => "plugin load error",
            Self::Export => "export error",
            Self::Comparison => "comparison error",
        };
        f.write_str(name)
    }
}

/// Errors that end a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A fixture path does not name a record.
    #[error("configuration error: {0}")]
    Fixture(#[from] TypeError),

    /// Preparing or tearing down the workspace failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// The historical snapshot could not be retrieved.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Exporting with the current plugin failed.
    #[error("exporting with current plugin failed: {0}")]
    CurrentExport(#[source] ExportError),

    /// Exporting with the plugin at the reference failed.
    #[error("exporting with compare plugin at '{reference}' failed: {source}")]
    CompareExport {
        reference: String,
        #[source]
        source: ExportError,
    },

    /// Comparing the two output trees failed.
    #[error(transparent)]
    Comparison(#[from] DiffError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Fixture(_) | Self::Workspace(_) => ErrorKind::Configuration,
            Self::Retrieval(_) => ErrorKind::Retrieval,
            Self::CurrentExport(e) | Self::CompareExport { source: e, .. } => {
                if e.is_plugin_load() {
                    ErrorKind::PluginLoad
                } else {
                    ErrorKind::Export
                }
            }
            Self::Comparison(_) => ErrorKind::Comparison,
        }
    }
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn plugin_load_failures_are_classified() {
        let err = PipelineError::CompareExport {
            reference: "HEAD~1".into(),
            source: ExportError::plugin_load("demo", PathBuf::from("/x/plugins/demo"), "plugin directory not found"),
        };
        assert_eq!(err.kind(), ErrorKind::PluginLoad);
        let message = err.to_string();
        assert!(message.contains("HEAD~1"));
        assert!(message.contains("demo"));
    }

    #[test]
    fn export_failures_are_classified() {
        let err = PipelineError::CurrentExport(ExportError::invocation("demo", "boom"));
        assert_eq!(err.kind(), ErrorKind::Export);
        assert_eq!(err.kind().to_string(), "export error");
    }

    #[test]
    fn unsafe_workspace_is_a_configuration_error() {
        let err = PipelineError::from(WorkspaceError::UnsafePath {
            path: "/repo".into(),
            guard: "/repo/sub".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn missing_root_is_a_comparison_error() {
        let err = PipelineError::from(DiffError::MissingRoot("/nope".into()));
        assert_eq!(err.kind(), ErrorKind::Comparison);
    }
}
