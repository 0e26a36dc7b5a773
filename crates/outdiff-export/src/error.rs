use std::io;
use std::path::PathBuf;

/// Errors that can occur while loading or running an export plugin.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The plugin directory holds no usable entry point.
    #[error("cannot load plugin '{key}' from {dir:?}: {reason}")]
    PluginLoad {
        key: String,
        dir: PathBuf,
        reason: String,
    },

    /// A record reference could not be resolved.
    #[error("cannot resolve record {record} from {path:?}: {reason}")]
    Resolve {
        record: String,
        path: PathBuf,
        reason: String,
    },

    /// The plugin could not be invoked or did not complete.
    #[error("plugin '{key}' failed: {message}")]
    Invocation { key: String, message: String },

    /// An out-of-process plugin exited unsuccessfully.
    #[error("plugin '{key}' exited with {status}: {stderr}")]
    Process {
        key: String,
        status: String,
        stderr: String,
    },

    /// The plugin returned output that could not be decoded.
    #[error("plugin '{key}' returned malformed output: {message}")]
    MalformedOutput { key: String, message: String },

    /// A template could not be rendered.
    #[error("plugin '{key}' template error: {message}")]
    Template { key: String, message: String },

    /// An output file name is absolute or escapes the output directory.
    #[error("plugin '{key}' emitted unsafe output path {name:?}")]
    UnsafeOutputPath { key: String, name: String },

    /// Two output files share the same path.
    #[error("plugin '{key}' emitted {name:?} more than once")]
    DuplicateOutput { key: String, name: String },

    /// Persisting an output file failed.
    #[error("cannot write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub fn plugin_load(key: impl Into<String>, dir: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PluginLoad {
            key: key.into(),
            dir: dir.into(),
            reason: reason.into(),
        }
    }

    pub fn invocation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for failures to load the entry point, as opposed to
    /// failures while running it.
    pub fn is_plugin_load(&self) -> bool {
        matches!(self, Self::PluginLoad { .. })
    }
}

/// Convenience alias for export results.
pub type ExportResult<T> = Result<T, ExportError>;
