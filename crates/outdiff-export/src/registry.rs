use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command::CommandPlugin;
use crate::error::{ExportError, ExportResult};
use crate::plugin::ExportPlugin;
use crate::template::TemplatePlugin;

/// Name of the manifest every plugin directory must contain.
pub const MANIFEST_FILE: &str = "plugin.toml";

/// Everything a loader needs to instantiate one plugin.
#[derive(Clone, Debug)]
pub struct PluginSource {
    /// The plugin key (directory name).
    pub key: String,
    /// Absolute path of the plugin directory inside its snapshot.
    pub dir: PathBuf,
    /// The parsed manifest, including the `kind` field.
    pub manifest: toml::Table,
}

impl PluginSource {
    /// Deserialize the manifest into a kind-specific configuration.
    pub fn config<T: serde::de::DeserializeOwned>(&self) -> ExportResult<T> {
        toml::Value::Table(self.manifest.clone())
            .try_into()
            .map_err(|e| self.load_error(format!("invalid {MANIFEST_FILE}: {e}")))
    }

    pub fn load_error(&self, reason: impl Into<String>) -> ExportError {
        ExportError::plugin_load(&self.key, &self.dir, reason)
    }
}

type Loader = Box<dyn Fn(&PluginSource) -> ExportResult<Box<dyn ExportPlugin>> + Send + Sync>;

/// Resolves plugin keys to fresh plugin instances rooted in a snapshot.
///
/// The registry maps a plugin *kind* (the `kind` field of `plugin.toml`) to a
/// loader. Every [`PluginRegistry::load`] call reads the manifest from the
/// given snapshot and builds a new instance, so two snapshots never share a
/// plugin.
pub struct PluginRegistry {
    plugins_dir: PathBuf,
    loaders: BTreeMap<String, Loader>,
}

impl PluginRegistry {
    /// An empty registry looking for plugins under `plugins_dir` (relative to
    /// each snapshot root).
    pub fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins_dir: plugins_dir.into(),
            loaders: BTreeMap::new(),
        }
    }

    /// A registry with the built-in `command` and `template` kinds.
    pub fn with_builtin_kinds(plugins_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new(plugins_dir);
        registry.register("command", |source| {
            Ok(Box::new(CommandPlugin::load(source)?) as Box<dyn ExportPlugin>)
        });
        registry.register("template", |source| {
            Ok(Box::new(TemplatePlugin::load(source)?) as Box<dyn ExportPlugin>)
        });
        registry
    }

    /// Register (or replace) the loader for a plugin kind.
    pub fn register<F>(&mut self, kind: impl Into<String>, loader: F)
    where
        F: Fn(&PluginSource) -> ExportResult<Box<dyn ExportPlugin>> + Send + Sync + 'static,
    {
        self.loaders.insert(kind.into(), Box::new(loader));
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    /// Directory of plugin `key` inside the snapshot rooted at `root`.
    pub fn plugin_dir(&self, root: &Path, key: &str) -> PathBuf {
        root.join(&self.plugins_dir).join(key)
    }

    /// Load plugin `key` from the snapshot rooted at `root`.
    pub fn load(&self, key: &str, root: &Path) -> ExportResult<Box<dyn ExportPlugin>> {
        let dir = self.plugin_dir(root, key);
        let dir = std::path::absolute(&dir).unwrap_or(dir);

        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(ExportError::plugin_load(key, &dir, "invalid plugin key"));
        }
        if !dir.is_dir() {
            return Err(ExportError::plugin_load(key, &dir, "plugin directory not found"));
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        let raw = fs::read_to_string(&manifest_path).map_err(|e| {
            ExportError::plugin_load(key, &dir, format!("cannot read {MANIFEST_FILE}: {e}"))
        })?;
        let manifest: toml::Table = raw.parse().map_err(|e| {
            ExportError::plugin_load(key, &dir, format!("malformed {MANIFEST_FILE}: {e}"))
        })?;

        let kind = manifest
            .get("kind")
            .and_then(toml::Value::as_str)
            .ok_or_else(|| ExportError::plugin_load(key, &dir, "manifest has no `kind`"))?
            .to_string();
        let loader = self.loaders.get(&kind).ok_or_else(|| {
            let known = self.kinds().collect::<Vec<_>>().join(", ");
            ExportError::plugin_load(key, &dir, format!("unknown plugin kind '{kind}' (known: {known})"))
        })?;

        debug!(key, kind = %kind, dir = %dir.display(), "loading plugin");
        loader(&PluginSource {
            key: key.to_string(),
            dir,
            manifest,
        })
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins_dir", &self.plugins_dir)
            .field("kinds", &self.loaders.keys().collect::<Vec<_>>())
            .finish()
    }
}
