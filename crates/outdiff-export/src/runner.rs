use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use outdiff_snapshot::Snapshot;
use outdiff_types::{join_relative, normalize_relative, ExportRequest, OutputFile};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{ExportError, ExportResult};
use crate::record::{FixtureResolver, RecordResolver};
use crate::registry::PluginRegistry;

type ResolverFactory = Box<dyn Fn(&Path) -> Box<dyn RecordResolver> + Send + Sync>;

/// Runs one plugin from one snapshot and persists what it emits.
pub struct ExportRunner {
    registry: PluginRegistry,
    resolvers: ResolverFactory,
}

impl ExportRunner {
    /// A runner resolving records from `<snapshot>/<fixtures_dir>`.
    pub fn new(registry: PluginRegistry, fixtures_dir: impl Into<PathBuf>) -> Self {
        let fixtures_dir = fixtures_dir.into();
        Self {
            registry,
            resolvers: Box::new(move |root: &Path| -> Box<dyn RecordResolver> {
                Box::new(FixtureResolver::new(root.join(&fixtures_dir)))
            }),
        }
    }

    /// Replace how record resolvers are built for a snapshot root.
    pub fn with_resolvers<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Path) -> Box<dyn RecordResolver> + Send + Sync + 'static,
    {
        self.resolvers = Box::new(factory);
        self
    }

    /// Export `request` with plugin `plugin_key` from `snapshot` into
    /// `output_dir`.
    ///
    /// Returns the written paths relative to `output_dir`, in emission order.
    /// Files written before a failure are left in place.
    pub fn run(
        &self,
        snapshot: &Snapshot,
        plugin_key: &str,
        output_dir: &Path,
        request: &ExportRequest,
    ) -> ExportResult<Vec<String>> {
        let plugin = self.registry.load(plugin_key, snapshot.root())?;
        let records = (self.resolvers)(snapshot.root()).resolve_all(&request.records)?;
        let options = request.options_for(snapshot.root());

        info!(plugin = plugin_key, snapshot = %snapshot, records = records.len(), "exporting");
        let files = plugin.export(&records, &options)?.wait(plugin_key)?;

        let written = write_outputs(plugin_key, output_dir, &files)?;
        info!(plugin = plugin_key, files = written.len(), output = %output_dir.display(), "export written");
        Ok(written)
    }
}

/// Validate every output path, then write all files concurrently.
///
/// Paths are disjoint after validation, so the parallel writes never touch
/// the same file. Returns once every write has finished.
fn write_outputs(key: &str, output_dir: &Path, files: &[OutputFile]) -> ExportResult<Vec<String>> {
    fs::create_dir_all(output_dir).map_err(|source| ExportError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut seen = HashSet::with_capacity(files.len());
    let mut targets = Vec::with_capacity(files.len());
    for file in files {
        let unsafe_path = || ExportError::UnsafeOutputPath {
            key: key.to_string(),
            name: file.name.clone(),
        };
        let name = normalize_relative(Path::new(&file.name)).map_err(|_| unsafe_path())?;
        let target = join_relative(output_dir, &name).map_err(|_| unsafe_path())?;
        if !seen.insert(name.clone()) {
            return Err(ExportError::DuplicateOutput {
                key: key.to_string(),
                name,
            });
        }
        targets.push((name, target, file));
    }

    targets
        .par_iter()
        .map(|(name, target, file)| {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| ExportError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(target, &file.content).map_err(|source| ExportError::Write {
                path: target.clone(),
                source,
            })?;
            debug!(file = %name, bytes = file.content.len(), "wrote output");
            Ok(name.clone())
        })
        .collect()
}
