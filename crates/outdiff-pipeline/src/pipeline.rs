use std::path::{Path, PathBuf};

use chrono::Utc;
use outdiff_diff::{compare_trees, DiffReporter, NullObserver, ReportObserver};
use outdiff_export::{ExportRunner, PluginRegistry};
use outdiff_snapshot::{GitArchiver, Snapshot, SnapshotArchiver, SnapshotRetriever};
use outdiff_types::{DiffReport, ExportRequest, RecordRef};
use outdiff_workspace::Workspace;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::state::PipelineState;

// ---------------------------------------------------------------------------
// PipelineRequest
// ---------------------------------------------------------------------------

/// What to compare in one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineRequest {
    /// Plugin key in the live tree.
    pub current_plugin: String,
    /// Plugin key in the tree at `reference`.
    pub compare_plugin: String,
    /// Version-control reference to compare against, e.g. `HEAD~1`.
    pub reference: String,
    /// Fixture paths of the form `.../<group>/<item>.<ext>`.
    pub fixtures: Vec<PathBuf>,
}

impl PipelineRequest {
    /// Compare `plugin` against its own version at `reference`.
    pub fn new(
        plugin: impl Into<String>,
        reference: impl Into<String>,
        fixtures: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        let plugin = plugin.into();
        Self {
            compare_plugin: plugin.clone(),
            current_plugin: plugin,
            reference: reference.into(),
            fixtures: fixtures.into_iter().map(Into::into).collect(),
        }
    }

    /// Use a different plugin key on the reference side.
    pub fn with_compare_plugin(mut self, key: impl Into<String>) -> Self {
        self.compare_plugin = key.into();
        self
    }

    /// The record references named by the fixture paths, in request order.
    pub fn record_refs(&self) -> PipelineResult<Vec<RecordRef>> {
        self.fixtures
            .iter()
            .map(|path| RecordRef::from_fixture_path(path).map_err(PipelineError::from))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// PipelineObserver
// ---------------------------------------------------------------------------

/// Receives progress from a pipeline run in addition to report notifications.
pub trait PipelineObserver: ReportObserver {
    /// The run is about to start.
    fn started(&mut self, _request: &PipelineRequest, _records: &[RecordRef]) {}

    /// The run moved from one state to another.
    fn transitioned(&mut self, _from: PipelineState, _to: PipelineState) {}
}

impl PipelineObserver for NullObserver {}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Exports fixtures with the current and a historical plugin and diffs the
/// two output trees.
///
/// Runs are sequential: the current export finishes before the snapshot is
/// extracted, and both exports finish before comparison starts. The workspace
/// is exclusive to one run at a time.
pub struct Pipeline {
    config: PipelineConfig,
    retriever: SnapshotRetriever,
    runner: ExportRunner,
    reporter: DiffReporter,
}

impl Pipeline {
    /// A pipeline reading history from the git repository at
    /// `config.repo_root` and loading the built-in plugin kinds.
    pub fn new(config: PipelineConfig) -> Self {
        let retriever = SnapshotRetriever::new(Box::new(GitArchiver::new(&config.repo_root)));
        let runner = ExportRunner::new(
            PluginRegistry::with_builtin_kinds(&config.plugins_dir),
            &config.fixtures_dir,
        );
        let reporter = DiffReporter::new(config.context_lines);
        Self {
            config,
            retriever,
            runner,
            reporter,
        }
    }

    /// Produce snapshots with a different archiver.
    pub fn with_archiver(mut self, archiver: impl SnapshotArchiver + 'static) -> Self {
        self.retriever = SnapshotRetriever::new(Box::new(archiver));
        self
    }

    /// Load plugins through a different registry.
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.runner = ExportRunner::new(registry, &self.config.fixtures_dir);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole comparison and return the report.
    ///
    /// On failure the error is returned unchanged; the workspace is removed
    /// first only if `cleanup.on_failure` is set, and a failed removal is
    /// logged rather than reported. On success the workspace is kept unless
    /// `cleanup.on_success` is set.
    pub fn run<O: PipelineObserver>(
        &self,
        request: &PipelineRequest,
        observer: &mut O,
    ) -> PipelineResult<DiffReport> {
        let mut state = PipelineState::Idle;
        let setup = self.workspace().and_then(|ws| Ok((ws, request.record_refs()?)));
        let (workspace, records) = match setup {
            Ok(setup) => setup,
            Err(err) => {
                advance(&mut state, PipelineState::Failed, observer);
                error!(error = %err, kind = %err.kind(), "pipeline failed before start");
                return Err(err);
            }
        };

        let export = ExportRequest::new(records, self.config.date.unwrap_or_else(Utc::now));
        observer.started(request, &export.records);
        info!(
            current = %request.current_plugin,
            compare = %request.compare_plugin,
            reference = %request.reference,
            records = export.records.len(),
            workspace = %workspace.root().display(),
            "starting pipeline"
        );

        match self.execute(&workspace, request, &export, &mut state, observer) {
            Ok(report) => {
                advance(&mut state, PipelineState::Done, observer);
                info!(
                    removed = report.removed_files.len(),
                    added = report.added_files.len(),
                    changed = report.changed_files.len(),
                    total = report.total(),
                    "pipeline finished"
                );
                if self.config.cleanup.on_success {
                    teardown(&workspace);
                }
                Ok(report)
            }
            Err(err) => {
                let failed_in = state;
                advance(&mut state, PipelineState::Failed, observer);
                error!(error = %err, kind = %err.kind(), after = %failed_in, "pipeline failed");
                if self.config.cleanup.on_failure {
                    teardown(&workspace);
                }
                Err(err)
            }
        }
    }

    fn execute<O: PipelineObserver>(
        &self,
        workspace: &Workspace,
        request: &PipelineRequest,
        export: &ExportRequest,
        state: &mut PipelineState,
        observer: &mut O,
    ) -> PipelineResult<DiffReport> {
        workspace.prepare()?;
        advance(state, PipelineState::WorkspacePrepared, observer);

        let live = Snapshot::live(absolute(&self.config.repo_root)?);
        let current_output = workspace.current_output();
        self.runner
            .run(&live, &request.current_plugin, &current_output, export)
            .map_err(PipelineError::CurrentExport)?;
        advance(state, PipelineState::CurrentExported, observer);

        let snapshot = self
            .retriever
            .retrieve(&request.reference, &workspace.compare_files())?;
        advance(state, PipelineState::SnapshotRetrieved, observer);

        let compare_output = workspace.compare_output();
        self.runner
            .run(&snapshot, &request.compare_plugin, &compare_output, export)
            .map_err(|source| PipelineError::CompareExport {
                reference: request.reference.clone(),
                source,
            })?;
        advance(state, PipelineState::CompareExported, observer);

        // The reference side is "removed from", the current side "added to".
        let entries = compare_trees(&compare_output, &current_output)?;
        debug!(entries = entries.len(), context = self.reporter.context(), "building report");
        let report = self
            .reporter
            .build(&compare_output, &current_output, &entries, observer)?;
        advance(state, PipelineState::Diffed, observer);
        Ok(report)
    }

    fn workspace(&self) -> PipelineResult<Workspace> {
        let root = absolute(&self.config.workspace_root())?;
        Ok(Workspace::new(root)?.guarding(absolute(&self.config.repo_root)?))
    }
}

fn advance<O: PipelineObserver>(state: &mut PipelineState, to: PipelineState, observer: &mut O) {
    debug_assert!(state.can_transition_to(to), "illegal transition {state} -> {to}");
    info!(from = %state, to = %to, "pipeline state");
    observer.transitioned(*state, to);
    *state = to;
}

fn teardown(workspace: &Workspace) {
    if let Err(e) = workspace.teardown() {
        warn!(error = %e, root = %workspace.root().display(), "workspace cleanup failed");
    }
}

fn absolute(path: &Path) -> PipelineResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| PipelineError::Config(format!("cannot resolve {}: {e}", path.display())))
}
