//! Diff report building.
//!
//! [`DiffReporter`] folds classified tree entries into a [`DiffReport`] and
//! notifies a [`ReportObserver`] as each removal, addition or change is found.

use std::fs;
use std::io;
use std::path::Path;

use outdiff_types::{join_relative, DiffReport, EntryState, TreeEntry};
use tracing::debug;

use crate::blob_diff::{diff_blobs, DEFAULT_CONTEXT};
use crate::error::{DiffError, DiffResult};

/// Receives progressive notifications while a report is built.
///
/// All methods default to doing nothing.
pub trait ReportObserver {
    /// A path exists only in the reference tree.
    fn removed(&mut self, _path: &str) {}

    /// A path exists only in the current tree.
    fn added(&mut self, _path: &str) {}

    /// A file differs; `diff` is the plain unified diff, `colored` the same
    /// text for terminal display.
    fn changed(&mut self, _path: &str, _diff: &str, _colored: &str) {}

    /// The report is complete.
    fn finished(&mut self, _report: &DiffReport) {}
}

/// Observer that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl ReportObserver for NullObserver {}

/// Builds a [`DiffReport`] from tree comparison entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiffReporter {
    context: usize,
}

impl Default for DiffReporter {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT)
    }
}

impl DiffReporter {
    pub fn new(context: usize) -> Self {
        Self { context }
    }

    pub fn context(&self) -> usize {
        self.context
    }

    /// Build the report for `entries` comparing `left_root` (reference) with
    /// `right_root` (current).
    ///
    /// Entries are consumed in order, so the removed and added lists keep the
    /// comparison's ordering. Fails if a changed file cannot be read; no
    /// partial report is returned.
    pub fn build(
        &self,
        left_root: &Path,
        right_root: &Path,
        entries: &[TreeEntry],
        observer: &mut dyn ReportObserver,
    ) -> DiffResult<DiffReport> {
        let mut report = DiffReport::new();

        for entry in entries {
            let path = entry.report_path();
            match entry.state {
                EntryState::Equal => continue,
                EntryState::LeftOnly => {
                    observer.removed(&path);
                    report.removed_files.push(path);
                }
                EntryState::RightOnly => {
                    observer.added(&path);
                    report.added_files.push(path);
                }
                EntryState::Distinct => {
                    let old = read_entry(left_root, &entry.path)?;
                    let new = read_entry(right_root, &entry.path)?;
                    let diff = diff_blobs(&old, &new, self.context);
                    debug!(
                        path = %path,
                        additions = diff.additions(),
                        deletions = diff.deletions(),
                        "file changed"
                    );
                    let plain = diff.to_unified();
                    observer.changed(&path, &plain, &diff.to_unified_colored());
                    report.changed_files.insert(path, plain);
                }
            }
        }

        observer.finished(&report);
        Ok(report)
    }
}

fn read_entry(root: &Path, relative: &str) -> DiffResult<Vec<u8>> {
    let path = join_relative(root, relative)
        .map_err(|e| DiffError::read(root.join(relative), io::Error::new(io::ErrorKind::InvalidInput, e)))?;
    fs::read(&path).map_err(|e| DiffError::read(path, e))
}
