use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The pipeline's durable result.
///
/// "Removed" always means present in the reference output only, "added"
/// means present in the current output only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    /// Paths only produced by the reference plugin, in traversal order.
    pub removed_files: Vec<String>,
    /// Paths only produced by the current plugin, in traversal order.
    pub added_files: Vec<String>,
    /// Changed file path to its plain unified diff.
    pub changed_files: BTreeMap<String, String>,
}

impl DiffReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if both outputs were identical.
    pub fn is_empty(&self) -> bool {
        self.removed_files.is_empty() && self.added_files.is_empty() && self.changed_files.is_empty()
    }

    /// Total number of reported paths.
    pub fn total(&self) -> usize {
        self.removed_files.len() + self.added_files.len() + self.changed_files.len()
    }
}
