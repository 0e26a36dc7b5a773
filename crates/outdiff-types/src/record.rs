use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifies one input record as a `(group, item)` pair.
///
/// The pipeline never looks inside a record; it only hands the reference to
/// a resolver rooted in a snapshot, which produces the full [`Record`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordRef {
    /// Grouping key (for fixtures: the manufacturer directory).
    pub group: String,
    /// Item key within the group (for fixtures: the file stem).
    pub item: String,
}

impl RecordRef {
    pub fn new(group: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            item: item.into(),
        }
    }

    /// Derive a reference from a record file path.
    ///
    /// The group is the name of the parent directory and the item is the file
    /// stem, so `fixtures/acme/spot1.json` becomes `(acme, spot1)`.
    pub fn from_fixture_path(path: &Path) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidRecordPath(path.display().to_string());

        let item = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid)?;
        let group = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid)?;

        Ok(Self::new(group, item))
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.item)
    }
}

/// A fully resolved record, ready to be exported.
///
/// `data` is opaque to the pipeline; only plugins interpret it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub group: String,
    pub item: String,
    pub data: serde_json::Value,
}

impl Record {
    pub fn new(reference: &RecordRef, data: serde_json::Value) -> Self {
        Self {
            group: reference.group.clone(),
            item: reference.item.clone(),
            data,
        }
    }
}
