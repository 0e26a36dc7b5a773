use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::record::RecordRef;

/// The immutable inputs of one pipeline run.
///
/// The same request is handed to both export invocations so that the two
/// output trees can only differ because of plugin code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Records to export, in caller order.
    pub records: Vec<RecordRef>,
    /// Timestamp shared by both exports.
    pub date: DateTime<Utc>,
}

impl ExportRequest {
    pub fn new(records: Vec<RecordRef>, date: DateTime<Utc>) -> Self {
        Self { records, date }
    }

    /// Bind the request to a snapshot's base directory.
    pub fn options_for(&self, base_dir: &Path) -> ExportOptions {
        ExportOptions {
            base_dir: base_dir.to_path_buf(),
            date: self.date,
        }
    }
}

/// Global options passed to an export plugin alongside the records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Root of the snapshot the plugin belongs to.
    pub base_dir: PathBuf,
    /// The run's timestamp.
    pub date: DateTime<Utc>,
}

/// A single file produced by an export plugin.
///
/// `name` is relative to the output directory. On the wire `content` may be
/// either a JSON string or a JSON array of bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub name: String,
    #[serde(deserialize_with = "deserialize_content")]
    pub content: Vec<u8>,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FileContent {
    Text(String),
    Bytes(Vec<u8>),
}

fn deserialize_content<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FileContent::deserialize(deserializer)? {
        FileContent::Text(text) => text.into_bytes(),
        FileContent::Bytes(bytes) => bytes,
    })
}
