use crate::error::RetrievalResult;

/// One entry of a snapshot archive.
///
/// Paths are relative to the repository root and `/`-separated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchiveEntry {
    Directory {
        path: String,
    },
    File {
        path: String,
        content: Vec<u8>,
        executable: bool,
    },
}

impl ArchiveEntry {
    pub fn directory(path: impl Into<String>) -> Self {
        Self::Directory { path: path.into() }
    }

    pub fn file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::File {
            path: path.into(),
            content: content.into(),
            executable: false,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Directory { path } | Self::File { path, .. } => path,
        }
    }
}

/// A transient archive of a repository tree at one reference.
///
/// The archive lives in memory only and is consumed by extraction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotArchive {
    reference: String,
    entries: Vec<ArchiveEntry>,
}

impl SnapshotArchive {
    pub fn new(reference: impl Into<String>, entries: Vec<ArchiveEntry>) -> Self {
        Self {
            reference: reference.into(),
            entries,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of content bytes across all file entries.
    pub fn content_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match e {
                ArchiveEntry::File { content, .. } => content.len(),
                ArchiveEntry::Directory { .. } => 0,
            })
            .sum()
    }

    pub fn into_entries(self) -> Vec<ArchiveEntry> {
        self.entries
    }
}

/// Produces an archive of the tracked tree at an arbitrary reference.
///
/// Implementations must be `Send + Sync` so a pipeline can hold them in a
/// `Box<dyn SnapshotArchiver>`.
pub trait SnapshotArchiver: Send + Sync {
    /// Archive the complete tree at `reference`.
    fn archive(&self, reference: &str) -> RetrievalResult<SnapshotArchive>;
}
