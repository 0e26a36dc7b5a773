use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use outdiff_types::join_relative;
use tracing::{debug, info};

use crate::archive::{ArchiveEntry, SnapshotArchive, SnapshotArchiver};
use crate::error::{RetrievalError, RetrievalResult};

/// Where a snapshot's content comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// The live working tree.
    Live,
    /// A tree materialised from a version-control reference.
    Historical { reference: String },
}

/// A directory tree holding a plugin implementation and its supporting data.
///
/// Snapshots are mutually isolated: a historical snapshot is a full copy and
/// shares no files with the live tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    root: PathBuf,
    origin: SnapshotOrigin,
}

impl Snapshot {
    /// The live tree rooted at `root`.
    pub fn live(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            origin: SnapshotOrigin::Live,
        }
    }

    pub fn historical(root: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            origin: SnapshotOrigin::Historical {
                reference: reference.into(),
            },
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn origin(&self) -> &SnapshotOrigin {
        &self.origin
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            SnapshotOrigin::Live => write!(f, "live tree at {}", self.root.display()),
            SnapshotOrigin::Historical { reference } => {
                write!(f, "'{}' at {}", reference, self.root.display())
            }
        }
    }
}

/// Materialises historical snapshots on disk.
pub struct SnapshotRetriever {
    archiver: Box<dyn SnapshotArchiver>,
}

impl SnapshotRetriever {
    pub fn new(archiver: Box<dyn SnapshotArchiver>) -> Self {
        Self { archiver }
    }

    /// Produce an independent copy of the tree at `reference` under
    /// `destination`.
    ///
    /// The archive is dropped once extraction ends, whether it succeeded or
    /// not. Entries already written before a failure stay on disk.
    pub fn retrieve(&self, reference: &str, destination: &Path) -> RetrievalResult<Snapshot> {
        let archive = self.archiver.archive(reference)?;
        info!(
            reference,
            entries = archive.len(),
            bytes = archive.content_bytes(),
            "extracting snapshot"
        );
        extract(archive, destination)?;
        Ok(Snapshot::historical(destination, reference))
    }
}

/// Unpack every archive entry under `destination`, consuming the archive.
pub fn extract(archive: SnapshotArchive, destination: &Path) -> RetrievalResult<()> {
    fs::create_dir_all(destination).map_err(|source| RetrievalError::Write {
        path: destination.to_path_buf(),
        source,
    })?;

    let reference = archive.reference().to_string();
    for entry in archive.into_entries() {
        let target = join_relative(destination, entry.path()).map_err(|_| {
            RetrievalError::UnsafeEntry {
                reference: reference.clone(),
                path: entry.path().to_string(),
            }
        })?;

        match entry {
            ArchiveEntry::Directory { .. } => create_dir(&target)?,
            ArchiveEntry::File {
                content,
                executable,
                ..
            } => {
                if let Some(parent) = target.parent() {
                    create_dir(parent)?;
                }
                fs::write(&target, &content).map_err(|source| RetrievalError::Write {
                    path: target.clone(),
                    source,
                })?;
                if executable {
                    mark_executable(&target)?;
                }
                debug!(path = %target.display(), bytes = content.len(), "extracted");
            }
        }
    }
    Ok(())
}

fn create_dir(path: &Path) -> RetrievalResult<()> {
    fs::create_dir_all(path).map_err(|source| RetrievalError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> RetrievalResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let write_err = |source| RetrievalError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut permissions = fs::metadata(path).map_err(write_err)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions).map_err(write_err)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> RetrievalResult<()> {
    Ok(())
}
