//! Archive production backed by libgit2.

use std::path::PathBuf;

use git2::{ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use tracing::debug;

use crate::archive::{ArchiveEntry, SnapshotArchive, SnapshotArchiver};
use crate::error::{RetrievalError, RetrievalResult};

const EXECUTABLE_MODE: i32 = 0o100755;

/// Archives trees straight out of a git object database.
///
/// Equivalent to `git archive <reference>`: only tracked content is included
/// and the working tree is never consulted.
#[derive(Clone, Debug)]
pub struct GitArchiver {
    repo_root: PathBuf,
}

impl GitArchiver {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }
}

impl SnapshotArchiver for GitArchiver {
    fn archive(&self, reference: &str) -> RetrievalResult<SnapshotArchive> {
        let repo = Repository::open(&self.repo_root).map_err(|source| {
            RetrievalError::OpenRepository {
                path: self.repo_root.clone(),
                source,
            }
        })?;

        let tree = repo
            .revparse_single(reference)
            .and_then(|object| object.peel_to_tree())
            .map_err(|source| RetrievalError::InvalidReference {
                reference: reference.to_string(),
                source,
            })?;

        let mut entries = Vec::new();
        let mut failure: Option<String> = None;

        let walked = tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            let Some(name) = entry.name() else {
                failure = Some(format!("non UTF-8 entry name under {dir:?}"));
                return TreeWalkResult::Abort;
            };
            let path = format!("{dir}{name}");

            match entry.kind() {
                Some(ObjectType::Tree) => entries.push(ArchiveEntry::directory(path)),
                Some(ObjectType::Blob) => match repo.find_blob(entry.id()) {
                    Ok(blob) => entries.push(ArchiveEntry::File {
                        path,
                        content: blob.content().to_vec(),
                        executable: entry.filemode() == EXECUTABLE_MODE,
                    }),
                    Err(e) => {
                        failure = Some(format!("cannot read blob {path}: {e}"));
                        return TreeWalkResult::Abort;
                    }
                },
                Some(ObjectType::Commit) => debug!(%path, "skipping submodule"),
                other => debug!(%path, kind = ?other, "skipping unsupported tree entry"),
            }
            TreeWalkResult::Ok
        });

        if let Some(message) = failure {
            return Err(RetrievalError::Archive {
                reference: reference.to_string(),
                message,
            });
        }
        walked.map_err(|e| RetrievalError::Archive {
            reference: reference.to_string(),
            message: e.to_string(),
        })?;

        debug!(reference, entries = entries.len(), "archived tree");
        Ok(SnapshotArchive::new(reference, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("outdiff", "outdiff@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn file_content<'a>(archive: &'a SnapshotArchive, wanted: &str) -> Option<&'a [u8]> {
        archive.entries().iter().find_map(|e| match e {
            ArchiveEntry::File { path, content, .. } if path == wanted => Some(content.as_slice()),
            _ => None,
        })
    }

    #[test]
    fn archives_tree_at_reference() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "plugins/demo/plugin.toml", "kind = \"template\"\n");
        write(dir.path(), "fixtures/acme/spot1.json", "{}");
        commit_all(&repo, "initial");

        let archive = GitArchiver::new(dir.path()).archive("HEAD").unwrap();
        let paths: Vec<&str> = archive.entries().iter().map(|e| e.path()).collect();

        assert!(paths.contains(&"plugins"));
        assert!(paths.contains(&"plugins/demo"));
        assert!(paths.contains(&"fixtures/acme/spot1.json"));
        assert_eq!(
            file_content(&archive, "plugins/demo/plugin.toml"),
            Some(&b"kind = \"template\"\n"[..])
        );
    }

    #[test]
    fn older_reference_ignores_later_commits_and_working_tree() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "data.txt", "v1");
        commit_all(&repo, "v1");
        write(dir.path(), "data.txt", "v2");
        commit_all(&repo, "v2");
        write(dir.path(), "data.txt", "uncommitted");
        write(dir.path(), "untracked.txt", "x");

        let archiver = GitArchiver::new(dir.path());
        let previous = archiver.archive("HEAD~1").unwrap();
        let head = archiver.archive("HEAD").unwrap();

        assert_eq!(file_content(&previous, "data.txt"), Some(&b"v1"[..]));
        assert_eq!(file_content(&head, "data.txt"), Some(&b"v2"[..]));
        assert!(file_content(&head, "untracked.txt").is_none());
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "a.txt", "a");
        commit_all(&repo, "initial");

        let err = GitArchiver::new(dir.path()).archive("no-such-branch").unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::InvalidReference { ref reference, .. } if reference == "no-such-branch"
        ));
    }

    #[test]
    fn missing_repository_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitArchiver::new(dir.path().join("nope")).archive("HEAD").unwrap_err();
        assert!(matches!(err, RetrievalError::OpenRepository { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_is_recorded() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "plugins/cmd/export.sh", "#!/bin/sh\n");
        let script = dir.path().join("plugins/cmd/export.sh");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        commit_all(&repo, "initial");

        let archive = GitArchiver::new(dir.path()).archive("HEAD").unwrap();
        let executable = archive.entries().iter().any(|e| {
            matches!(e, ArchiveEntry::File { path, executable: true, .. } if path == "plugins/cmd/export.sh")
        });
        assert!(executable);
    }
}
