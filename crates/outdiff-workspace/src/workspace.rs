use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::error::{WorkspaceError, WorkspaceResult};

const CURRENT_OUTPUT: &str = "current_output";
const COMPARE_OUTPUT: &str = "compare_output";
const COMPARE_FILES: &str = "compare_files";

/// A temporary directory owned by one pipeline run.
///
/// Layout under the root:
/// ```text
/// current_output/   files exported by the current plugin
/// compare_output/   files exported by the reference plugin
/// compare_files/    the extracted historical snapshot
/// ```
///
/// The workspace is process-exclusive: callers must not run two pipelines
/// against the same root concurrently.
#[derive(Clone, Debug)]
pub struct Workspace {
    root: PathBuf,
    guards: Vec<PathBuf>,
}

impl Workspace {
    /// Create a workspace guarded against the process working directory.
    pub fn new(root: impl Into<PathBuf>) -> WorkspaceResult<Self> {
        let guard = std::env::current_dir().map_err(WorkspaceError::CurrentDir)?;
        Ok(Self::with_guard(root, guard))
    }

    /// Create a workspace guarded against an explicit directory.
    pub fn with_guard(root: impl Into<PathBuf>, guard: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            guards: vec![guard.into()],
        }
    }

    /// Additionally protect `dir` (for example the live repository root).
    pub fn guarding(mut self, dir: impl Into<PathBuf>) -> Self {
        self.guards.push(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_output(&self) -> PathBuf {
        self.root.join(CURRENT_OUTPUT)
    }

    pub fn compare_output(&self) -> PathBuf {
        self.root.join(COMPARE_OUTPUT)
    }

    pub fn compare_files(&self) -> PathBuf {
        self.root.join(COMPARE_FILES)
    }

    /// Remove any previous workspace and recreate it empty.
    ///
    /// Parent directories are created as needed. Fails with
    /// [`WorkspaceError::UnsafePath`] before deleting anything if the root is
    /// the guarded directory or one of its ancestors.
    pub fn prepare(&self) -> WorkspaceResult<()> {
        self.check_guard()?;
        remove_tree(&self.root)?;
        fs::create_dir_all(&self.root).map_err(|e| WorkspaceError::io(&self.root, e))?;
        info!(root = %self.root.display(), "workspace prepared");
        Ok(())
    }

    /// Remove the workspace and everything under it.
    ///
    /// A workspace that does not exist is not an error.
    pub fn teardown(&self) -> WorkspaceResult<()> {
        self.check_guard()?;
        remove_tree(&self.root)?;
        info!(root = %self.root.display(), "workspace removed");
        Ok(())
    }

    /// Fail if the root is a guarded directory or one of their ancestors.
    pub fn check_guard(&self) -> WorkspaceResult<()> {
        let root = resolve(&self.root).map_err(|e| WorkspaceError::io(&self.root, e))?;
        for guard in &self.guards {
            let resolved = resolve(guard).map_err(|e| WorkspaceError::io(guard, e))?;
            debug!(root = %root.display(), guard = %resolved.display(), "checking workspace guard");

            if resolved.starts_with(&root) {
                return Err(WorkspaceError::UnsafePath {
                    path: self.root.clone(),
                    guard: guard.clone(),
                });
            }
        }
        Ok(())
    }
}

fn remove_tree(path: &Path) -> WorkspaceResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WorkspaceError::io(path, e)),
    }
}

/// Absolute, lexically normalised path with symlinks resolved for the part
/// that already exists on disk.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = normalize_lexically(&std::path::absolute(path)?);

    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    loop {
        if existing.exists() {
            let mut resolved = existing.canonicalize()?;
            resolved.extend(rest.iter().rev());
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_creates_missing_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        let ws = Workspace::with_guard(tmp.path().join("a/b/ws"), cwd.path());

        ws.prepare().unwrap();
        assert!(ws.root().is_dir());
    }

    #[test]
    fn prepare_wipes_previous_content() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        let ws = Workspace::with_guard(tmp.path().join("ws"), cwd.path());

        ws.prepare().unwrap();
        fs::create_dir_all(ws.current_output()).unwrap();
        fs::write(ws.current_output().join("stale.ext"), b"old").unwrap();

        ws.prepare().unwrap();
        assert!(ws.root().is_dir());
        assert!(!ws.current_output().exists());
    }

    #[test]
    fn teardown_tolerates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        let ws = Workspace::with_guard(tmp.path().join("never-created"), cwd.path());

        ws.teardown().unwrap();
        ws.teardown().unwrap();
    }

    #[test]
    fn teardown_removes_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        let ws = Workspace::with_guard(tmp.path().join("ws"), cwd.path());
        ws.prepare().unwrap();
        fs::create_dir_all(ws.compare_files().join("plugins")).unwrap();

        ws.teardown().unwrap();
        assert!(!ws.root().exists());
    }

    #[test]
    fn prepare_refuses_the_guarded_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("keep.txt");
        fs::write(&marker, b"precious").unwrap();

        let ws = Workspace::with_guard(tmp.path(), tmp.path());
        let err = ws.prepare().unwrap_err();

        assert!(matches!(err, WorkspaceError::UnsafePath { .. }));
        assert!(marker.exists(), "nothing may be deleted");
    }

    #[test]
    fn prepare_refuses_an_ancestor_of_the_guarded_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tmp.path().join("project/src");
        fs::create_dir_all(&cwd).unwrap();

        let ws = Workspace::with_guard(tmp.path().join("project"), &cwd);
        assert!(matches!(ws.prepare(), Err(WorkspaceError::UnsafePath { .. })));
        assert!(matches!(ws.teardown(), Err(WorkspaceError::UnsafePath { .. })));
        assert!(cwd.exists());
    }

    #[test]
    fn guard_sees_through_parent_components() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tmp.path().join("project");
        fs::create_dir_all(&cwd).unwrap();

        let sneaky = cwd.join("tmp").join("..");
        let ws = Workspace::with_guard(sneaky, &cwd);
        assert!(matches!(ws.prepare(), Err(WorkspaceError::UnsafePath { .. })));
    }

    #[test]
    fn sibling_of_guarded_directory_is_allowed() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tmp.path().join("project");
        fs::create_dir_all(&cwd).unwrap();

        let ws = Workspace::with_guard(tmp.path().join("project-tmp"), &cwd);
        ws.prepare().unwrap();
        assert!(ws.root().is_dir());
    }

    #[test]
    fn every_guard_is_checked() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tmp.path().join("elsewhere");
        let repo = tmp.path().join("repo");
        fs::create_dir_all(&cwd).unwrap();
        fs::create_dir_all(repo.join("plugins")).unwrap();

        let ws = Workspace::with_guard(&repo, &cwd).guarding(&repo);
        assert!(matches!(ws.prepare(), Err(WorkspaceError::UnsafePath { .. })));
        assert!(repo.join("plugins").is_dir());
    }

    #[test]
    fn layout_is_rooted_in_workspace() {
        let ws = Workspace::with_guard("/tmp/outdiff", "/home/dev");
        assert_eq!(ws.current_output(), PathBuf::from("/tmp/outdiff/current_output"));
        assert_eq!(ws.compare_output(), PathBuf::from("/tmp/outdiff/compare_output"));
        assert_eq!(ws.compare_files(), PathBuf::from("/tmp/outdiff/compare_files"));
    }
}
