//! Tree-level diff: compare two directory trees path by path.
//!
//! Both trees are walked in lock-step, depth-first and in lexical order within
//! each directory. Every filesystem object on either side yields one
//! [`TreeEntry`], so the result is a complete and reproducible inventory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use outdiff_types::{EntryKind, EntryState, TreeEntry};
use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{DiffError, DiffResult};

/// Compare the tree at `left` (reference) against the tree at `right` (current).
///
/// - A path present on one side only is `LeftOnly` / `RightOnly`. For a
///   directory, the directory itself and every descendant are reported.
/// - A file present on both sides is `Equal` or `Distinct` by byte content.
/// - A directory present on both sides is `Equal` and is recursed into.
/// - A path that is a file on one side and a directory on the other is
///   reported as the left side's entries followed by the right side's.
///
/// Sibling subtrees are compared in parallel; the merged order is the same as
/// a sequential walk.
pub fn compare_trees(left: &Path, right: &Path) -> DiffResult<Vec<TreeEntry>> {
    for root in [left, right] {
        if !root.is_dir() {
            return Err(DiffError::MissingRoot(root.to_path_buf()));
        }
    }
    let entries = compare_dirs(left, right, "")?;
    debug!(
        left = %left.display(),
        right = %right.display(),
        entries = entries.len(),
        "compared trees"
    );
    Ok(entries)
}

/// A named child of a directory on one side.
#[derive(Clone, Debug)]
struct Child {
    path: PathBuf,
    kind: EntryKind,
}

fn compare_dirs(left: &Path, right: &Path, prefix: &str) -> DiffResult<Vec<TreeEntry>> {
    let left_children = list_dir(left)?;
    let right_children = list_dir(right)?;
    let names: BTreeSet<&String> = left_children.keys().chain(right_children.keys()).collect();
    let names: Vec<&String> = names.into_iter().collect();

    let nested = names
        .par_iter()
        .map(|name| {
            let rel = join(prefix, name);
            match (left_children.get(*name), right_children.get(*name)) {
                (Some(l), Some(r)) => compare_child(l, r, &rel),
                (Some(l), None) => one_sided(l, &rel, EntryState::LeftOnly),
                (None, Some(r)) => one_sided(r, &rel, EntryState::RightOnly),
                (None, None) => Ok(Vec::new()),
            }
        })
        .collect::<DiffResult<Vec<Vec<TreeEntry>>>>()?;

    Ok(nested.into_iter().flatten().collect())
}

fn compare_child(left: &Child, right: &Child, rel: &str) -> DiffResult<Vec<TreeEntry>> {
    match (left.kind, right.kind) {
        (EntryKind::File, EntryKind::File) => {
            let state = if read(&left.path)? == read(&right.path)? {
                EntryState::Equal
            } else {
                EntryState::Distinct
            };
            Ok(vec![TreeEntry::new(rel, EntryKind::File, state)])
        }
        (EntryKind::Directory, EntryKind::Directory) => {
            let mut entries = vec![TreeEntry::new(rel, EntryKind::Directory, EntryState::Equal)];
            entries.extend(compare_dirs(&left.path, &right.path, rel)?);
            Ok(entries)
        }
        _ => {
            let mut entries = one_sided(left, rel, EntryState::LeftOnly)?;
            entries.extend(one_sided(right, rel, EntryState::RightOnly)?);
            Ok(entries)
        }
    }
}

/// Report `child` and, for a directory, everything below it.
fn one_sided(child: &Child, rel: &str, state: EntryState) -> DiffResult<Vec<TreeEntry>> {
    let mut entries = vec![TreeEntry::new(rel, child.kind, state)];
    if child.kind == EntryKind::File {
        return Ok(entries);
    }

    for item in WalkDir::new(&child.path)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let item = item.map_err(|e| {
            let path = e.path().unwrap_or(&child.path).to_path_buf();
            DiffError::read(path, io::Error::from(e))
        })?;
        let suffix = item
            .path()
            .strip_prefix(&child.path)
            .ok()
            .and_then(relative_str)
            .ok_or_else(|| DiffError::NonUtf8Path(item.path().to_path_buf()))?;
        let kind = if item.file_type().is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(TreeEntry::new(join(rel, &suffix), kind, state));
    }
    Ok(entries)
}

fn list_dir(dir: &Path) -> DiffResult<BTreeMap<String, Child>> {
    let mut children = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(|e| DiffError::read(dir, e))? {
        let entry = entry.map_err(|e| DiffError::read(dir, e))?;
        let path = entry.path();
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| DiffError::NonUtf8Path(path.clone()))?;
        // Follows symlinks, matching the content comparison.
        let metadata = fs::metadata(&path).map_err(|e| DiffError::read(&path, e))?;
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        children.insert(name, Child { path, kind });
    }
    Ok(children)
}

fn read(path: &Path) -> DiffResult<Vec<u8>> {
    fs::read(path).map_err(|e| DiffError::read(path, e))
}

fn relative_str(path: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = path.components().map(|c| c.as_os_str().to_str()).collect();
    parts.map(|p| p.join("/"))
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
