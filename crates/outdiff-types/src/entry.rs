use std::fmt;

use serde::{Deserialize, Serialize};

/// The filesystem type of a compared path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// The outcome of comparing one relative path across two trees.
///
/// The left tree is the historical (reference) output and the right tree is
/// the current output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryState {
    /// Present in both trees with identical content.
    Equal,
    /// Present only in the left (reference) tree.
    LeftOnly,
    /// Present only in the right (current) tree.
    RightOnly,
    /// Present in both trees with differing content.
    Distinct,
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equal => "equal",
            Self::LeftOnly => "left-only",
            Self::RightOnly => "right-only",
            Self::Distinct => "distinct",
        };
        f.write_str(s)
    }
}

/// One classified path produced by the tree comparison.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the tree root, `/`-separated, without trailing slash.
    pub path: String,
    pub kind: EntryKind,
    pub state: EntryState,
}

impl TreeEntry {
    pub fn new(path: impl Into<String>, kind: EntryKind, state: EntryState) -> Self {
        Self {
            path: path.into(),
            kind,
            state,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// The path as it appears in a [`DiffReport`](crate::DiffReport).
    ///
    /// Directories carry a trailing `/` so they never collide with a file of
    /// the same name.
    pub fn report_path(&self) -> String {
        match self.kind {
            EntryKind::Directory => format!("{}/", self.path),
            EntryKind::File => self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_report_path_has_trailing_slash() {
        let dir = TreeEntry::new("out/acme", EntryKind::Directory, EntryState::LeftOnly);
        let file = TreeEntry::new("out/acme", EntryKind::File, EntryState::RightOnly);
        assert_eq!(dir.report_path(), "out/acme/");
        assert_eq!(file.report_path(), "out/acme");
        assert_ne!(dir.report_path(), file.report_path());
    }

    #[test]
    fn state_display_matches_classification_names() {
        assert_eq!(EntryState::LeftOnly.to_string(), "left-only");
        assert_eq!(EntryState::RightOnly.to_string(), "right-only");
        assert_eq!(EntryState::Distinct.to_string(), "distinct");
    }
}
