//! Blob-level diff: line-by-line comparison of file contents.
//!
//! Uses the `similar` crate (Myers diff algorithm) to produce structured
//! hunks with context lines, and renders them in unified diff format.

use std::fmt::Write as _;

use colored::{ColoredString, Colorize};
use similar::{ChangeTag, TextDiff};

/// Context radius used around each change unless configured otherwise.
pub const DEFAULT_CONTEXT: usize = 3;

const OLD_HEADER: &str = "--- removed";
const NEW_HEADER: &str = "+++ added";
const NO_NEWLINE: &str = "\\ No newline at end of file";

/// The result of diffing two blobs (file contents).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobDiff {
    /// The diff hunks.
    pub hunks: Vec<DiffHunk>,
    /// Total number of lines in the old content.
    pub old_lines: usize,
    /// Total number of lines in the new content.
    pub new_lines: usize,
}

impl BlobDiff {
    /// Returns `true` if the two blobs are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Total number of lines added across all hunks.
    pub fn additions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Added(_)))
    }

    /// Total number of lines removed across all hunks.
    pub fn deletions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Removed(_)))
    }

    fn count(&self, pred: impl Fn(&DiffLine) -> bool) -> usize {
        self.hunks.iter().flat_map(|h| &h.lines).filter(|l| pred(l)).count()
    }

    /// Render as plain unified diff text.
    ///
    /// The old side is labelled `removed` and the new side `added`. Identical
    /// blobs render as the empty string.
    pub fn to_unified(&self) -> String {
        self.render(false)
    }

    /// Render the same text as [`BlobDiff::to_unified`] with terminal colours.
    pub fn to_unified_colored(&self) -> String {
        self.render(true)
    }

    fn render(&self, color: bool) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", paint(color, OLD_HEADER, |s| s.red()));
        let _ = writeln!(out, "{}", paint(color, NEW_HEADER, |s| s.green()));
        for hunk in &self.hunks {
            let _ = writeln!(out, "{}", paint(color, &hunk.header(), |s| s.cyan()));
            for line in &hunk.lines {
                let rendered = match line {
                    DiffLine::Context(text) => format!(" {text}"),
                    DiffLine::Added(text) => paint(color, &format!("+{text}"), |s| s.green()),
                    DiffLine::Removed(text) => paint(color, &format!("-{text}"), |s| s.red()),
                    DiffLine::NoNewlineAtEof => NO_NEWLINE.to_string(),
                };
                let _ = writeln!(out, "{rendered}");
            }
        }
        out
    }
}

fn paint(color: bool, text: &str, style: fn(&str) -> ColoredString) -> String {
    if color {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

/// A contiguous region of changes in a diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// Line number in the old content where this hunk starts (1-based).
    pub old_start: usize,
    /// Number of lines from the old content in this hunk.
    pub old_count: usize,
    /// Line number in the new content where this hunk starts (1-based).
    pub new_start: usize,
    /// Number of lines from the new content in this hunk.
    pub new_count: usize,
    /// The individual diff lines in this hunk.
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// The `@@ -a,b +c,d @@` range header.
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            range(self.old_start, self.old_count),
            range(self.new_start, self.new_count)
        )
    }
}

// A count of one is implied; an empty range names the line before it.
fn range(start: usize, count: usize) -> String {
    match count {
        0 => format!("{},0", start.saturating_sub(1)),
        1 => start.to_string(),
        _ => format!("{start},{count}"),
    }
}

/// A single line in a diff hunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// A line present in both old and new (context).
    Context(String),
    /// A line added in the new content.
    Added(String),
    /// A line removed from the old content.
    Removed(String),
    /// The preceding line is the last one and has no trailing newline.
    NoNewlineAtEof,
}

/// Compute a line-by-line diff between two byte slices.
///
/// The content is interpreted as UTF-8 text. If either side is not valid
/// UTF-8 (binary files), a single hunk noting the binary difference is
/// returned instead. `context` is the number of unchanged lines kept around
/// each change.
pub fn diff_blobs(old: &[u8], new: &[u8], context: usize) -> BlobDiff {
    let (old_str, new_str) = match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(old_str), Ok(new_str)) => (old_str, new_str),
        _ => return make_binary_diff(old, new),
    };
    let old_lines = old_str.lines().count();
    let new_lines = new_str.lines().count();

    if old_str == new_str {
        return BlobDiff {
            hunks: Vec::new(),
            old_lines,
            new_lines,
        };
    }

    let text_diff = TextDiff::from_lines(old_str, new_str);
    let mut hunks = Vec::new();

    for group in text_diff.grouped_ops(context) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = DiffHunk {
            old_start: first.old_range().start + 1,
            old_count: 0,
            new_start: first.new_range().start + 1,
            new_count: 0,
            lines: Vec::new(),
        };

        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.lines.push(DiffLine::Context(text));
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                    }
                    ChangeTag::Delete => {
                        hunk.lines.push(DiffLine::Removed(text));
                        hunk.old_count += 1;
                    }
                    ChangeTag::Insert => {
                        hunk.lines.push(DiffLine::Added(text));
                        hunk.new_count += 1;
                    }
                }
                if change.missing_newline() {
                    hunk.lines.push(DiffLine::NoNewlineAtEof);
                }
            }
        }

        hunks.push(hunk);
    }

    BlobDiff {
        hunks,
        old_lines,
        new_lines,
    }
}

/// Create a synthetic diff for binary content.
///
/// Each non-empty side becomes one line naming its size and the first byte
/// offset at which the two sides disagree.
fn make_binary_diff(old: &[u8], new: &[u8]) -> BlobDiff {
    if old == new {
        return BlobDiff {
            hunks: Vec::new(),
            old_lines: 0,
            new_lines: 0,
        };
    }

    let offset = old
        .iter()
        .zip(new)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| old.len().min(new.len()));
    let describe = |bytes: &[u8]| {
        format!("(binary content, {} bytes, differs from byte {offset})", bytes.len())
    };

    let mut lines = Vec::new();
    if !old.is_empty() {
        lines.push(DiffLine::Removed(describe(old)));
    }
    if !new.is_empty() {
        lines.push(DiffLine::Added(describe(new)));
    }

    BlobDiff {
        hunks: vec![DiffHunk {
            old_start: 1,
            old_count: usize::from(!old.is_empty()),
            new_start: 1,
            new_count: usize::from(!new.is_empty()),
            lines,
        }],
        old_lines: 0,
        new_lines: 0,
    }
}
