//! Line-based unified diffs.
//!
//! [`synthesize`] compares an original file against proposed content and
//! produces a [`FileDiff`]; [`FileDiff::render`] emits git-compatible text.
//! [`parse_patch`] and [`apply_hunks`] go the other way and are used by the
//! validator's dry run.

mod apply;
mod myers;
mod parse;
mod synthesize;

pub use apply::{apply_hunks, ApplyError, AppliedPatch};
pub use myers::{diff_slices, Edit};
pub use parse::{parse_patch, PatchParseError, PatchedFile};
pub use synthesize::{match_line_endings, synthesize, CONTEXT_LINES};

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Marker emitted after a line that lacks a trailing newline.
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// How a file is affected by a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a line within a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Context,
    Removed,
    Added,
}

impl LineKind {
    fn prefix(self) -> char {
        match self {
            Self::Context => ' ',
            Self::Removed => '-',
            Self::Added => '+',
        }
    }
}

/// One line of a hunk, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkLine {
    pub kind: LineKind,
    pub text: String,
    /// The line is the last in its file and has no trailing newline.
    pub no_newline: bool,
}

impl HunkLine {
    /// Build from a raw line that may end in `\n`.
    pub fn from_raw(kind: LineKind, raw: &str) -> Self {
        match raw.strip_suffix('\n') {
            Some(text) => Self {
                kind,
                text: text.to_string(),
                no_newline: false,
            },
            None => Self {
                kind,
                text: raw.to_string(),
                no_newline: true,
            },
        }
    }

    /// The line as it appears in the file, terminator included.
    pub fn raw(&self) -> String {
        if self.no_newline {
            self.text.clone()
        } else {
            format!("{}\n", self.text)
        }
    }
}

/// A contiguous region of change with surrounding context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// 1-based start in the original; the line before the change when `old_count == 0`.
    pub old_start: usize,
    pub old_count: usize,
    /// 1-based start in the result; the line before the change when `new_count == 0`.
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }

    /// Lines the hunk expects to find (context and removals).
    pub fn old_lines(&self) -> impl Iterator<Item = &HunkLine> {
        self.lines.iter().filter(|l| l.kind != LineKind::Added)
    }

    /// Lines the hunk leaves behind (context and additions).
    pub fn new_lines(&self) -> impl Iterator<Item = &HunkLine> {
        self.lines.iter().filter(|l| l.kind != LineKind::Removed)
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(&self.header());
        out.push('\n');
        for line in &self.lines {
            out.push(line.kind.prefix());
            out.push_str(&line.text);
            out.push('\n');
            if line.no_newline {
                out.push_str(NO_NEWLINE_MARKER);
                out.push('\n');
            }
        }
    }
}

/// The diff of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub kind: ChangeKind,
    pub hunks: Vec<Hunk>,
    pub additions: usize,
    pub deletions: usize,
}

impl FileDiff {
    pub fn unchanged(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Unchanged,
            hunks: Vec::new(),
            additions: 0,
            deletions: 0,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.kind == ChangeKind::Unchanged || self.hunks.is_empty()
    }

    /// Git-style text for this file; empty for an unchanged file.
    pub fn render(&self) -> String {
        if self.is_unchanged() {
            return String::new();
        }

        let path = &self.path;
        let mut out = String::new();
        let _ = writeln!(out, "diff --git a/{path} b/{path}");
        match self.kind {
            ChangeKind::Added => {
                out.push_str("new file mode 100644\n");
                out.push_str("--- /dev/null\n");
                let _ = writeln!(out, "+++ b/{path}");
            }
            ChangeKind::Deleted => {
                out.push_str("deleted file mode 100644\n");
                let _ = writeln!(out, "--- a/{path}");
                out.push_str("+++ /dev/null\n");
            }
            ChangeKind::Modified | ChangeKind::Unchanged => {
                let _ = writeln!(out, "--- a/{path}");
                let _ = writeln!(out, "+++ b/{path}");
            }
        }
        for hunk in &self.hunks {
            hunk.render_into(&mut out);
        }
        out
    }
}
