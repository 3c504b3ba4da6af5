//! Reading unified-diff documents back into hunks.

use std::sync::LazyLock;

use regex::Regex;

use super::{Hunk, HunkLine, LineKind, NO_NEWLINE_MARKER};

static HUNK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header regex is valid")
});

/// A malformed patch document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed patch at line {line}: {message}")]
pub struct PatchParseError {
    pub line: usize,
    pub message: String,
}

/// The hunks a patch document applies to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedFile {
    /// `None` for `/dev/null`, i.e. the file is created.
    pub old_path: Option<String>,
    /// `None` for `/dev/null`, i.e. the file is deleted.
    pub new_path: Option<String>,
    pub hunks: Vec<Hunk>,
}

impl PatchedFile {
    /// The path the patch touches, preferring the post-image name.
    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or_default()
    }

    pub fn is_new(&self) -> bool {
        self.old_path.is_none()
    }

    pub fn is_deleted(&self) -> bool {
        self.new_path.is_none()
    }
}

/// Parse every file section of a patch document.
///
/// Anything before the first file header (mail headers, description,
/// diffstat) is skipped. Lines are split on `\n` alone: a `\r` before it is
/// part of the line's content.
pub fn parse_patch(document: &str) -> Result<Vec<PatchedFile>, PatchParseError> {
    let lines: Vec<&str> = document
        .split_inclusive('\n')
        .map(|line| line.strip_suffix('\n').unwrap_or(line))
        .collect();
    let mut files = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let is_header = lines[i].starts_with("--- ")
            && lines.get(i + 1).is_some_and(|next| next.starts_with("+++ "));
        if !is_header {
            i += 1;
            continue;
        }

        let old_path = header_path(&lines[i][4..]);
        let new_path = header_path(&lines[i + 1][4..]);
        if old_path.is_none() && new_path.is_none() {
            return Err(PatchParseError {
                line: i + 1,
                message: "both sides are /dev/null".into(),
            });
        }
        i += 2;

        let mut hunks = Vec::new();
        while i < lines.len() && lines[i].starts_with("@@ ") {
            hunks.push(parse_hunk(&lines, &mut i)?);
        }
        files.push(PatchedFile {
            old_path,
            new_path,
            hunks,
        });
    }

    Ok(files)
}

fn header_path(raw: &str) -> Option<String> {
    let path = raw.split('\t').next().unwrap_or(raw).trim_end();
    if path == "/dev/null" {
        return None;
    }
    let path = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    Some(path.to_string())
}

fn parse_hunk(lines: &[&str], i: &mut usize) -> Result<Hunk, PatchParseError> {
    let header_line = *i + 1;
    let caps = HUNK_HEADER_RE
        .captures(lines[*i])
        .ok_or_else(|| PatchParseError {
            line: header_line,
            message: format!("invalid hunk header: {}", lines[*i]),
        })?;
    let number = |idx: usize| -> Result<usize, PatchParseError> {
        match caps.get(idx) {
            None => Ok(1),
            Some(m) => m.as_str().parse().map_err(|_| PatchParseError {
                line: header_line,
                message: format!("number out of range: {}", m.as_str()),
            }),
        }
    };
    let (old_start, old_count) = (number(1)?, number(2)?);
    let (new_start, new_count) = (number(3)?, number(4)?);
    *i += 1;

    let mut hunk_lines: Vec<HunkLine> = Vec::new();
    let (mut old_seen, mut new_seen) = (0, 0);
    while old_seen < old_count || new_seen < new_count {
        let Some(&line) = lines.get(*i) else {
            return Err(PatchParseError {
                line: *i,
                message: "hunk ends before its line counts are satisfied".into(),
            });
        };
        let (kind, text) = match line.chars().next() {
            Some(' ') => (LineKind::Context, &line[1..]),
            // Some tools strip the space from empty context lines.
            None => (LineKind::Context, ""),
            Some('-') => (LineKind::Removed, &line[1..]),
            Some('+') => (LineKind::Added, &line[1..]),
            Some('\\') => {
                mark_no_newline(&mut hunk_lines);
                *i += 1;
                continue;
            }
            Some(_) => {
                return Err(PatchParseError {
                    line: *i + 1,
                    message: format!("unexpected line in hunk: {line}"),
                })
            }
        };
        match kind {
            LineKind::Context => {
                old_seen += 1;
                new_seen += 1;
            }
            LineKind::Removed => old_seen += 1,
            LineKind::Added => new_seen += 1,
        }
        hunk_lines.push(HunkLine {
            kind,
            text: text.to_string(),
            no_newline: false,
        });
        *i += 1;
    }

    if old_seen != old_count || new_seen != new_count {
        return Err(PatchParseError {
            line: header_line,
            message: "hunk body does not match its header counts".into(),
        });
    }

    // A trailing marker belongs to the hunk's final line.
    if lines.get(*i).is_some_and(|l| l.starts_with(NO_NEWLINE_MARKER)) {
        mark_no_newline(&mut hunk_lines);
        *i += 1;
    }

    Ok(Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
        lines: hunk_lines,
    })
}

fn mark_no_newline(lines: &mut [HunkLine]) {
    if let Some(last) = lines.last_mut() {
        last.no_newline = true;
    }
}
