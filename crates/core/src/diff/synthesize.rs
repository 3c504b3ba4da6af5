//! Original + proposed content to [`FileDiff`].

use std::borrow::Cow;

use super::myers::{diff_slices, Edit};
use super::{ChangeKind, FileDiff, Hunk, HunkLine, LineKind};

/// Unchanged lines kept on each side of a change.
pub const CONTEXT_LINES: usize = 3;

/// Compute the diff of one file.
///
/// `original == None` means the file does not exist yet. Lines keep their
/// terminators while being compared, so a change to the final newline alone
/// still registers as a difference.
pub fn synthesize(path: &str, original: Option<&str>, proposed: &str) -> FileDiff {
    let Some(original) = original else {
        if proposed.is_empty() {
            return FileDiff::unchanged(path);
        }
        return whole_file(path, ChangeKind::Added, proposed);
    };

    if original == proposed {
        return FileDiff::unchanged(path);
    }
    if proposed.is_empty() {
        return whole_file(path, ChangeKind::Deleted, original);
    }

    let old: Vec<&str> = original.split_inclusive('\n').collect();
    let new: Vec<&str> = proposed.split_inclusive('\n').collect();
    let edits = diff_slices(&old, &new);
    let hunks = build_hunks(&old, &new, &edits, CONTEXT_LINES);

    if hunks.is_empty() {
        return FileDiff::unchanged(path);
    }
    let (additions, deletions) = count_changes(&hunks);
    FileDiff {
        path: path.to_string(),
        kind: ChangeKind::Modified,
        hunks,
        additions,
        deletions,
    }
}

/// Rewrite `content` to use CRLF terminators when `reference` does.
///
/// `reference` counts as CRLF when its first line ends in `\r\n`. Content that
/// already carries a `\r` is left alone.
pub fn match_line_endings<'a>(content: &'a str, reference: &str) -> Cow<'a, str> {
    let crlf = reference
        .split_inclusive('\n')
        .next()
        .is_some_and(|line| line.ends_with("\r\n"));
    if crlf && !content.contains('\r') {
        Cow::Owned(content.replace('\n', "\r\n"))
    } else {
        Cow::Borrowed(content)
    }
}

/// A single hunk adding or removing every line of `content`.
fn whole_file(path: &str, kind: ChangeKind, content: &str) -> FileDiff {
    let (line_kind, old_count, new_count) = match kind {
        ChangeKind::Deleted => (LineKind::Removed, content.split_inclusive('\n').count(), 0),
        _ => (LineKind::Added, 0, content.split_inclusive('\n').count()),
    };
    let lines: Vec<HunkLine> = content
        .split_inclusive('\n')
        .map(|raw| HunkLine::from_raw(line_kind, raw))
        .collect();

    let hunk = Hunk {
        old_start: usize::from(old_count > 0),
        old_count,
        new_start: usize::from(new_count > 0),
        new_count,
        lines,
    };
    FileDiff {
        path: path.to_string(),
        kind,
        additions: new_count,
        deletions: old_count,
        hunks: vec![hunk],
    }
}

fn count_changes(hunks: &[Hunk]) -> (usize, usize) {
    hunks
        .iter()
        .flat_map(|h| h.lines.iter())
        .fold((0, 0), |(add, del), line| match line.kind {
            LineKind::Added => (add + 1, del),
            LineKind::Removed => (add, del + 1),
            LineKind::Context => (add, del),
        })
}

/// Group an edit script into hunks with `context` lines on each side.
///
/// Two changes share a hunk when the unchanged run between them is at most
/// `2 * context` lines long, so their context windows overlap or touch.
fn build_hunks(old: &[&str], new: &[&str], edits: &[Edit], context: usize) -> Vec<Hunk> {
    let changes: Vec<usize> = edits
        .iter()
        .enumerate()
        .filter(|(_, e)| !matches!(e, Edit::Equal { .. }))
        .map(|(i, _)| i)
        .collect();
    let Some(&first) = changes.first() else {
        return Vec::new();
    };

    // Position in each file before every edit.
    let mut positions = Vec::with_capacity(edits.len());
    let (mut old_pos, mut new_pos) = (0usize, 0usize);
    for edit in edits {
        positions.push((old_pos, new_pos));
        match edit {
            Edit::Equal { .. } => {
                old_pos += 1;
                new_pos += 1;
            }
            Edit::Delete { .. } => old_pos += 1,
            Edit::Insert { .. } => new_pos += 1,
        }
    }

    let mut groups: Vec<(usize, usize)> = Vec::new();
    let (mut start, mut end) = (first, first);
    for &idx in &changes[1..] {
        if idx - end - 1 <= 2 * context {
            end = idx;
        } else {
            groups.push((start, end));
            start = idx;
            end = idx;
        }
    }
    groups.push((start, end));

    groups
        .into_iter()
        .map(|(first_change, last_change)| {
            let from = first_change.saturating_sub(context);
            let to = (last_change + 1 + context).min(edits.len());
            hunk_from_edits(old, new, &edits[from..to], positions[from])
        })
        .collect()
}

fn hunk_from_edits(old: &[&str], new: &[&str], edits: &[Edit], at: (usize, usize)) -> Hunk {
    let mut lines = Vec::with_capacity(edits.len());
    let (mut old_count, mut new_count) = (0, 0);
    for edit in edits {
        match *edit {
            Edit::Equal { old: o, .. } => {
                lines.push(HunkLine::from_raw(LineKind::Context, old[o]));
                old_count += 1;
                new_count += 1;
            }
            Edit::Delete { old: o } => {
                lines.push(HunkLine::from_raw(LineKind::Removed, old[o]));
                old_count += 1;
            }
            Edit::Insert { new: n } => {
                lines.push(HunkLine::from_raw(LineKind::Added, new[n]));
                new_count += 1;
            }
        }
    }

    // An empty side points at the line before the change.
    let start = |pos: usize, count: usize| if count == 0 { pos } else { pos + 1 };
    Hunk {
        old_start: start(at.0, old_count),
        old_count,
        new_start: start(at.1, new_count),
        new_count,
        lines,
    }
}
