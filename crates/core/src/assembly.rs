//! Patch document assembly.
//!
//! A patch document is a `git format-patch` style mail: header block,
//! description, `---`, diffstat, then one diff section per file in the order
//! the files were first proposed. `git am` and `git apply` both accept it.

use std::fmt::Write as _;

use crate::commit_message::compose;
use crate::diff::FileDiff;
use crate::error::CoreError;
use crate::issue::IssueReference;
use crate::types::Timestamp;

/// Placeholder commit hash on the `From` line (no commit exists yet).
const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

/// Fixed date `git format-patch` writes on the mbox separator line.
const MBOX_MAGIC_DATE: &str = "Mon Sep 17 00:00:00 2001";

pub const PATCH_AUTHOR: &str = "Patchwright <patchwright@localhost>";

/// Widest bar drawn in the diffstat.
const DIFFSTAT_BAR_WIDTH: usize = 50;

/// Assemble the patch document for `diffs`.
///
/// Unchanged diffs are skipped. An empty remainder is a
/// [`CoreError::Validation`]: callers are expected to short-circuit before
/// asking for a patch with nothing in it.
pub fn assemble_patch(
    issue: &IssueReference,
    diffs: &[FileDiff],
    created_at: Timestamp,
) -> Result<String, CoreError> {
    let diffs: Vec<&FileDiff> = diffs.iter().filter(|d| !d.is_unchanged()).collect();
    if diffs.is_empty() {
        return Err(CoreError::Validation(
            "cannot assemble a patch without changed files".into(),
        ));
    }

    let files: Vec<String> = diffs.iter().map(|d| d.path.clone()).collect();
    let message = compose(issue, &files);

    let mut out = String::new();
    let _ = writeln!(out, "From {ZERO_SHA} {MBOX_MAGIC_DATE}");
    let _ = writeln!(out, "From: {PATCH_AUTHOR}");
    let _ = writeln!(out, "Date: {}", created_at.to_rfc2822());
    let _ = writeln!(out, "Subject: [PATCH] {}", message.subject);
    let _ = writeln!(out, "X-Patchwright-Repository: {}/{}", issue.owner, issue.repo);
    let _ = writeln!(out, "X-Patchwright-Issue: {}", issue.issue_id);
    out.push('\n');
    out.push_str(&message.body);
    out.push_str("\n---\n");
    out.push_str(&diffstat(&diffs));
    out.push('\n');
    for diff in diffs {
        out.push_str(&diff.render());
    }
    Ok(out)
}

/// `git diff --stat` style summary.
fn diffstat(diffs: &[&FileDiff]) -> String {
    let name_width = diffs.iter().map(|d| d.path.chars().count()).max().unwrap_or(0);
    let most = diffs
        .iter()
        .map(|d| d.additions + d.deletions)
        .max()
        .unwrap_or(0);
    let count_width = most.to_string().len();

    let mut out = String::new();
    for diff in diffs {
        let total = diff.additions + diff.deletions;
        let (plus, minus) = scale_bar(diff.additions, diff.deletions, most);
        let _ = writeln!(
            out,
            " {:<name_width$} | {:>count_width$} {}{}",
            diff.path,
            total,
            "+".repeat(plus),
            "-".repeat(minus),
        );
    }

    let additions: usize = diffs.iter().map(|d| d.additions).sum();
    let deletions: usize = diffs.iter().map(|d| d.deletions).sum();
    let mut summary = format!(
        " {} file{} changed",
        diffs.len(),
        if diffs.len() == 1 { "" } else { "s" }
    );
    if additions > 0 {
        let _ = write!(
            summary,
            ", {additions} insertion{}(+)",
            if additions == 1 { "" } else { "s" }
        );
    }
    if deletions > 0 {
        let _ = write!(
            summary,
            ", {deletions} deletion{}(-)",
            if deletions == 1 { "" } else { "s" }
        );
    }
    out.push_str(&summary);
    out.push('\n');
    out
}

/// Scale a file's +/- counts so the largest file fits the bar width.
fn scale_bar(additions: usize, deletions: usize, most: usize) -> (usize, usize) {
    if most <= DIFFSTAT_BAR_WIDTH {
        return (additions, deletions);
    }
    let scale = |n: usize| {
        if n == 0 {
            0
        } else {
            (n * DIFFSTAT_BAR_WIDTH / most).max(1)
        }
    };
    (scale(additions), scale(deletions))
}
