//! Applying hunks to file content with a bounded positional search.

use super::Hunk;

/// A hunk could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("hunk {hunk} does not match near line {expected_line} (searched ±{tolerance} lines)")]
    HunkNotFound {
        hunk: usize,
        expected_line: usize,
        tolerance: usize,
    },
}

/// Result of applying every hunk of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPatch {
    pub content: String,
    /// Per hunk, where it landed relative to the line its header claims.
    pub offsets: Vec<isize>,
}

impl AppliedPatch {
    /// Every hunk matched exactly where its header said it would.
    pub fn is_exact(&self) -> bool {
        self.offsets.iter().all(|o| *o == 0)
    }
}

/// Apply `hunks` in order to `original`.
///
/// Each hunk is tried at its claimed position (shifted by the drift of the
/// hunks before it), then at increasing distances up to `tolerance` lines in
/// either direction. Hunks may not overlap a region an earlier hunk consumed.
pub fn apply_hunks(original: &str, hunks: &[Hunk], tolerance: usize) -> Result<AppliedPatch, ApplyError> {
    let lines: Vec<&str> = original.split_inclusive('\n').collect();
    let mut out = String::with_capacity(original.len());
    let mut offsets = Vec::with_capacity(hunks.len());
    let mut cursor = 0usize;
    let mut drift = 0isize;

    for (index, hunk) in hunks.iter().enumerate() {
        let expected: Vec<String> = hunk.old_lines().map(|l| l.raw()).collect();
        let claimed = if hunk.old_count == 0 {
            hunk.old_start
        } else {
            hunk.old_start.saturating_sub(1)
        } as isize;

        let fits = |pos: isize| -> bool {
            if pos < cursor as isize {
                return false;
            }
            let pos = pos as usize;
            pos + expected.len() <= lines.len()
                && expected
                    .iter()
                    .zip(&lines[pos..])
                    .all(|(want, have)| want == have)
        };

        let start = claimed + drift;
        let found = std::iter::once(0isize)
            .chain((1..=tolerance as isize).flat_map(|d| [-d, d]))
            .map(|delta| start + delta)
            .find(|pos| fits(*pos))
            .ok_or(ApplyError::HunkNotFound {
                hunk: index + 1,
                expected_line: (start + 1).max(1) as usize,
                tolerance,
            })?;

        let pos = found as usize;
        for line in &lines[cursor..pos] {
            out.push_str(line);
        }
        for line in hunk.new_lines() {
            out.push_str(&line.raw());
        }
        cursor = pos + expected.len();
        drift = found - claimed;
        offsets.push(drift);
    }

    for line in &lines[cursor..] {
        out.push_str(line);
    }
    Ok(AppliedPatch {
        content: out,
        offsets,
    })
}
