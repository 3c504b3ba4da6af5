//! Extraction of file-scoped code proposals from free-form analysis text.
//!
//! Analysis text is natural language with fenced code segments sprinkled in.
//! [`scan_segments`] classifies every fenced segment as either a
//! [`ParsedSegment::Proposal`] or a [`ParsedSegment::Ignored`] with a reason,
//! so nothing is dropped silently. [`reconcile`] then folds proposals for the
//! same path according to a [`DuplicatePolicy`]. [`parse`] is the plain entry
//! point: it never fails, and an empty result is a normal outcome.

pub mod fence;
pub mod markers;

use serde::{Deserialize, Serialize};

use crate::repo_path::normalize_repo_path;
use fence::{Block, FencedSegment};
use markers::ProseMarker;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Proposed change for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalContent {
    /// The complete proposed content of the file.
    Full { content: String },
    /// Replace the first occurrence of `before` with `after`.
    Replace { before: String, after: String },
}

/// A (path, proposed content) pair extracted from analysis text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProposal {
    /// Normalized repository-relative path.
    pub path: String,
    pub content: ProposalContent,
    /// 0-based index of the fenced segment this came from.
    pub segment: usize,
    /// 1-based line of the opening fence.
    pub line: usize,
}

/// Why a fenced segment produced no proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IgnoreReason {
    /// No path marker could be associated with the segment.
    NoPathMarker,
    /// The marker named a path that is absolute, empty, or escapes the root.
    UnsafePath { path: String, detail: String },
    /// The segment shows a diff rather than file content.
    DiffSegment,
    /// The fence language does not match the carried path's extension.
    LanguageMismatch { language: String, path: String },
    /// The document ended before the segment was closed.
    Unterminated,
    /// A later segment for the same path replaced this one.
    Superseded { path: String, by_segment: usize },
    /// An earlier segment for the same path was kept instead.
    Duplicate { path: String, kept_segment: usize },
}

/// An auditable record of a segment that was not turned into a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredSegment {
    pub segment: usize,
    pub line: usize,
    #[serde(flatten)]
    pub reason: IgnoreReason,
}

/// Classification of one fenced segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSegment {
    Proposal(FileProposal),
    Ignored(IgnoredSegment),
}

/// How repeated proposals for the same path are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later occurrence's content wins ("before" then "after" blocks).
    #[default]
    LastWins,
    /// The first occurrence is kept; later ones are ignored.
    FirstWins,
}

impl DuplicatePolicy {
    /// Parse a configuration value (`last` / `first`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "last" | "last_wins" | "last-wins" => Some(Self::LastWins),
            "first" | "first_wins" | "first-wins" => Some(Self::FirstWins),
            _ => None,
        }
    }
}

/// Result of parsing: proposals in first-appearance order plus the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisParse {
    pub proposals: Vec<FileProposal>,
    pub ignored: Vec<IgnoredSegment>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Extract proposals using the default (last-wins) policy.
pub fn parse(text: &str) -> Vec<FileProposal> {
    parse_with_policy(text, DuplicatePolicy::default()).proposals
}

/// Extract proposals and the ignored-segment audit trail.
pub fn parse_with_policy(text: &str, policy: DuplicatePolicy) -> AnalysisParse {
    reconcile(scan_segments(text), policy)
}

/// Classify every fenced segment in `text`.
pub fn scan_segments(text: &str) -> Vec<ParsedSegment> {
    let mut carried: Option<String> = None;
    let mut segments = Vec::new();
    let mut index = 0;

    for block in fence::scan(text) {
        match block {
            Block::Prose(line) => match markers::prose_marker(line) {
                ProseMarker::Path(path) => carried = Some(path),
                ProseMarker::Ambiguous(_) => {}
                ProseMarker::None => {
                    if markers::is_heading(line) {
                        carried = None;
                    }
                }
            },
            Block::Fence(segment) => {
                segments.push(classify(index, &segment, &mut carried));
                index += 1;
            }
        }
    }

    segments
}

/// Fold repeated paths according to `policy`, keeping first-appearance order.
pub fn reconcile(segments: Vec<ParsedSegment>, policy: DuplicatePolicy) -> AnalysisParse {
    let mut proposals: Vec<FileProposal> = Vec::new();
    let mut ignored = Vec::new();

    for parsed in segments {
        let proposal = match parsed {
            ParsedSegment::Ignored(seg) => {
                ignored.push(seg);
                continue;
            }
            ParsedSegment::Proposal(p) => p,
        };

        let Some(existing) = proposals.iter_mut().find(|p| p.path == proposal.path) else {
            proposals.push(proposal);
            continue;
        };

        match policy {
            DuplicatePolicy::LastWins => {
                ignored.push(IgnoredSegment {
                    segment: existing.segment,
                    line: existing.line,
                    reason: IgnoreReason::Superseded {
                        path: existing.path.clone(),
                        by_segment: proposal.segment,
                    },
                });
                *existing = proposal;
            }
            DuplicatePolicy::FirstWins => {
                ignored.push(IgnoredSegment {
                    segment: proposal.segment,
                    line: proposal.line,
                    reason: IgnoreReason::Duplicate {
                        path: proposal.path.clone(),
                        kept_segment: existing.segment,
                    },
                });
            }
        }
    }

    ignored.sort_by_key(|seg| seg.segment);
    AnalysisParse { proposals, ignored }
}

// ---------------------------------------------------------------------------
// Segment classification
// ---------------------------------------------------------------------------

fn classify(index: usize, segment: &FencedSegment<'_>, carried: &mut Option<String>) -> ParsedSegment {
    let ignore = |reason| {
        ParsedSegment::Ignored(IgnoredSegment {
            segment: index,
            line: segment.line,
            reason,
        })
    };

    let info = markers::parse_info_string(segment.info);
    let language = info.language.clone().unwrap_or_default();

    if !segment.closed {
        return ignore(IgnoreReason::Unterminated);
    }
    if markers::is_diff_language(&language) {
        return ignore(IgnoreReason::DiffSegment);
    }

    let embedded = first_content_line(&segment.body)
        .and_then(|(i, line)| markers::embedded_marker(line).map(|path| (i, path)));

    let mut body: &[&str] = &segment.body;
    let raw_path = if let Some(path) = info.path {
        path
    } else if let Some((marker_line, path)) = embedded {
        body = &segment.body[marker_line + 1..];
        path
    } else if let Some(path) = carried.clone() {
        if !language.is_empty() && markers::language_conflicts(&language, &path) {
            return ignore(IgnoreReason::LanguageMismatch { language, path });
        }
        path
    } else {
        return ignore(IgnoreReason::NoPathMarker);
    };

    *carried = Some(raw_path.clone());

    let path = match normalize_repo_path(&raw_path) {
        Ok(path) => path,
        Err(err) => {
            return ignore(IgnoreReason::UnsafePath {
                path: raw_path,
                detail: err.to_string(),
            })
        }
    };

    ParsedSegment::Proposal(FileProposal {
        content: split_content(body, &path),
        path,
        segment: index,
        line: segment.line,
    })
}

fn first_content_line<'a>(body: &[&'a str]) -> Option<(usize, &'a str)> {
    body.iter()
        .copied()
        .enumerate()
        .find(|(_, line)| !line.trim().is_empty())
}

/// Turn segment body lines into proposal content.
///
/// A separator line (`---`, or `=>`) splits the body into before/after
/// snippets. An empty "before" means the "after" part is the whole file.
fn split_content(body: &[&str], path: &str) -> ProposalContent {
    let allow_dashes = markers::dash_separator_allowed(path);
    let separator = body.iter().position(|line| {
        let trimmed = line.trim_end();
        trimmed == "=>" || (allow_dashes && trimmed == "---")
    });

    let Some(split) = separator else {
        return ProposalContent::Full {
            content: join_lines(body),
        };
    };

    let before = join_lines(trim_blank_edges(&body[..split]));
    let after = join_lines(trim_blank_edges(&body[split + 1..]));
    if before.is_empty() {
        ProposalContent::Full { content: after }
    } else {
        ProposalContent::Replace { before, after }
    }
}

fn trim_blank_edges<'a, 'b>(lines: &'b [&'a str]) -> &'b [&'a str] {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(start, |i| i + 1);
    &lines[start..end.max(start)]
}

/// Join lines with `\n`, terminating the final line.
fn join_lines(lines: &[&str]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn full(content: &str) -> ProposalContent {
        ProposalContent::Full {
            content: content.to_string(),
        }
    }

    #[test]
    fn text_without_fences_yields_nothing() {
        assert!(parse("The bug is in the URL handling. No code here.").is_empty());
    }

    #[test]
    fn explicit_file_info_string() {
        let text = "Fix:\n```file: utils.py\ndef f():\n    return url.strip()\n```\n";
        let proposals = parse(text);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].path, "utils.py");
        assert_eq!(
            proposals[0].content,
            full("def f():\n    return url.strip()\n")
        );
    }

    #[test]
    fn preceding_prose_marker() {
        let text = "Update `requests/utils.py`:\n\n```python\nx = 1\n```";
        let proposals = parse(text);
        assert_eq!(proposals[0].path, "requests/utils.py");
    }

    #[test]
    fn segment_without_marker_is_ignored_not_an_error() {
        let segments = scan_segments("Example:\n```\nprint('hi')\n```");
        assert_matches!(
            &segments[0],
            ParsedSegment::Ignored(IgnoredSegment {
                reason: IgnoreReason::NoPathMarker,
                ..
            })
        );
    }

    #[test]
    fn embedded_marker_is_stripped_from_content() {
        let text = "```python\n# file: pkg/io.py\nimport os\n```";
        let proposals = parse(text);
        assert_eq!(proposals[0].path, "pkg/io.py");
        assert_eq!(proposals[0].content, full("import os\n"));
    }

    #[test]
    fn last_occurrence_wins_by_default() {
        let text = "### `app.py`\nBefore:\n```python\nold()\n```\nAfter:\n```python\nnew()\n```";
        let parsed = parse_with_policy(text, DuplicatePolicy::LastWins);
        assert_eq!(parsed.proposals.len(), 1);
        assert_eq!(parsed.proposals[0].content, full("new()\n"));
        assert_matches!(
            &parsed.ignored[0].reason,
            IgnoreReason::Superseded { by_segment: 1, .. }
        );
    }

    #[test]
    fn first_wins_policy_keeps_earliest() {
        let text = "### `app.py`\n```python\nold()\n```\n```python\nnew()\n```";
        let parsed = parse_with_policy(text, DuplicatePolicy::FirstWins);
        assert_eq!(parsed.proposals[0].content, full("old()\n"));
        assert_matches!(
            &parsed.ignored[0].reason,
            IgnoreReason::Duplicate { kept_segment: 0, .. }
        );
    }

    #[test]
    fn order_is_first_appearance() {
        let text = "```file: b.py\n1\n```\n```file: a.py\n2\n```\n```file: b.py\n3\n```";
        let paths: Vec<_> = parse(text).into_iter().map(|p| p.path).collect();
        assert_eq!(paths, vec!["b.py", "a.py"]);
    }

    #[test]
    fn heading_without_marker_resets_carried_path() {
        let text = "### `app.py`\n```python\nx = 1\n```\n## Testing\n```\npytest\n```";
        let parsed = parse_with_policy(text, DuplicatePolicy::LastWins);
        assert_eq!(parsed.proposals.len(), 1);
        assert_eq!(parsed.ignored.len(), 1);
        assert_eq!(parsed.ignored[0].reason, IgnoreReason::NoPathMarker);
    }

    #[test]
    fn shell_block_under_python_marker_is_ignored() {
        let text = "In `app.py`:\n```python\nx = 1\n```\nRun:\n```bash\npytest -q\n```";
        let parsed = parse_with_policy(text, DuplicatePolicy::LastWins);
        assert_eq!(parsed.proposals.len(), 1);
        assert_eq!(parsed.proposals[0].content, full("x = 1\n"));
        assert_matches!(
            &parsed.ignored[0].reason,
            IgnoreReason::LanguageMismatch { language, .. } if language == "bash"
        );
    }

    #[test]
    fn diff_segments_are_ignored() {
        let segments = scan_segments("```diff\n-a\n+b\n```");
        assert_matches!(
            &segments[0],
            ParsedSegment::Ignored(IgnoredSegment {
                reason: IgnoreReason::DiffSegment,
                ..
            })
        );
    }

    #[test]
    fn escaping_paths_are_ignored() {
        let segments = scan_segments("```file: ../../etc/passwd.txt\nroot\n```");
        assert_matches!(
            &segments[0],
            ParsedSegment::Ignored(IgnoredSegment {
                reason: IgnoreReason::UnsafePath { .. },
                ..
            })
        );
    }

    #[test]
    fn before_after_separator_yields_replace() {
        let text = "```file: utils.py\n    return url\n---\n    return url.strip()\n```";
        let proposals = parse(text);
        assert_eq!(
            proposals[0].content,
            ProposalContent::Replace {
                before: "    return url\n".into(),
                after: "    return url.strip()\n".into(),
            }
        );
    }

    #[test]
    fn empty_before_means_new_file() {
        let text = "```file: docs/new.py\n---\nprint('new')\n```";
        assert_eq!(parse(text)[0].content, full("print('new')\n"));
    }

    #[test]
    fn yaml_document_separator_is_content() {
        let text = "```file: ci/config.yaml\n---\nkey: value\n```";
        assert_eq!(parse(text)[0].content, full("---\nkey: value\n"));
    }

    #[test]
    fn unterminated_segment_is_ignored() {
        let segments = scan_segments("```file: a.py\nx = 1\n");
        assert_matches!(
            &segments[0],
            ParsedSegment::Ignored(IgnoredSegment {
                reason: IgnoreReason::Unterminated,
                ..
            })
        );
    }

    #[test]
    fn duplicate_policy_names() {
        assert_eq!(DuplicatePolicy::from_name("last"), Some(DuplicatePolicy::LastWins));
        assert_eq!(DuplicatePolicy::from_name("FIRST"), Some(DuplicatePolicy::FirstWins));
        assert_eq!(DuplicatePolicy::from_name("random"), None);
    }
}
