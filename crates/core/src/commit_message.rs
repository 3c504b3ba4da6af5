//! Commit message composition.
//!
//! Pure and deterministic: identical inputs always produce identical output,
//! so regenerating a patch for the same issue yields the same message.

use serde::{Deserialize, Serialize};

use crate::issue::IssueReference;

/// Conventional upper bound for a subject line.
pub const SUBJECT_MAX_CHARS: usize = 72;

/// Column at which body paragraphs are wrapped.
pub const BODY_WRAP_COLUMN: usize = 72;

/// Upper bound on the summary sentence taken from the issue body.
const SUMMARY_MAX_CHARS: usize = 280;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage {
    pub subject: String,
    pub body: String,
}

impl CommitMessage {
    /// Subject and body separated by a blank line.
    pub fn to_text(&self) -> String {
        if self.body.is_empty() {
            self.subject.clone()
        } else {
            format!("{}\n\n{}", self.subject, self.body)
        }
    }
}

impl std::fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Compose the commit message for a patch touching `files_changed`.
pub fn compose(issue: &IssueReference, files_changed: &[String]) -> CommitMessage {
    CommitMessage {
        subject: subject_line(issue),
        body: body_text(issue, files_changed),
    }
}

/// `Fix #<id>: <title>`, whitespace collapsed and bounded to 72 characters.
pub fn subject_line(issue: &IssueReference) -> String {
    let title = collapse_whitespace(&issue.title);
    let subject = if title.is_empty() {
        format!("Fix #{}", issue.issue_id)
    } else {
        format!("Fix #{}: {}", issue.issue_id, title)
    };
    truncate_chars(&subject, SUBJECT_MAX_CHARS)
}

fn body_text(issue: &IssueReference, files_changed: &[String]) -> String {
    let mut sections = Vec::new();

    if let Some(summary) = first_sentence(&issue.body) {
        sections.push(wrap(&summary, BODY_WRAP_COLUMN));
    }

    if !files_changed.is_empty() {
        let mut list = String::from("Files changed:");
        for path in files_changed {
            list.push_str("\n- ");
            list.push_str(path);
        }
        sections.push(list);
    }

    sections.push(format!(
        "Fixes: https://github.com/{}/{}/issues/{}",
        issue.owner, issue.repo, issue.issue_id
    ));
    sections.join("\n\n")
}

/// First sentence of the first prose paragraph of `body`.
///
/// Headings, fenced code and quoted lines are skipped.
pub fn first_sentence(body: &str) -> Option<String> {
    let mut in_fence = false;
    let mut paragraph: Vec<&str> = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }
        if in_fence {
            continue;
        }
        if trimmed.is_empty() {
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with('>') || trimmed.starts_with("<!--") {
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }
        paragraph.push(trimmed);
    }

    let text = collapse_whitespace(&paragraph.join(" "));
    if text.is_empty() {
        return None;
    }

    let end = text
        .char_indices()
        .zip(text.chars().skip(1).chain(std::iter::once(' ')))
        .find(|((_, c), next)| matches!(c, '.' | '!' | '?') && next.is_whitespace())
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(text.len());

    Some(truncate_chars(&text[..end], SUMMARY_MAX_CHARS))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max - ELLIPSIS.len();
    let head: String = text.chars().take(keep).collect();
    format!("{}{ELLIPSIS}", head.trim_end())
}

/// Greedy word wrap.
fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if !current.is_empty() && needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(title: &str, body: &str) -> IssueReference {
        IssueReference {
            owner: "psf".into(),
            repo: "requests".into(),
            issue_id: 42,
            title: title.into(),
            body: body.into(),
        }
    }

    #[test]
    fn subject_has_issue_prefix() {
        let msg = compose(&issue("Strip URLs", ""), &["utils.py".into()]);
        assert_eq!(msg.subject, "Fix #42: Strip URLs");
    }

    #[test]
    fn long_title_is_truncated_to_bound() {
        let title = "word ".repeat(40);
        let subject = subject_line(&issue(&title, ""));
        assert!(subject.chars().count() <= SUBJECT_MAX_CHARS);
        assert!(subject.ends_with("..."));
        assert!(subject.starts_with("Fix #42: word word"));
    }

    #[test]
    fn title_whitespace_is_collapsed() {
        assert_eq!(
            subject_line(&issue("  Leading\n\tand   inner  ", "")),
            "Fix #42: Leading and inner"
        );
    }

    #[test]
    fn body_lists_files_and_trailer() {
        let msg = compose(
            &issue("t", "URLs with whitespace break requests. More detail here."),
            &["utils.py".into(), "models.py".into()],
        );
        assert_eq!(
            msg.body,
            "URLs with whitespace break requests.\n\n\
             Files changed:\n- utils.py\n- models.py\n\n\
             Fixes: https://github.com/psf/requests/issues/42"
        );
    }

    #[test]
    fn first_sentence_skips_headings_and_code() {
        let body = "## Description\n\n```\ntrace\n```\nThe session\nleaks sockets! Then more.";
        assert_eq!(
            first_sentence(body).as_deref(),
            Some("The session leaks sockets!")
        );
        assert_eq!(first_sentence("## Only a heading"), None);
    }

    #[test]
    fn decimal_points_do_not_end_sentences() {
        assert_eq!(
            first_sentence("Version 2.3 fails on startup").as_deref(),
            Some("Version 2.3 fails on startup")
        );
    }

    #[test]
    fn long_summary_is_wrapped() {
        let body = "a ".repeat(100);
        let msg = compose(&issue("t", &body), &[]);
        let summary = msg.body.split("\n\n").next().unwrap();
        assert!(summary.lines().all(|l| l.chars().count() <= BODY_WRAP_COLUMN));
        assert!(summary.lines().count() > 1);
    }

    #[test]
    fn composition_is_deterministic() {
        let i = issue("Title", "Body text.");
        let files = vec!["a.py".to_string()];
        assert_eq!(compose(&i, &files), compose(&i, &files));
        assert_eq!(compose(&i, &files).to_text(), compose(&i, &files).to_string());
    }
}
