//! Patch record and listing models.

use serde::{Deserialize, Serialize};
use patchwright_core::analysis::IgnoredSegment;
use patchwright_core::diff::ChangeKind;
use patchwright_core::hashing::short_digest;
use patchwright_core::issue::IssueReference;
use patchwright_core::status::PatchStatus;
use patchwright_core::types::Timestamp;
use patchwright_core::validation::ValidationReport;

/// Extension of the unified-diff file.
pub const PATCH_EXTENSION: &str = "patch";
/// Extension of the metadata file (the source of truth).
pub const METADATA_EXTENSION: &str = "json";

/// Hex characters of the identity digest appended to every id.
const ID_HASH_LEN: usize = 8;

/// What the record was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSource {
    pub issue: IssueReference,
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// How the current content of a proposed file was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    /// Existing content was fetched.
    Resolved,
    /// The file does not exist yet.
    Absent,
    /// The content source failed or timed out.
    Unavailable,
}

/// Per-file audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub resolution: ResolutionState,
    /// `None` when the file was skipped before synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<ChangeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A persisted generation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub id: String,
    pub status: PatchStatus,
    pub files_changed: Vec<String>,
    /// Full patch document; empty when nothing was generated.
    pub diff_content: String,
    /// Subject and body; empty for `not_generated` and `failed`.
    pub commit_message: String,
    pub created_at: Timestamp,
    pub source: PatchSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    #[serde(default)]
    pub files: Vec<FileReport>,
    #[serde(default)]
    pub ignored_segments: Vec<IgnoredSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_sha256: Option<String>,
}

impl PatchRecord {
    pub fn has_diff(&self) -> bool {
        !self.diff_content.is_empty()
    }

    /// Name the record is listed under: the patch file when there is one.
    pub fn file_name(&self) -> String {
        let ext = if self.has_diff() {
            PATCH_EXTENSION
        } else {
            METADATA_EXTENSION
        };
        format!("{}.{ext}", self.id)
    }

    pub fn summary(&self) -> PatchSummary {
        let issue = &self.source.issue;
        PatchSummary {
            id: self.id.clone(),
            status: self.status,
            owner: issue.owner.clone(),
            repo: issue.repo.clone(),
            issue_id: issue.issue_id,
            issue_title: issue.title.clone(),
            files_changed: self.files_changed.clone(),
            created_at: self.created_at,
            message: self.message.clone(),
        }
    }
}

/// Metadata shown in listings (no diff text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSummary {
    pub id: String,
    pub status: PatchStatus,
    pub owner: String,
    pub repo: String,
    pub issue_id: u64,
    pub issue_title: String,
    pub files_changed: Vec<String>,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One entry of a registry listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchListing {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub created: Timestamp,
    pub metadata: PatchSummary,
}

/// Deterministic registry id for an issue.
///
/// `<owner>-<repo>-issue-<n>-<hash8>`: the readable prefix is lowercased and
/// reduced to `[a-z0-9._-]`; the digest of the exact `owner/repo#n` identity
/// keeps ids distinct when sanitizing makes two prefixes collide.
pub fn patch_id(owner: &str, repo: &str, issue_id: u64) -> String {
    let identity = format!("{owner}/{repo}#{issue_id}").to_lowercase();
    format!(
        "{}-{}-issue-{issue_id}-{}",
        sanitize_segment(owner),
        sanitize_segment(repo),
        short_digest(identity, ID_HASH_LEN)
    )
}

fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(['-', '.']);
    if cleaned.is_empty() {
        "x".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Whether `id` is safe to use as a registry file stem.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
}
