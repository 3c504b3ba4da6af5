//! One generation request, end to end.
//!
//! The registry id is locked for the whole run, from resolution through the
//! final write, so two requests for the same issue never interleave. Requests
//! for different issues share nothing but the resolver and the registry root.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use patchwright_core::analysis::{parse_with_policy, DuplicatePolicy, FileProposal, ProposalContent};
use patchwright_core::assembly::assemble_patch;
use patchwright_core::commit_message::compose;
use patchwright_core::diff::{match_line_endings, synthesize, FileDiff};
use patchwright_core::error::CoreError;
use patchwright_core::hashing::sha256_hex;
use patchwright_core::issue::IssueReference;
use patchwright_core::resolver::{ContentResolver, ResolveError};
use patchwright_core::status::PatchStatus;
use patchwright_core::validation::{validate_patch, DEFAULT_FUZZ_TOLERANCE};
use patchwright_store::locks::KeyedLocks;
use patchwright_store::models::patch::{
    patch_id, FileReport, PatchRecord, PatchSource, ResolutionState,
};
use patchwright_store::repositories::PatchRepo;
use patchwright_store::{PatchRegistry, StoreError};

/// Errors that abort a generation request.
///
/// Everything else (no proposals, unreachable content, conflicts) is recorded
/// on the [`PatchRecord`] as a status.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input of a generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub issue: IssueReference,
    pub analysis: String,
    pub query: Option<String>,
}

/// Turns analysis text into persisted patch records.
#[derive(Clone)]
pub struct PatchEngine {
    registry: PatchRegistry,
    resolver: Arc<dyn ContentResolver>,
    locks: KeyedLocks,
    fuzz_tolerance: usize,
    duplicate_policy: DuplicatePolicy,
}

impl PatchEngine {
    pub fn new(registry: PatchRegistry, resolver: Arc<dyn ContentResolver>) -> Self {
        Self {
            registry,
            resolver,
            locks: KeyedLocks::new(),
            fuzz_tolerance: DEFAULT_FUZZ_TOLERANCE,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_fuzz_tolerance(mut self, tolerance: usize) -> Self {
        self.fuzz_tolerance = tolerance;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn registry(&self) -> &PatchRegistry {
        &self.registry
    }

    /// Generate, validate and store the patch for `request.issue`.
    ///
    /// Malformed issue identities are rejected before any work starts.
    /// Only a failed registry write aborts the request once it has begun.
    pub async fn generate(&self, request: GenerateRequest) -> Result<PatchRecord, GenerationError> {
        let GenerateRequest {
            issue,
            analysis,
            query,
        } = request;
        issue.check()?;

        let id = patch_id(&issue.owner, &issue.repo, issue.issue_id);
        let parsed = parse_with_policy(&analysis, self.duplicate_policy);
        tracing::info!(
            patch_id = %id,
            proposals = parsed.proposals.len(),
            ignored = parsed.ignored.len(),
            "Analysis parsed",
        );

        let _guard = self.locks.lock(&id).await;

        let created_at = Utc::now();
        let mut record = PatchRecord {
            id,
            status: PatchStatus::NotGenerated,
            files_changed: Vec::new(),
            diff_content: String::new(),
            commit_message: String::new(),
            created_at,
            source: PatchSource {
                issue: issue.clone(),
                analysis,
                query,
            },
            message: None,
            validation: None,
            files: Vec::new(),
            ignored_segments: parsed.ignored,
            diff_sha256: None,
        };

        if parsed.proposals.is_empty() {
            record.message = Some("No file proposals found in analysis".into());
            return self.store(record).await;
        }

        // --- Resolve and synthesize ---
        let repo = issue.repo_id();
        let resolutions = join_all(
            parsed
                .proposals
                .iter()
                .map(|proposal| self.resolver.resolve(&repo, &proposal.path)),
        )
        .await;

        let mut diffs = Vec::new();
        for (proposal, resolved) in parsed.proposals.iter().zip(resolutions) {
            let (report, diff) = synthesize_file(proposal, resolved);
            record.files.push(report);
            diffs.extend(diff);
        }

        let mut notes: Vec<String> = record
            .files
            .iter()
            .filter(|file| file.change.is_none())
            .map(|file| format!("{}: {}", file.path, file.note.as_deref().unwrap_or("skipped")))
            .collect();
        let degraded = !notes.is_empty();

        if diffs.is_empty() {
            if degraded {
                record.status = PatchStatus::Failed;
                record.message = Some(format!("No usable diff was produced ({})", notes.join("; ")));
            } else {
                record.message = Some("Every proposed file matches its current content".into());
            }
            return self.store(record).await;
        }

        // --- Assemble ---
        record.files_changed = diffs.iter().map(|diff| diff.path.clone()).collect();
        let document = assemble_patch(&issue, &diffs, created_at)
            .map_err(|err| CoreError::Internal(format!("patch assembly failed: {err}")))?;

        // --- Validate ---
        let mut status = match validate_patch(
            &document,
            &repo,
            self.resolver.as_ref(),
            self.fuzz_tolerance,
        )
        .await
        {
            Ok(report) => {
                notes.extend(report.problems());
                let status = report.outcome.status();
                record.validation = Some(report);
                status
            }
            Err(err) => {
                tracing::error!(patch_id = %record.id, error = %err, "Assembled patch did not re-parse");
                notes.push(err.to_string());
                PatchStatus::Failed
            }
        };
        if degraded {
            status = status.degrade();
        }

        record.status = status;
        if status != PatchStatus::Failed {
            record.commit_message = compose(&issue, &record.files_changed).to_text();
        }
        record.diff_sha256 = Some(sha256_hex(&document));
        record.diff_content = document;
        if !notes.is_empty() {
            record.message = Some(notes.join("; "));
        }

        self.store(record).await
    }

    async fn store(&self, record: PatchRecord) -> Result<PatchRecord, GenerationError> {
        PatchRepo::put(&self.registry, &record).await?;
        tracing::info!(
            patch_id = %record.id,
            status = %record.status,
            files = record.files_changed.len(),
            message = record.message.as_deref().unwrap_or_default(),
            "Generation finished",
        );
        Ok(record)
    }
}

/// Turn one proposal and its resolved content into an audit entry and,
/// when something changes, a diff.
fn synthesize_file(
    proposal: &FileProposal,
    resolved: Result<Option<String>, ResolveError>,
) -> (FileReport, Option<FileDiff>) {
    let path = proposal.path.clone();
    let current = match resolved {
        Ok(current) => current,
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "Content resolution failed, skipping file");
            let report = FileReport {
                path,
                resolution: ResolutionState::Unavailable,
                change: None,
                note: Some(err.to_string()),
            };
            return (report, None);
        }
    };
    let resolution = if current.is_some() {
        ResolutionState::Resolved
    } else {
        ResolutionState::Absent
    };
    let skipped = |path: String, note: &str| -> (FileReport, Option<FileDiff>) {
        tracing::warn!(path = %path, note, "Skipping proposal");
        let report = FileReport {
            path,
            resolution,
            change: None,
            note: Some(note.to_string()),
        };
        (report, None)
    };

    let proposed = match (&proposal.content, current.as_deref()) {
        (ProposalContent::Full { content }, None) => content.clone(),
        (ProposalContent::Full { content }, Some(text)) => {
            match_line_endings(content, text).into_owned()
        }
        (ProposalContent::Replace { before, after }, Some(text)) => {
            let before = match_line_endings(before, text);
            if before.is_empty() || !text.contains(&*before) {
                return skipped(path, "replacement target not found in current content");
            }
            text.replacen(&*before, &match_line_endings(after, text), 1)
        }
        (ProposalContent::Replace { .. }, None) => {
            return skipped(path, "replacement target file does not exist")
        }
    };

    let diff = synthesize(&path, current.as_deref(), &proposed);
    let report = FileReport {
        path,
        resolution,
        change: Some(diff.kind),
        note: diff
            .is_unchanged()
            .then(|| "proposed content matches current content".to_string()),
    };
    let diff = (!diff.is_unchanged()).then_some(diff);
    (report, diff)
}
