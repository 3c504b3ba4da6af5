//! Dry-run validation of a patch document against current repository content.

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::diff::{apply_hunks, parse_patch, PatchedFile};
use crate::error::CoreError;
use crate::issue::RepoId;
use crate::resolver::ContentResolver;
use crate::status::PatchStatus;

/// Default search window, in lines, on either side of a hunk's claimed position.
pub const DEFAULT_FUZZ_TOLERANCE: usize = 5;

/// Outcome of validating a file or a whole patch.
///
/// Variants are declared from best to worst; aggregation keeps the worst,
/// with an unavailable resolver ranking below a hard conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    AppliesCleanly,
    SoftConflict,
    ResolverUnavailable,
    HardConflict,
}

impl ValidationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppliesCleanly => "applies_cleanly",
            Self::SoftConflict => "soft_conflict",
            Self::ResolverUnavailable => "resolver_unavailable",
            Self::HardConflict => "hard_conflict",
        }
    }

    fn severity(self) -> u8 {
        match self {
            Self::AppliesCleanly => 0,
            Self::SoftConflict => 1,
            Self::ResolverUnavailable => 2,
            Self::HardConflict => 3,
        }
    }

    /// The worse of two outcomes.
    pub fn combine(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Record status implied by this outcome for a non-empty patch.
    pub fn status(self) -> PatchStatus {
        match self {
            Self::AppliesCleanly => PatchStatus::Success,
            Self::SoftConflict | Self::ResolverUnavailable => PatchStatus::Warning,
            Self::HardConflict => PatchStatus::Failed,
        }
    }
}

impl std::fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation result for one file of the patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValidation {
    pub path: String,
    pub outcome: ValidationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Validation result for a whole patch document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    pub files: Vec<FileValidation>,
}

impl ValidationReport {
    /// Human-readable lines for every file that did not apply cleanly.
    pub fn problems(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| f.outcome != ValidationOutcome::AppliesCleanly)
            .map(|f| match &f.detail {
                Some(detail) => format!("{}: {} ({detail})", f.path, f.outcome),
                None => format!("{}: {}", f.path, f.outcome),
            })
            .collect()
    }
}

/// Check that every hunk of `document` would apply to the current content.
///
/// Files are fetched concurrently. A document that cannot be parsed is a
/// [`CoreError::MalformedPatch`]; everything else is reported per file.
pub async fn validate_patch(
    document: &str,
    repo: &RepoId,
    resolver: &dyn ContentResolver,
    tolerance: usize,
) -> Result<ValidationReport, CoreError> {
    let files = parse_patch(document)?;

    let files: Vec<FileValidation> =
        join_all(files.iter().map(|file| validate_file(file, repo, resolver, tolerance))).await;

    let outcome = files
        .iter()
        .map(|f| f.outcome)
        .fold(ValidationOutcome::AppliesCleanly, ValidationOutcome::combine);

    Ok(ValidationReport { outcome, files })
}

async fn validate_file(
    file: &PatchedFile,
    repo: &RepoId,
    resolver: &dyn ContentResolver,
    tolerance: usize,
) -> FileValidation {
    let path = file.path().to_string();
    let result = |outcome, detail: Option<String>| FileValidation {
        path: path.clone(),
        outcome,
        detail,
    };

    let lookup = file.old_path.as_deref().unwrap_or(file.path());
    let current = match resolver.resolve(repo, lookup).await {
        Ok(current) => current,
        Err(err) => {
            tracing::warn!(path = %lookup, error = %err, "Content unavailable during validation");
            return result(ValidationOutcome::ResolverUnavailable, Some(err.to_string()));
        }
    };

    let original = match (file.is_new(), current) {
        (true, Some(_)) => {
            return result(
                ValidationOutcome::HardConflict,
                Some("file already exists".into()),
            )
        }
        (true, None) => String::new(),
        (false, Some(content)) => content,
        (false, None) => {
            return result(
                ValidationOutcome::HardConflict,
                Some("file does not exist".into()),
            )
        }
    };

    match apply_hunks(&original, &file.hunks, tolerance) {
        Ok(applied) if applied.is_exact() => result(ValidationOutcome::AppliesCleanly, None),
        Ok(applied) => {
            let offsets: Vec<String> = applied
                .offsets
                .iter()
                .enumerate()
                .filter(|(_, o)| **o != 0)
                .map(|(i, o)| format!("hunk {} offset {o:+}", i + 1))
                .collect();
            result(ValidationOutcome::SoftConflict, Some(offsets.join(", ")))
        }
        Err(err) => result(ValidationOutcome::HardConflict, Some(err.to_string())),
    }
}
