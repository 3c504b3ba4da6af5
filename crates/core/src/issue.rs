//! Issue and repository identity types.
//!
//! An [`IssueReference`] is supplied by the caller of a generation request and
//! never mutated afterwards. Validation happens once, up front, so malformed
//! identities are rejected before any synthesis work begins.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;

/// Identity of a repository (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// `owner/name` form used in headers and URLs.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The issue a patch is generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct IssueReference {
    #[validate(custom(function = "validate_repo_segment"))]
    pub owner: String,
    #[validate(custom(function = "validate_repo_segment"))]
    pub repo: String,
    #[validate(range(min = 1, message = "issue_id must be a positive integer"))]
    pub issue_id: u64,
    pub title: String,
    pub body: String,
}

impl IssueReference {
    /// Repository identity of this issue.
    pub fn repo_id(&self) -> RepoId {
        RepoId::new(&self.owner, &self.repo)
    }

    /// Check the identity fields, mapping failures to [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|errors| CoreError::Validation(describe_errors(&errors)))
    }
}

/// An owner or repository name must be a single, non-blank path segment.
///
/// The snapshot resolver joins these into filesystem paths, so separators and
/// dot segments are refused here.
fn validate_repo_segment(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    if trimmed != value
        || trimmed.contains(['/', '\\'])
        || trimmed == "."
        || trimmed == ".."
    {
        return Err(ValidationError::new("segment")
            .with_message("must be a single repository path segment".into()));
    }
    Ok(())
}

/// Flatten `validator` errors into a stable `field: message` list.
fn describe_errors(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {msg}")
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn issue(owner: &str, repo: &str, issue_id: u64) -> IssueReference {
        IssueReference {
            owner: owner.to_string(),
            repo: repo.to_string(),
            issue_id,
            title: "Title".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn valid_issue_passes() {
        assert!(issue("psf", "requests", 42).check().is_ok());
    }

    #[test]
    fn zero_issue_id_rejected() {
        let err = issue("psf", "requests", 0).check().unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("issue_id"));
    }

    #[test]
    fn blank_owner_rejected() {
        let err = issue("  ", "requests", 1).check().unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.starts_with("owner"));
    }

    #[test]
    fn owner_with_separator_rejected() {
        assert!(issue("psf/evil", "requests", 1).check().is_err());
        assert!(issue("psf", "..", 1).check().is_err());
    }

    #[test]
    fn repo_id_display() {
        let repo = issue("psf", "requests", 1).repo_id();
        assert_eq!(repo.to_string(), "psf/requests");
        assert_eq!(repo.full_name(), "psf/requests");
    }
}
