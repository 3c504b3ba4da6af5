//! Response bodies of the patch endpoints.
//!
//! Every body carries a top-level `status` so callers can branch on it
//! without looking at the HTTP code.

use patchwright_core::status::PatchStatus;
use patchwright_store::models::patch::{PatchListing, PatchRecord};
use patchwright_store::PatchRegistry;
use serde::Serialize;

/// Body of `POST /patches/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: PatchStatus,
    pub id: String,
    pub issue_id: u64,
    pub issue_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_file: Option<String>,
    pub metadata_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    pub files_changed: Vec<String>,
    /// The analysis text the patch was generated from.
    pub specification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GenerateResponse {
    pub fn from_record(registry: &PatchRegistry, record: PatchRecord) -> Self {
        let patch_file = record
            .has_diff()
            .then(|| registry.patch_path(&record.id).display().to_string());
        let metadata_file = registry.metadata_path(&record.id).display().to_string();
        let commit_message = (!record.commit_message.is_empty()).then_some(record.commit_message);
        Self {
            status: record.status,
            id: record.id,
            issue_id: record.source.issue.issue_id,
            issue_title: record.source.issue.title,
            patch_file,
            metadata_file,
            commit_message,
            files_changed: record.files_changed,
            specification: record.source.analysis,
            message: record.message,
        }
    }
}

/// Body of `GET /patches`.
#[derive(Debug, Serialize)]
pub struct PatchListResponse {
    pub status: &'static str,
    pub patches: Vec<PatchListing>,
    /// Number of records in the registry, before pagination.
    pub total_count: usize,
}
