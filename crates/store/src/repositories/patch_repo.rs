//! Repository for patch records.
//!
//! Writes go `.patch` first, then `.json`. The metadata file carries the
//! diff text as well, so a reader that sees a new `.json` never depends on
//! the `.patch` beside it. If the metadata write fails, the previous
//! `.patch` is put back so the pair keeps matching.

use std::path::Path;

use crate::atomic::{remove_if_exists, write_atomic, TEMP_PREFIX};
use crate::error::StoreError;
use crate::models::patch::{is_valid_id, PatchListing, PatchRecord, METADATA_EXTENSION};
use crate::PatchRegistry;

/// Provides keyed access to patch records.
pub struct PatchRepo;

impl PatchRepo {
    /// Insert or replace the record with `record.id`.
    ///
    /// Callers serialize writers of the same id; concurrent writers of
    /// different ids never touch the same files.
    pub async fn put(registry: &PatchRegistry, record: &PatchRecord) -> Result<(), StoreError> {
        if !is_valid_id(&record.id) {
            return Err(StoreError::InvalidId(record.id.clone()));
        }

        let patch_path = registry.patch_path(&record.id);
        let previous = read_if_exists(&patch_path).await?;
        if record.has_diff() {
            write_atomic(patch_path.clone(), record.diff_content.clone().into_bytes()).await?;
        } else if previous.is_some() {
            remove_if_exists(&patch_path).await?;
            tracing::debug!(patch_id = %record.id, "Removed stale patch file");
        }

        let written = match serde_json::to_vec_pretty(record) {
            Ok(json) => write_atomic(registry.metadata_path(&record.id), json).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = written {
            let restored = match previous {
                Some(bytes) => write_atomic(patch_path, bytes).await,
                None => remove_if_exists(&patch_path).await.map(|_| ()),
            };
            if let Err(restore_err) = restored {
                tracing::error!(
                    patch_id = %record.id,
                    error = %restore_err,
                    "Failed to restore previous patch file",
                );
            }
            return Err(err);
        }

        tracing::info!(
            patch_id = %record.id,
            status = %record.status,
            files = record.files_changed.len(),
            "Patch record written",
        );
        Ok(())
    }

    /// Find a record by id.
    pub async fn find_by_id(
        registry: &PatchRegistry,
        id: &str,
    ) -> Result<Option<PatchRecord>, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        match tokio::fs::read(registry.metadata_path(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// List every record, newest first (ties broken by id).
    ///
    /// Unreadable metadata files are logged and skipped so one corrupt entry
    /// does not hide the rest of the registry.
    pub async fn list(registry: &PatchRegistry) -> Result<Vec<PatchListing>, StoreError> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(registry.root()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(stem) = name.strip_suffix(&format!(".{METADATA_EXTENSION}")) else {
                continue;
            };
            if name.starts_with(TEMP_PREFIX) || !is_valid_id(stem) {
                continue;
            }

            let parsed = match tokio::fs::read(entry.path()).await {
                Ok(bytes) => serde_json::from_slice::<PatchRecord>(&bytes).map_err(StoreError::from),
                Err(err) => Err(err.into()),
            };
            match parsed {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(file = %name, error = %err, "Skipping unreadable patch metadata");
                }
            }
        }

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut listings = Vec::with_capacity(records.len());
        for record in records {
            listings.push(Self::listing(registry, &record).await);
        }
        Ok(listings)
    }

    /// Listing entry for a record: its patch file when it has one.
    pub async fn listing(registry: &PatchRegistry, record: &PatchRecord) -> PatchListing {
        let path = if record.has_diff() {
            registry.patch_path(&record.id)
        } else {
            registry.metadata_path(&record.id)
        };
        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(_) => record.diff_content.len() as u64,
        };
        PatchListing {
            name: record.file_name(),
            path: path.display().to_string(),
            size,
            created: record.created_at,
            metadata: record.summary(),
        }
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
