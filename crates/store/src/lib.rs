//! Durable patch registry.
//!
//! Records live in a flat directory as `<id>.json` (metadata, the source of
//! truth) plus `<id>.patch` (the unified diff) when a diff exists. Every
//! write replaces files atomically.

pub mod atomic;
pub mod error;
pub mod locks;
pub mod models;
pub mod repositories;

use std::path::{Path, PathBuf};

pub use error::StoreError;

use models::patch::{METADATA_EXTENSION, PATCH_EXTENSION};

/// Handle on the registry root directory, fixed at process start.
#[derive(Debug, Clone)]
pub struct PatchRegistry {
    root: PathBuf,
}

impl PatchRegistry {
    /// Open an existing registry directory.
    ///
    /// The directory is not created: a missing root is a deployment error.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            Ok(_) => Err(StoreError::NotADirectory(root)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::MissingRoot(root))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Verify the root is still a usable directory.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let meta = tokio::fs::metadata(&self.root).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StoreError::MissingRoot(self.root.clone())
            } else {
                err.into()
            }
        })?;
        if !meta.is_dir() {
            return Err(StoreError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    pub fn patch_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{PATCH_EXTENSION}"))
    }

    pub fn metadata_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{METADATA_EXTENSION}"))
    }
}
