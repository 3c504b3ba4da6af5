//! Fetching the current content of repository files.
//!
//! The [`ContentResolver`] trait is the boundary to whatever holds the target
//! repository tree. Implementations must be shareable across tasks and must
//! not mutate shared state while resolving.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::issue::RepoId;
use crate::repo_path::normalize_repo_path;

/// Why content could not be resolved.
///
/// A file that simply does not exist is not an error: resolvers return
/// `Ok(None)` for that.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("content resolution timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("content source unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of current file content for a repository.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Current content of `path` in `repo`, or `None` when the file does not exist.
    async fn resolve(&self, repo: &RepoId, path: &str) -> Result<Option<String>, ResolveError>;
}

// ---------------------------------------------------------------------------
// Snapshot on local disk
// ---------------------------------------------------------------------------

/// Reads files from checked-out snapshots laid out as `<root>/<owner>/<repo>/<path>`.
#[derive(Debug, Clone)]
pub struct SnapshotResolver {
    root: PathBuf,
}

impl SnapshotResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_path(&self, repo: &RepoId, path: &str) -> Result<PathBuf, ResolveError> {
        let relative = normalize_repo_path(path)
            .map_err(|e| ResolveError::Unavailable(format!("refusing path: {e}")))?;
        let mut full = self.root.join(&repo.owner).join(&repo.name);
        full.extend(relative.split('/'));
        Ok(full)
    }
}

#[async_trait]
impl ContentResolver for SnapshotResolver {
    async fn resolve(&self, repo: &RepoId, path: &str) -> Result<Option<String>, ResolveError> {
        let repo_dir = self.root.join(&repo.owner).join(&repo.name);
        if !tokio::fs::try_exists(&repo_dir).await? {
            return Err(ResolveError::Unavailable(format!(
                "no snapshot for {repo} under {}",
                self.root.display()
            )));
        }

        let file = self.file_path(repo, path)?;
        match tokio::fs::read_to_string(&file).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ResolveError::Io(err)),
        }
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Fixed file contents keyed by `(owner/repo, path)`.
///
/// Paths registered with [`InMemoryResolver::with_failure`] fail with
/// [`ResolveError::Unavailable`], which makes degraded runs reproducible.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolver {
    files: HashMap<(String, String), String>,
    failing: HashSet<String>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, repo: &RepoId, path: &str, content: impl Into<String>) -> Self {
        self.files
            .insert((repo.full_name(), path.to_string()), content.into());
        self
    }

    pub fn with_failure(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }
}

#[async_trait]
impl ContentResolver for InMemoryResolver {
    async fn resolve(&self, repo: &RepoId, path: &str) -> Result<Option<String>, ResolveError> {
        if self.failing.contains(path) {
            return Err(ResolveError::Unavailable(format!("{path} is unreachable")));
        }
        Ok(self
            .files
            .get(&(repo.full_name(), path.to_string()))
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Timeout wrapper
// ---------------------------------------------------------------------------

/// Bounds every call of the inner resolver.
#[derive(Debug, Clone)]
pub struct TimeoutResolver<R> {
    inner: R,
    timeout: Duration,
}

impl<R> TimeoutResolver<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<R: ContentResolver> ContentResolver for TimeoutResolver<R> {
    async fn resolve(&self, repo: &RepoId, path: &str) -> Result<Option<String>, ResolveError> {
        match tokio::time::timeout(self.timeout, self.inner.resolve(repo, path)).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::Timeout(self.timeout)),
        }
    }
}
