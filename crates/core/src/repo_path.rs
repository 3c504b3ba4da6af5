//! Repository-relative path normalization.
//!
//! Every path that reaches diff synthesis or the content resolver passes
//! through [`normalize_repo_path`], which guarantees the path is non-empty,
//! uses `/` separators, and cannot escape the repository root.

/// Why a candidate path was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path is absolute: {0}")]
    Absolute(String),
    #[error("path escapes the repository root: {0}")]
    EscapesRoot(String),
}

/// Normalize a repository-relative path.
///
/// - Backslashes become `/`.
/// - A leading `./` and empty or `.` segments are dropped.
/// - Absolute paths (leading `/`, `~`, or a drive letter) are refused.
/// - Any `..` segment is refused, even if it would stay inside the root.
pub fn normalize_repo_path(raw: &str) -> Result<String, PathError> {
    let candidate = raw.trim().replace('\\', "/");
    if candidate.is_empty() {
        return Err(PathError::Empty);
    }
    if candidate.starts_with('/') || candidate.starts_with('~') || has_drive_prefix(&candidate) {
        return Err(PathError::Absolute(candidate));
    }

    let mut segments = Vec::new();
    for segment in candidate.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(PathError::EscapesRoot(candidate)),
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(PathError::Empty);
    }
    Ok(segments.join("/"))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
