use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Registry root does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("Registry root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid patch id: {0}")]
    InvalidId(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
