pub mod analysis;
pub mod assembly;
pub mod commit_message;
pub mod diff;
pub mod error;
pub mod hashing;
pub mod issue;
pub mod repo_path;
pub mod resolver;
pub mod status;
pub mod types;
pub mod validation;
