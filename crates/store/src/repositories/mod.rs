//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async operations that
//! accept `&PatchRegistry` as the first argument.

pub mod patch_repo;

pub use patch_repo::PatchRepo;
