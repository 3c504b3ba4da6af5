//! Persisted models.

pub mod patch;
