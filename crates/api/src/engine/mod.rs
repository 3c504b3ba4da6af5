//! Patch generation engine.
//!
//! Drives one generation request from analysis text to a persisted
//! [`PatchRecord`](patchwright_store::models::patch::PatchRecord): parse,
//! resolve, synthesize, assemble, compose, validate, store.

pub mod generation;

pub use generation::{GenerateRequest, GenerationError, PatchEngine};
