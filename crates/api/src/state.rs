use std::sync::Arc;

use patchwright_store::PatchRegistry;

use crate::config::ServerConfig;
use crate::engine::PatchEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Registry read directly by the list/get handlers.
    pub registry: PatchRegistry,
    /// Generation engine (resolver, per-id locks, validation settings).
    pub engine: Arc<PatchEngine>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(engine: PatchEngine, config: ServerConfig) -> Self {
        Self {
            registry: engine.registry().clone(),
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}
