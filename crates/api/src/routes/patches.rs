//! Route definitions for patch generation and retrieval.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::patches;
use crate::state::AppState;

/// Patch routes mounted at `/patches`.
///
/// ```text
/// POST   /generate          -> generate_patch
/// GET    /                  -> list_patches
/// GET    /{name}            -> get_patch
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(patches::list_patches))
        .route("/generate", post(patches::generate_patch))
        .route("/{name}", get(patches::get_patch))
}
