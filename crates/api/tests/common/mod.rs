#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use patchwright_api::config::ServerConfig;
use patchwright_api::engine::PatchEngine;
use patchwright_api::router::build_app_router;
use patchwright_api::state::AppState;
use patchwright_core::analysis::DuplicatePolicy;
use patchwright_core::issue::RepoId;
use patchwright_core::resolver::{ContentResolver, InMemoryResolver};
use patchwright_core::validation::DEFAULT_FUZZ_TOLERANCE;
use patchwright_store::PatchRegistry;

/// Build a test `ServerConfig` pointing at `patches_dir`.
pub fn test_config(patches_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        patches_dir,
        repo_snapshot_dir: PathBuf::from("./repos"),
        resolver_timeout_ms: 5000,
        fuzz_tolerance: DEFAULT_FUZZ_TOLERANCE,
        duplicate_policy: DuplicatePolicy::LastWins,
    }
}

/// A test application backed by a temporary registry.
///
/// Keep the struct alive for the duration of the test: dropping it removes
/// the registry directory.
pub struct TestApp {
    pub dir: tempfile::TempDir,
    pub registry: PatchRegistry,
    pub router: Router,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router over `resolver`, with the same
/// middleware stack production uses.
pub fn build_test_app(resolver: impl ContentResolver + 'static) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path().to_path_buf());
    let registry = PatchRegistry::open(dir.path()).unwrap();
    let engine = PatchEngine::new(registry.clone(), Arc::new(resolver))
        .with_fuzz_tolerance(config.fuzz_tolerance)
        .with_duplicate_policy(config.duplicate_policy);
    let router = build_app_router(AppState::new(engine, config.clone()), &config);
    TestApp {
        dir,
        registry,
        router,
    }
}

/// The repository every test request targets.
pub fn repo() -> RepoId {
    RepoId::new("psf", "requests")
}

/// An in-memory resolver holding `files` for [`repo`].
pub fn resolver_with(files: &[(&str, &str)]) -> InMemoryResolver {
    files
        .iter()
        .fold(InMemoryResolver::new(), |resolver, (path, content)| {
            resolver.with_file(&repo(), path, *content)
        })
}

/// A generation request body for [`repo`].
pub fn generate_body(issue_id: u64, analysis: &str) -> serde_json::Value {
    serde_json::json!({
        "owner": "psf",
        "repo": "requests",
        "issue_id": issue_id,
        "issue_title": "Strip whitespace from URLs",
        "issue_body": "Leading spaces in URLs break requests. Seen on 2.31.",
        "analysis": analysis,
    })
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
