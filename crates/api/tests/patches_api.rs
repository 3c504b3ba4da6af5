//! HTTP-level integration tests for the patch endpoints.
//!
//! Covers:
//! - End-to-end generation: modified file, no proposals, new file
//! - No-op filtering and last-write-wins regeneration
//! - Status degradation when content cannot be resolved
//! - Input validation (400), unknown patches (404), storage failures (500)
//! - Listing, pagination and lookup by id or file name

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, generate_body, get, post_json, post_raw, resolver_with};
use patchwright_core::diff::apply_hunks;
use patchwright_core::diff::parse_patch;
use patchwright_core::resolver::InMemoryResolver;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const UTILS_ORIGINAL: &str = "def f():\n    return url\n";

const UTILS_ANALYSIS: &str = "\
The URL keeps its surrounding whitespace.

File: `utils.py`
```python
def f():
    return url.strip()
```
";

async fn generate(test: &common::TestApp, issue_id: u64, analysis: &str) -> serde_json::Value {
    let response = post_json(test.app(), "/patches/generate", generate_body(issue_id, analysis)).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn fetch(test: &common::TestApp, name: &str) -> serde_json::Value {
    let response = get(test.app(), &format!("/patches/{name}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Generation scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn modified_file_generates_successful_patch() {
    let test = build_test_app(resolver_with(&[("utils.py", UTILS_ORIGINAL)]));

    let json = generate(&test, 42, UTILS_ANALYSIS).await;

    assert_eq!(json["status"], "success");
    assert_eq!(json["issue_id"], 42);
    assert_eq!(json["files_changed"], serde_json::json!(["utils.py"]));
    assert_eq!(json["specification"], UTILS_ANALYSIS);
    assert!(json["commit_message"].as_str().unwrap().starts_with("Fix #42: "));
    assert!(json.get("message").is_none());

    let patch_file = json["patch_file"].as_str().unwrap();
    let document = std::fs::read_to_string(patch_file).unwrap();
    let files = parse_patch(&document).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].hunks.len(), 1);
    assert!(document.contains("-    return url\n+    return url.strip()\n"));

    let applied = apply_hunks(UTILS_ORIGINAL, &files[0].hunks, 0).unwrap();
    assert_eq!(applied.content, "def f():\n    return url.strip()\n");
}

#[tokio::test]
async fn analysis_without_code_is_not_generated() {
    let test = build_test_app(InMemoryResolver::new());

    let json = generate(&test, 7, "The failure comes from URL parsing; no fix is proposed.").await;

    assert_eq!(json["status"], "not_generated");
    assert_eq!(json["files_changed"], serde_json::json!([]));
    assert!(json.get("patch_file").is_none());
    assert!(json.get("commit_message").is_none());

    let record = fetch(&test, json["id"].as_str().unwrap()).await;
    assert_eq!(record["diff_content"], "");
    assert_eq!(record["status"], "not_generated");
}

#[tokio::test]
async fn unresolvable_file_is_added() {
    let test = build_test_app(InMemoryResolver::new());
    let analysis = "Add a helper module.\n\n```file: requests/_strip.py\ndef strip(url):\n    return url.strip()\n```\n";

    let json = generate(&test, 8, analysis).await;
    assert_eq!(json["status"], "success");

    let record = fetch(&test, json["id"].as_str().unwrap()).await;
    assert_eq!(record["files"][0]["change"], "added");
    assert_eq!(record["files"][0]["resolution"], "absent");
    let diff = record["diff_content"].as_str().unwrap();
    assert!(diff.contains("--- /dev/null\n+++ b/requests/_strip.py\n@@ -0,0 +1,2 @@\n"));
}

#[tokio::test]
async fn unchanged_proposals_never_reach_the_patch() {
    let test = build_test_app(resolver_with(&[
        ("utils.py", UTILS_ORIGINAL),
        ("setup.py", "setup()\n"),
    ]));
    let analysis = format!("{UTILS_ANALYSIS}\nNo change needed here:\n```file: setup.py\nsetup()\n```\n");

    let json = generate(&test, 9, &analysis).await;

    assert_eq!(json["files_changed"], serde_json::json!(["utils.py"]));
    let record = fetch(&test, json["id"].as_str().unwrap()).await;
    assert!(!record["diff_content"].as_str().unwrap().contains("setup.py"));
}

#[tokio::test]
async fn resolver_failure_is_never_success() {
    let resolver = resolver_with(&[("utils.py", UTILS_ORIGINAL)]).with_failure("adapters.py");
    let test = build_test_app(resolver);
    let analysis = format!("{UTILS_ANALYSIS}\n```file: adapters.py\nx = 1\n```\n");

    let json = generate(&test, 10, &analysis).await;

    assert_eq!(json["status"], "warning");
    assert_eq!(json["files_changed"], serde_json::json!(["utils.py"]));
    assert!(json["message"].as_str().unwrap().contains("adapters.py"));
}

#[tokio::test]
async fn regeneration_keeps_one_record_with_latest_content() {
    let test = build_test_app(resolver_with(&[("utils.py", UTILS_ORIGINAL)]));

    let first = generate(&test, 11, "Nothing to change yet.").await;
    let second = generate(&test, 11, UTILS_ANALYSIS).await;
    assert_eq!(first["id"], second["id"]);

    let listing = body_json(get(test.app(), "/patches").await).await;
    assert_eq!(listing["total_count"], 1);

    let record = fetch(&test, second["id"].as_str().unwrap()).await;
    assert_eq!(record["status"], "success");
    assert_eq!(record["commit_message"], second["commit_message"]);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_identity_fields_are_rejected() {
    let test = build_test_app(InMemoryResolver::new());
    let body = serde_json::json!({ "repo": "requests", "issue_id": 1, "analysis": "x" });

    let response = post_json(test.app(), "/patches/generate", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert_eq!(std::fs::read_dir(test.registry.root()).unwrap().count(), 0);
}

#[tokio::test]
async fn zero_issue_id_is_rejected() {
    let test = build_test_app(InMemoryResolver::new());

    let response = post_json(test.app(), "/patches/generate", generate_body(0, UTILS_ANALYSIS)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let test = build_test_app(InMemoryResolver::new());

    let response = post_raw(test.app(), "/patches/generate", "{\"owner\": ".into()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_patch_is_404() {
    let test = build_test_app(InMemoryResolver::new());

    let response = get(test.app(), "/patches/psf-requests-issue-404-00000000.patch").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn invalid_patch_name_is_400() {
    let test = build_test_app(InMemoryResolver::new());

    let response = get(test.app(), "/patches/Not..Valid").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registry_write_failure_is_500() {
    let test = build_test_app(resolver_with(&[("utils.py", UTILS_ORIGINAL)]));
    std::fs::remove_dir_all(test.registry.root()).unwrap();

    let response = post_json(test.app(), "/patches/generate", generate_body(12, UTILS_ANALYSIS)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["status"], "error");
}

// ---------------------------------------------------------------------------
// Listing and lookup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_is_paginated_with_total_count() {
    let test = build_test_app(resolver_with(&[("utils.py", UTILS_ORIGINAL)]));
    for issue_id in [1, 2, 3] {
        generate(&test, issue_id, UTILS_ANALYSIS).await;
    }

    let all = body_json(get(test.app(), "/patches").await).await;
    assert_eq!(all["status"], "success");
    assert_eq!(all["total_count"], 3);
    assert_eq!(all["patches"].as_array().unwrap().len(), 3);

    let page = body_json(get(test.app(), "/patches?limit=2&offset=2").await).await;
    assert_eq!(page["total_count"], 3);
    assert_eq!(page["patches"].as_array().unwrap().len(), 1);

    let bad = get(test.app(), "/patches?limit=lots").await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_entries_describe_files_and_metadata() {
    let test = build_test_app(resolver_with(&[("utils.py", UTILS_ORIGINAL)]));
    let json = generate(&test, 42, UTILS_ANALYSIS).await;
    let id = json["id"].as_str().unwrap();

    let listing = body_json(get(test.app(), "/patches").await).await;
    let entry = &listing["patches"][0];

    assert_eq!(entry["name"], format!("{id}.patch"));
    assert_eq!(entry["path"], json["patch_file"]);
    assert!(entry["size"].as_u64().unwrap() > 0);
    assert!(entry["created"].is_string());
    assert_eq!(entry["metadata"]["status"], "success");
    assert_eq!(entry["metadata"]["issue_id"], 42);
    assert_eq!(entry["metadata"]["files_changed"], serde_json::json!(["utils.py"]));
}

#[tokio::test]
async fn patches_are_found_by_id_or_file_name() {
    let test = build_test_app(resolver_with(&[("utils.py", UTILS_ORIGINAL)]));
    let json = generate(&test, 5, UTILS_ANALYSIS).await;
    let id = json["id"].as_str().unwrap();

    for name in [id.to_string(), format!("{id}.patch"), format!("{id}.json")] {
        let record = fetch(&test, &name).await;
        assert_eq!(record["id"], id);
        assert_eq!(record["source"]["analysis"], UTILS_ANALYSIS);
        assert_eq!(record["source"]["issue"]["owner"], "psf");
    }
}
