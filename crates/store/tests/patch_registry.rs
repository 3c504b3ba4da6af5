//! Integration tests for the on-disk patch registry.
//!
//! Exercises `PatchRepo` against a temporary directory to verify that:
//! - Records round-trip through `put` / `find_by_id`
//! - A second `put` for the same id replaces the first (no duplicates)
//! - Listings are ordered newest first
//! - Regenerating without a diff removes the stale `.patch` file
//! - A failed metadata write leaves the previous `.patch` in place
//! - Corrupt metadata and temp files are ignored by listings

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use patchwright_core::issue::IssueReference;
use patchwright_core::status::PatchStatus;
use patchwright_store::models::patch::{patch_id, PatchRecord, PatchSource};
use patchwright_store::repositories::PatchRepo;
use patchwright_store::{PatchRegistry, StoreError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn registry() -> (tempfile::TempDir, PatchRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let registry = PatchRegistry::open(dir.path()).unwrap();
    (dir, registry)
}

fn record(issue_id: u64, minutes: i64, diff: &str) -> PatchRecord {
    let issue = IssueReference {
        owner: "psf".into(),
        repo: "requests".into(),
        issue_id,
        title: format!("Issue {issue_id}"),
        body: String::new(),
    };
    PatchRecord {
        id: patch_id(&issue.owner, &issue.repo, issue_id),
        status: if diff.is_empty() {
            PatchStatus::NotGenerated
        } else {
            PatchStatus::Success
        },
        files_changed: if diff.is_empty() {
            vec![]
        } else {
            vec!["utils.py".into()]
        },
        diff_content: diff.to_string(),
        commit_message: String::new(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
        source: PatchSource {
            issue,
            analysis: "analysis".into(),
            query: None,
        },
        message: None,
        validation: None,
        files: vec![],
        ignored_segments: vec![],
        diff_sha256: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn put_then_find_round_trips() {
    let (_dir, registry) = registry();
    let rec = record(1, 0, "diff --git a/utils.py b/utils.py\n");

    PatchRepo::put(&registry, &rec).await.unwrap();

    let found = PatchRepo::find_by_id(&registry, &rec.id).await.unwrap();
    assert_eq!(found, Some(rec.clone()));
    let on_disk = std::fs::read_to_string(registry.root().join(format!("{}.patch", rec.id))).unwrap();
    assert_eq!(on_disk, rec.diff_content);
}

#[tokio::test]
async fn missing_id_is_none() {
    let (_dir, registry) = registry();
    let found = PatchRepo::find_by_id(&registry, "psf-requests-issue-9-00000000")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn traversal_ids_are_rejected() {
    let (_dir, registry) = registry();
    assert_matches!(
        PatchRepo::find_by_id(&registry, "../secrets").await,
        Err(StoreError::InvalidId(_))
    );
}

#[tokio::test]
async fn second_put_overwrites_first() {
    let (_dir, registry) = registry();
    let first = record(7, 0, "first\n");
    let mut second = record(7, 5, "second\n");
    second.status = PatchStatus::Warning;

    PatchRepo::put(&registry, &first).await.unwrap();
    PatchRepo::put(&registry, &second).await.unwrap();

    let listing = PatchRepo::list(&registry).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].metadata.status, PatchStatus::Warning);

    let found = PatchRepo::find_by_id(&registry, &first.id).await.unwrap().unwrap();
    assert_eq!(found.diff_content, "second\n");
}

#[tokio::test]
async fn list_is_newest_first() {
    let (_dir, registry) = registry();
    for (issue, minutes) in [(1, 10), (2, 30), (3, 20)] {
        PatchRepo::put(&registry, &record(issue, minutes, "d\n")).await.unwrap();
    }

    let issues: Vec<u64> = PatchRepo::list(&registry)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.metadata.issue_id)
        .collect();
    assert_eq!(issues, vec![2, 3, 1]);
}

#[tokio::test]
async fn listing_names_point_at_patch_or_metadata() {
    let (_dir, registry) = registry();
    let with_diff = record(1, 1, "abc\n");
    let without = record(2, 0, "");
    PatchRepo::put(&registry, &with_diff).await.unwrap();
    PatchRepo::put(&registry, &without).await.unwrap();

    let listing = PatchRepo::list(&registry).await.unwrap();
    assert_eq!(listing[0].name, format!("{}.patch", with_diff.id));
    assert_eq!(listing[0].size, 4);
    assert_eq!(listing[1].name, format!("{}.json", without.id));
}

#[tokio::test]
async fn regeneration_without_diff_removes_stale_patch() {
    let (_dir, registry) = registry();
    let with_diff = record(4, 0, "old diff\n");
    PatchRepo::put(&registry, &with_diff).await.unwrap();
    let patch_file = registry.root().join(format!("{}.patch", with_diff.id));
    assert!(patch_file.exists());

    PatchRepo::put(&registry, &record(4, 1, "")).await.unwrap();
    assert!(!patch_file.exists());
}

#[tokio::test]
async fn failed_metadata_write_restores_previous_patch() {
    let (_dir, registry) = registry();
    let first = record(5, 0, "first diff\n");
    PatchRepo::put(&registry, &first).await.unwrap();

    // A directory where the metadata file belongs makes the rename fail.
    let metadata = registry.metadata_path(&first.id);
    std::fs::remove_file(&metadata).unwrap();
    std::fs::create_dir(&metadata).unwrap();

    let result = PatchRepo::put(&registry, &record(5, 1, "second diff\n")).await;
    assert!(result.is_err());
    let patch = std::fs::read_to_string(registry.patch_path(&first.id)).unwrap();
    assert_eq!(patch, "first diff\n");
}

#[tokio::test]
async fn failed_first_write_leaves_no_patch_file() {
    let (_dir, registry) = registry();
    let fresh = record(6, 0, "diff\n");
    std::fs::create_dir(registry.metadata_path(&fresh.id)).unwrap();

    assert!(PatchRepo::put(&registry, &fresh).await.is_err());
    assert!(!registry.patch_path(&fresh.id).exists());
}

#[tokio::test]
async fn corrupt_and_temp_files_are_skipped() {
    let (_dir, registry) = registry();
    PatchRepo::put(&registry, &record(1, 0, "d\n")).await.unwrap();
    std::fs::write(registry.root().join("broken-issue-1-00000000.json"), "{not json").unwrap();
    std::fs::write(registry.root().join(".tmp-x.json-123"), "{}").unwrap();
    std::fs::write(registry.root().join("notes.txt"), "hello").unwrap();

    let listing = PatchRepo::list(&registry).await.unwrap();
    assert_eq!(listing.len(), 1);
}

#[tokio::test]
async fn concurrent_puts_of_different_ids() {
    let (_dir, registry) = registry();
    let tasks: Vec<_> = (1..=10)
        .map(|issue| {
            let registry = registry.clone();
            tokio::spawn(async move {
                PatchRepo::put(&registry, &record(issue, issue as i64, "d\n")).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(PatchRepo::list(&registry).await.unwrap().len(), 10);
}
