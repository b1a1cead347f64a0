//! Tests for the JSON document record store.

use std::collections::HashSet;
use std::sync::atomic::Ordering;

use camino::Utf8PathBuf;
use chrono::{Duration, TimeZone};
use futures::FutureExt;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

use super::*;
use crate::outbound::persistence::atomic_io::{TEMP_COUNTER, temp_name};
use crate::test_support::sample_submission;

/// Staging names reserved ahead of the shared write counter.
const BLOCKED_WRITES: u64 = 1024;

struct Workspace {
    _tmp: TempDir,
    dir: Dir,
    path: Utf8PathBuf,
}

impl Workspace {
    fn read_document(&self) -> Value {
        let contents = self
            .dir
            .read_to_string("submissions.json")
            .expect("document exists");
        serde_json::from_str(&contents).expect("document is JSON")
    }

    fn write_document(&self, contents: &str) {
        self.dir
            .write("submissions.json", contents)
            .expect("write document");
    }

    fn read_bytes(&self) -> Vec<u8> {
        self.dir.read("submissions.json").expect("document exists")
    }

    fn open(&self) -> JsonSubmissionStore {
        JsonSubmissionStore::open(&self.path, CorruptionPolicy::Fail).expect("store opens")
    }

    fn seed(&self, count: u64) {
        let records: Vec<SubmissionRecord> = (1..=count)
            .map(|id| SubmissionRecord::from_new(SubmissionId::new(id), &sample_submission(at(0))))
            .collect();
        self.write_document(
            &json!({ "submissions": records, "nextId": count + 1 }).to_string(),
        );
    }

    /// Occupy the staging names the next writes will try, so they fail.
    fn block_writes(&self) -> Vec<String> {
        let next = TEMP_COUNTER.load(Ordering::Relaxed);
        (next..next + BLOCKED_WRITES)
            .map(|counter| {
                let name = temp_name("submissions.json", counter);
                self.dir.create_dir(&name).expect("reserve staging name");
                name
            })
            .collect()
    }

    fn unblock_writes(&self, names: Vec<String>) {
        for name in names {
            self.dir.remove_dir(&name).expect("release staging name");
        }
    }
}

#[fixture]
fn workspace() -> Workspace {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 temp path");
    let dir = Dir::open_ambient_dir(&root, ambient_authority()).expect("open temp dir");
    Workspace {
        path: root.join("submissions.json"),
        dir,
        _tmp: tmp,
    }
}

fn at(seconds: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_714_564_800, 0)
        .single()
        .expect("valid timestamp")
        + Duration::seconds(seconds)
}

#[rstest]
#[tokio::test]
async fn open_creates_empty_document(workspace: Workspace) {
    let store = workspace.open();
    assert_eq!(
        workspace.read_document(),
        json!({ "submissions": [], "nextId": 1 })
    );
    assert!(store.list_all().await.expect("list").is_empty());
}

#[tokio::test]
async fn open_creates_missing_parent_directories() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 temp path");
    let path = root.join("nested/data/submissions.json");
    JsonSubmissionStore::open(&path, CorruptionPolicy::Fail).expect("store opens");
    let nested = Dir::open_ambient_dir(root.join("nested/data"), ambient_authority())
        .expect("parent directories exist");
    assert!(nested.exists("submissions.json"));
}

#[rstest]
#[tokio::test]
async fn appends_are_listed_newest_first(workspace: Workspace) {
    let store = workspace.open();
    for offset in 0..4 {
        store
            .append(&sample_submission(at(offset)))
            .await
            .expect("append");
    }

    let records = store.list_all().await.expect("list");
    let ids: Vec<u64> = records.iter().map(|record| record.id.get()).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
    assert!(
        records
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );
}

#[rstest]
#[tokio::test]
async fn equal_timestamps_order_by_id_descending(workspace: Workspace) {
    let store = workspace.open();
    store.append(&sample_submission(at(0))).await.expect("append");
    store.append(&sample_submission(at(0))).await.expect("append");
    store.append(&sample_submission(at(-5))).await.expect("append");

    let ids: Vec<u64> = store
        .list_all()
        .await
        .expect("list")
        .iter()
        .map(|record| record.id.get())
        .collect();
    assert_eq!(ids, vec![2, 1, 3]);
}

#[rstest]
#[tokio::test]
async fn delete_removes_only_the_matching_record(workspace: Workspace) {
    let store = workspace.open();
    let first = store.append(&sample_submission(at(0))).await.expect("append");
    let second = store.append(&sample_submission(at(1))).await.expect("append");

    let removed = store
        .delete_by_id(first)
        .await
        .expect("delete")
        .expect("record was present");
    assert_eq!(removed.id, first);
    let remaining = store.list_all().await.expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second);
    assert!(store.find_by_id(first).await.expect("lookup").is_none());
}

#[rstest]
#[tokio::test]
async fn deleting_an_absent_id_changes_nothing(workspace: Workspace) {
    let store = workspace.open();
    store.append(&sample_submission(at(0))).await.expect("append");
    let before = workspace.read_document();

    assert!(
        store
            .delete_by_id(SubmissionId::new(99))
            .await
            .expect("delete")
            .is_none()
    );
    assert_eq!(workspace.read_document(), before);
}

#[rstest]
#[tokio::test]
async fn identifiers_are_never_reused(workspace: Workspace) {
    let store = workspace.open();
    store.append(&sample_submission(at(0))).await.expect("append");
    let second = store.append(&sample_submission(at(1))).await.expect("append");
    store.delete_by_id(second).await.expect("delete");

    let third = store.append(&sample_submission(at(2))).await.expect("append");
    assert_eq!(third, SubmissionId::new(3));
    assert_eq!(workspace.read_document()["nextId"], 4);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_get_distinct_ids(workspace: Workspace) {
    let store = workspace.open();
    let tasks: Vec<_> = (0..8)
        .map(|offset| {
            let store = store.clone();
            tokio::spawn(async move { store.append(&sample_submission(at(offset))).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        let id = task.await.expect("task joins").expect("append");
        ids.insert(id.get());
    }
    assert_eq!(ids, (1..=8).collect::<HashSet<u64>>());
    assert_eq!(store.list_all().await.expect("list").len(), 8);
}

#[rstest]
#[tokio::test]
async fn reopening_preserves_records(workspace: Workspace) {
    let id = {
        let store = workspace.open();
        store.append(&sample_submission(at(0))).await.expect("append")
    };
    let reopened = workspace.open();
    let record = reopened
        .find_by_id(id)
        .await
        .expect("lookup")
        .expect("record survives reopen");
    assert_eq!(record.distributor, "Acme Co");
}

#[rstest]
#[tokio::test]
async fn historical_string_mappings_are_returned_verbatim(workspace: Workspace) {
    workspace.write_document(
        &json!({
            "submissions": [{
                "id": 1,
                "cabinet_type": "332 Cabinet",
                "detection_io": "NTCIP",
                "tls_connection": "SDLC",
                "intersection_phasing_file": null,
                "signal_timing_file": null,
                "equipment": "{\"Nexus Unit\":1}",
                "auxiliary_equipment": "{}",
                "distributor": "Acme Co",
                "end_user": "Springfield",
                "address": "1 Main St",
                "city": "Springfield",
                "state": "OR",
                "zip": "97477",
                "created_at": "2024-05-01T12:00:00Z"
            }],
            "nextId": 2
        })
        .to_string(),
    );
    let store = workspace.open();
    let records = store.list_all().await.expect("list");
    assert_eq!(records[0].equipment, json!("{\"Nexus Unit\":1}"));
}

#[rstest]
#[case("{ not json")]
#[case(r#"{"submissions": "nope", "nextId": 1}"#)]
#[case(r#"{"submissions": [], "nextId": 0}"#)]
fn open_fails_on_corrupt_document_by_default(workspace: Workspace, #[case] contents: &str) {
    workspace.write_document(contents);
    let err = JsonSubmissionStore::open(&workspace.path, CorruptionPolicy::Fail)
        .expect_err("corruption is fatal");
    assert!(matches!(err, SubmissionRepositoryError::Corruption { .. }));
}

#[rstest]
fn counter_behind_stored_ids_is_corruption(workspace: Workspace) {
    let record = serde_json::to_value(SubmissionRecord::from_new(
        SubmissionId::new(4),
        &sample_submission(at(0)),
    ))
    .expect("record serialises");
    workspace.write_document(&json!({ "submissions": [record], "nextId": 4 }).to_string());

    let err = JsonSubmissionStore::open(&workspace.path, CorruptionPolicy::Fail)
        .expect_err("stale counter");
    assert!(err.to_string().contains("nextId 4"));
}

#[rstest]
#[tokio::test]
async fn quarantine_moves_corrupt_document_aside(workspace: Workspace) {
    workspace.write_document("{ not json");
    let store = JsonSubmissionStore::open(&workspace.path, CorruptionPolicy::Quarantine)
        .expect("store recovers");

    assert!(store.list_all().await.expect("list").is_empty());
    let quarantined: Vec<String> = workspace
        .dir
        .entries()
        .expect("list dir")
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("submissions.json.corrupt-"))
        .collect();
    assert_eq!(quarantined.len(), 1);
    let preserved = workspace
        .dir
        .read_to_string(&quarantined[0])
        .expect("read quarantined file");
    assert_eq!(preserved, "{ not json");
}

#[rstest]
#[tokio::test]
async fn corruption_after_startup_is_surfaced(workspace: Workspace) {
    let store = workspace.open();
    workspace.write_document("[]");
    let err = store.list_all().await.expect_err("document is corrupt");
    assert!(matches!(err, SubmissionRepositoryError::Corruption { .. }));
}

#[rstest]
#[tokio::test]
async fn abandoned_append_still_holds_the_lock_until_written(workspace: Workspace) {
    workspace.seed(5_000);
    let store = workspace.open();

    // Poll once so the write is handed to the blocking pool, then give up.
    drop(store.append(&sample_submission(at(1))).now_or_never());
    let id = store
        .append(&sample_submission(at(2)))
        .await
        .expect("append after abandoned one");

    assert_eq!(id, SubmissionId::new(5_002));
    let doc = workspace.read_document();
    let ids: HashSet<u64> = doc["submissions"]
        .as_array()
        .expect("records array")
        .iter()
        .filter_map(|record| record["id"].as_u64())
        .collect();
    assert_eq!(ids.len(), 5_002);
    assert_eq!(doc["nextId"], 5_003);
}

#[rstest]
#[tokio::test]
async fn failed_write_leaves_the_document_untouched(workspace: Workspace) {
    let store = workspace.open();
    store.append(&sample_submission(at(0))).await.expect("append");
    let before = workspace.read_bytes();

    let blocked = workspace.block_writes();
    let err = store
        .append(&sample_submission(at(1)))
        .await
        .expect_err("staging file cannot be created");
    let failed_delete = store.delete_by_id(SubmissionId::FIRST).await;
    workspace.unblock_writes(blocked);

    assert!(matches!(err, SubmissionRepositoryError::Io { .. }));
    assert!(matches!(
        failed_delete,
        Err(SubmissionRepositoryError::Io { .. })
    ));
    assert_eq!(workspace.read_bytes(), before);
    let id = store
        .append(&sample_submission(at(2)))
        .await
        .expect("append once writable");
    assert_eq!(id, SubmissionId::new(2));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_and_deletes_interleave_safely(workspace: Workspace) {
    let store = workspace.open();
    for offset in 0..4 {
        store
            .append(&sample_submission(at(offset)))
            .await
            .expect("append");
    }

    let deletes: Vec<_> = (1..=4)
        .map(|id| {
            let store = store.clone();
            tokio::spawn(async move { store.delete_by_id(SubmissionId::new(id)).await })
        })
        .collect();
    let appends: Vec<_> = (4..8)
        .map(|offset| {
            let store = store.clone();
            tokio::spawn(async move { store.append(&sample_submission(at(offset))).await })
        })
        .collect();

    for task in deletes {
        let removed = task.await.expect("task joins").expect("delete");
        assert!(removed.is_some());
    }
    let mut appended = HashSet::new();
    for task in appends {
        appended.insert(task.await.expect("task joins").expect("append").get());
    }

    assert_eq!(appended, (5..=8).collect::<HashSet<u64>>());
    let listed: HashSet<u64> = store
        .list_all()
        .await
        .expect("list")
        .iter()
        .map(|record| record.id.get())
        .collect();
    assert_eq!(listed, appended);
    assert_eq!(workspace.read_document()["nextId"], 9);
}

#[rstest]
fn escaping_attachment_name_in_document_is_corruption(workspace: Workspace) {
    let mut record = serde_json::to_value(SubmissionRecord::from_new(
        SubmissionId::FIRST,
        &sample_submission(at(0)),
    ))
    .expect("record serialises");
    record["intersection_phasing_file"] = json!("../../etc/passwd");
    workspace.write_document(&json!({ "submissions": [record], "nextId": 2 }).to_string());

    let err = JsonSubmissionStore::open(&workspace.path, CorruptionPolicy::Fail)
        .expect_err("escaping name is rejected");
    assert!(matches!(err, SubmissionRepositoryError::Corruption { .. }));
}
