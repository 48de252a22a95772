//! Durable-backend behavior across engine cold starts.

use patchup::core::engine::PatchEngine;
use patchup::core::patch::PatchOp;
use patchup::infra::store::{ContentStore, DurableStore, JsonDirStore};

fn durable_engine(dir: &std::path::Path) -> PatchEngine {
    PatchEngine::new(ContentStore::with_durable(Box::new(
        JsonDirStore::new(dir).unwrap(),
    )))
}

fn replace(content: &str) -> PatchOp {
    PatchOp::Replace {
        file_path: "page.tsx".into(),
        content: content.into(),
    }
}

#[test]
fn content_survives_cold_start() {
    let tmp = tempfile::tempdir().unwrap();

    let mut eng = durable_engine(tmp.path());
    let record = eng.create_project("cafe").unwrap();
    eng.apply_batch(&record.id, &[replace("menu v1")]).unwrap();
    eng.apply_batch(&record.id, &[replace("menu v2")]).unwrap();

    let mut cold = durable_engine(tmp.path());
    assert_eq!(cold.content(&record.id).unwrap(), "menu v2");
}

#[test]
fn ledger_seeds_at_durable_version_after_restart() {
    let tmp = tempfile::tempdir().unwrap();

    let mut eng = durable_engine(tmp.path());
    let record = eng.create_project("cafe").unwrap();
    eng.apply_batch(&record.id, &[replace("menu v1")]).unwrap();
    eng.apply_batch(&record.id, &[replace("menu v2")]).unwrap();

    // History stacks are in-memory only, but the version counter carries
    // over, so new versions keep increasing monotonically.
    let mut cold = durable_engine(tmp.path());
    let state = cold.status(&record.id).unwrap();
    assert_eq!(state.version, 2);
    assert!(!state.can_undo);

    let next = cold.apply_batch(&record.id, &[replace("menu v3")]).unwrap();
    assert_eq!(next.version, 3);
}

#[test]
fn ensure_heals_unknown_ids_once() {
    let tmp = tempfile::tempdir().unwrap();

    let mut eng = durable_engine(tmp.path());
    eng.apply_batch("shop--unknown1", &[replace("first edit")])
        .unwrap();

    // The same id in a fresh process resolves to the record the first
    // call materialized, not a second divergent one.
    let mut cold = durable_engine(tmp.path());
    assert_eq!(cold.content("shop--unknown1").unwrap(), "first edit");
    let state = cold.status("shop--unknown1").unwrap();
    assert_eq!(state.version, 1);
}

#[test]
fn stored_records_carry_checksum_and_timestamp() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = JsonDirStore::new(tmp.path()).unwrap();
    backend
        .store(&patchup::infra::store::ProjectRecord {
            id: "p--1".into(),
            template_slug: "p".into(),
            content: "body".into(),
            version: 1,
        })
        .unwrap();

    let raw = std::fs::read_to_string(tmp.path().join("p--1.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(json["checksum"].as_str().unwrap().starts_with("blake3:"));
    assert!(json["updated_at"].as_str().is_some());
    assert_eq!(json["version"], 1);
}
