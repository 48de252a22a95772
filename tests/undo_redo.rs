//! Undo/redo round trips through the full engine.

use patchup::core::engine::PatchEngine;
use patchup::core::patch::PatchOp;
use patchup::infra::store::ContentStore;

fn replace(content: &str) -> PatchOp {
    PatchOp::Replace {
        file_path: "page.tsx".into(),
        content: content.into(),
    }
}

#[test]
fn undo_then_redo_restores_each_state() {
    let mut eng = PatchEngine::new(ContentStore::in_memory());

    let a = eng.apply_batch("p--1", &[replace("state A")]).unwrap();
    assert_eq!(a.version, 1);
    let b = eng.apply_batch("p--1", &[replace("state B")]).unwrap();
    assert_eq!(b.version, 2);

    let undone = eng.undo("p--1").unwrap();
    assert_eq!(undone.version, 3);
    assert!(undone.can_redo);
    assert_eq!(undone.content.as_deref(), Some("state A"));
    assert_eq!(eng.content("p--1").unwrap(), "state A");

    let redone = eng.redo("p--1").unwrap();
    assert_eq!(redone.version, 4);
    assert!(!redone.can_redo);
    assert!(redone.can_undo);
    assert_eq!(redone.content.as_deref(), Some("state B"));
    assert_eq!(eng.content("p--1").unwrap(), "state B");
}

#[test]
fn fresh_apply_after_undo_discards_redo_branch() {
    let mut eng = PatchEngine::new(ContentStore::in_memory());

    eng.apply_batch("p--1", &[replace("state A")]).unwrap();
    eng.apply_batch("p--1", &[replace("state B")]).unwrap();
    eng.undo("p--1").unwrap();

    let c = eng.apply_batch("p--1", &[replace("state C")]).unwrap();
    assert!(!c.can_redo);

    // State B is gone for good.
    let redo = eng.redo("p--1").unwrap();
    assert!(redo.content.is_none());
    assert_eq!(eng.content("p--1").unwrap(), "state C");
}

#[test]
fn undo_with_no_history_is_a_noop() {
    let mut eng = PatchEngine::new(ContentStore::in_memory());
    let report = eng.undo("p--1").unwrap();
    assert!(report.content.is_none());
    assert_eq!(report.version, 0);
    assert!(!report.can_undo);
    assert!(!report.can_redo);
}

#[test]
fn undo_restores_the_first_state_too() {
    let mut eng = PatchEngine::new(ContentStore::in_memory());
    eng.apply_batch("p--1", &[replace("only state")]).unwrap();

    let undone = eng.undo("p--1").unwrap();
    // before the first apply the project was empty
    assert_eq!(undone.content.as_deref(), Some(""));
    assert_eq!(eng.content("p--1").unwrap(), "");
}
