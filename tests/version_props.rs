//! Property tests for version monotonicity across apply/undo/redo.

use patchup::core::engine::PatchEngine;
use patchup::core::patch::PatchOp;
use patchup::infra::store::ContentStore;
use proptest::prelude::*;

fn replace(content: String) -> PatchOp {
    PatchOp::Replace {
        file_path: "page.tsx".into(),
        content,
    }
}

proptest! {
    // 0 = apply (always a real change), 1 = undo, 2 = redo
    #[test]
    fn version_never_decreases(actions in proptest::collection::vec(0u8..3, 1..48)) {
        let mut eng = PatchEngine::new(ContentStore::in_memory());
        let mut last = 0u64;
        let mut counter = 0u64;

        for action in actions {
            match action {
                0 => {
                    counter += 1;
                    let report = eng
                        .apply_batch("p--1", &[replace(format!("state {counter}"))])
                        .unwrap();
                    prop_assert!(report.committed);
                    prop_assert!(report.version > last);
                    last = report.version;
                }
                1 => {
                    let report = eng.undo("p--1").unwrap();
                    if report.content.is_some() {
                        prop_assert!(report.version > last);
                        last = report.version;
                    } else {
                        prop_assert_eq!(report.version, last);
                    }
                }
                _ => {
                    let report = eng.redo("p--1").unwrap();
                    if report.content.is_some() {
                        prop_assert!(report.version > last);
                        last = report.version;
                    } else {
                        prop_assert_eq!(report.version, last);
                    }
                }
            }
        }
    }
}
