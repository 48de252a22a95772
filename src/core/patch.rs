//! Patch plan and report types.
//!
//! A plan arrives shape-validated from upstream (the schema parser is not
//! ours); the engine trusts its shape but not its semantics — a `match`
//! snippet that does not occur is an expected, reportable outcome.

use serde::{Deserialize, Serialize};

use crate::core::history::LedgerState;

/// One requested edit. Kinds map to the wire tags `replace-snippet`,
/// `replace`, `insert`, and `style-update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "patchType", rename_all = "kebab-case")]
pub enum PatchOp {
    /// Replace the unique occurrence of `match` with `content`.
    #[serde(rename_all = "camelCase")]
    ReplaceSnippet {
        file_path: String,
        #[serde(rename = "match")]
        target: String,
        content: String,
    },

    /// Replace the whole file content.
    #[serde(rename_all = "camelCase")]
    Replace { file_path: String, content: String },

    /// Append `content` at end of file.
    #[serde(rename_all = "camelCase")]
    Insert { file_path: String, content: String },

    /// Visual-style patch; carries no supported text transformation.
    #[serde(rename_all = "camelCase")]
    StyleUpdate { file_path: String },
}

impl PatchOp {
    pub fn file_path(&self) -> &str {
        match self {
            PatchOp::ReplaceSnippet { file_path, .. }
            | PatchOp::Replace { file_path, .. }
            | PatchOp::Insert { file_path, .. }
            | PatchOp::StyleUpdate { file_path } => file_path,
        }
    }
}

/// Ordered batch of operations for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPlan {
    pub operations: Vec<PatchOp>,
}

/// Operation skipped during a batch, with a human-readable reason the agent
/// can act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedOp {
    pub file_path: String,
    pub reason: String,
}

/// Outcome of one batch. `version`/`can_undo`/`can_redo` reflect the ledger
/// after the last committed operation; a batch with zero commits reports the
/// zero state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub committed: bool,
    pub version: u64,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Committed operations, echoed back verbatim.
    pub applied: Vec<PatchOp>,
    pub skipped: Vec<SkippedOp>,
}

/// Outcome of an undo or redo request. `file_path`/`content` are present
/// only when a record was actually restored; the caller persists `content`
/// into any live rendering surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub version: u64,
    pub can_undo: bool,
    pub can_redo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl StepReport {
    pub fn from_state(state: LedgerState) -> Self {
        Self {
            version: state.version,
            can_undo: state.can_undo,
            can_redo: state.can_redo,
            file_path: None,
            content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_deserializes_wire_shape() {
        let plan: PatchPlan = serde_json::from_str(
            r#"{
                "operations": [
                    {"patchType": "replace-snippet", "filePath": "index.tsx",
                     "match": "old text", "content": "new text"},
                    {"patchType": "insert", "filePath": "index.tsx",
                     "content": "footer"},
                    {"patchType": "style-update", "filePath": "index.tsx"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(plan.operations.len(), 3);
        assert_eq!(
            plan.operations[0],
            PatchOp::ReplaceSnippet {
                file_path: "index.tsx".into(),
                target: "old text".into(),
                content: "new text".into(),
            }
        );
        assert_eq!(plan.operations[2].file_path(), "index.tsx");
    }

    #[test]
    fn applied_ops_echo_wire_fields() {
        let op = PatchOp::ReplaceSnippet {
            file_path: "a.txt".into(),
            target: "x".into(),
            content: "y".into(),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["patchType"], "replace-snippet");
        assert_eq!(json["filePath"], "a.txt");
        assert_eq!(json["match"], "x");
        assert_eq!(json["content"], "y");
    }
}
