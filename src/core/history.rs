//! Per-project undo/redo ledger.
//!
//! Each applied edit is kept as an immutable before/after snapshot on an
//! undo stack; undoing moves the record onto a redo stack, and any fresh
//! edit discards the redo branch. The version counter bumps on every
//! mutation (push, undo, redo) and never resets.

use indexmap::IndexMap;

/// Immutable snapshot of one committed edit to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub file_path: String,
    pub before: String,
    pub after: String,
}

/// Read-only ledger snapshot returned by every mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerState {
    pub version: u64,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl LedgerState {
    /// State reported when nothing was ever committed.
    pub const EMPTY: LedgerState = LedgerState {
        version: 0,
        can_undo: false,
        can_redo: false,
    };
}

/// Result of an undo or redo step. `entry` is `None` when the relevant
/// stack was empty (a no-op, not an error); the caller restores
/// `entry.before` after undo and `entry.after` after redo.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub entry: Option<ChangeRecord>,
    pub state: LedgerState,
}

/// Linear undo/redo history for a single project.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<ChangeRecord>,
    redo_stack: Vec<ChangeRecord>,
    version: u64,
}

impl History {
    /// Ledger seeded at a prior version, for projects recovered from the
    /// durable store. Stacks start empty; the counter must not regress.
    pub fn with_version(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Record a freshly applied change. Clears the redo branch.
    pub fn push(&mut self, entry: ChangeRecord) -> LedgerState {
        self.undo_stack.push(entry);
        self.redo_stack.clear();
        self.version += 1;
        self.state()
    }

    /// Move the most recent change onto the redo stack.
    pub fn undo(&mut self) -> StepOutcome {
        match self.undo_stack.pop() {
            None => StepOutcome {
                entry: None,
                state: self.state(),
            },
            Some(rec) => {
                self.redo_stack.push(rec.clone());
                self.version += 1;
                StepOutcome {
                    entry: Some(rec),
                    state: self.state(),
                }
            }
        }
    }

    /// Move the most recently undone change back onto the undo stack.
    pub fn redo(&mut self) -> StepOutcome {
        match self.redo_stack.pop() {
            None => StepOutcome {
                entry: None,
                state: self.state(),
            },
            Some(rec) => {
                self.undo_stack.push(rec.clone());
                self.version += 1;
                StepOutcome {
                    entry: Some(rec),
                    state: self.state(),
                }
            }
        }
    }

    pub fn state(&self) -> LedgerState {
        LedgerState {
            version: self.version,
            can_undo: !self.undo_stack.is_empty(),
            can_redo: !self.redo_stack.is_empty(),
        }
    }
}

/// Process-scoped registry of ledgers, keyed by project id.
///
/// Single-writer discipline: callers must not issue concurrent requests for
/// the same project; the registry itself does no locking.
#[derive(Debug, Default)]
pub struct HistoryRegistry {
    ledgers: IndexMap<String, History>,
}

impl HistoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger for `project_id`, materialized at `seed_version` on first
    /// access so the counter mirrors the stored project version.
    pub fn ledger_for(&mut self, project_id: &str, seed_version: u64) -> &mut History {
        self.ledgers
            .entry(project_id.to_string())
            .or_insert_with(|| History::with_version(seed_version))
    }
}
