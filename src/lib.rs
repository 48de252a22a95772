//! **patchup** - Safe patch-application engine for agent-proposed edits
//!
//! An agent proposes textual patches against a generated project; patchup
//! locates the target snippet (exact first, whitespace-tolerant second),
//! refuses ambiguous or missing matches, and records every applied change
//! in a versioned undo/redo ledger over a write-through content store.

/// Command-line interface with clap integration
pub mod cli;

/// Core engine - snippet location, history, and batch application
pub mod core {
    /// Unique-span snippet location (exact pass, then whitespace-collapsing fuzzy pass)
    pub mod locator;
    pub use locator::{SnippetMatch, locate};

    /// Per-project undo/redo ledger with monotonic versioning
    pub mod history;
    pub use history::{ChangeRecord, History, HistoryRegistry, LedgerState};

    /// Patch plan and report types (serde wire shapes)
    pub mod patch;
    pub use patch::{BatchReport, PatchOp, PatchPlan, SkippedOp, StepReport};

    /// Batch application engine orchestrating store, ledger, and locator
    pub mod engine;
    pub use engine::{DirFallback, EngineError, PatchEngine, SourceFallback};
}

/// Infrastructure - configuration and content persistence
pub mod infra {
    /// Configuration management with TOML support
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Versioned project-content store (cache over optional durable backend)
    pub mod store;
    pub use store::{ContentStore, DurableStore, JsonDirStore, ProjectRecord};
}

// Strategic re-exports for clean consumer interface
pub use cli::{AppContext, Cli, Commands};
pub use core::{
    BatchReport, EngineError, PatchEngine, PatchOp, PatchPlan, SnippetMatch, StepReport, locate,
};
pub use infra::{Config, ContentStore, JsonDirStore, ProjectRecord, load_config};
