//! Patch application engine.
//!
//! Applies an ordered batch of patch operations to one project: content is
//! resolved through the store, snippet operations go through the locator,
//! and every real change is committed to the ledger (bumping the version and
//! clearing redo) before being written back through the store.
//!
//! Single-writer model: requests for the same project must not race. The
//! engine takes `&mut self` and does no internal locking; two interleaved
//! writers would be last-write-wins on both cache and durable backend.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use owo_colors::OwoColorize;
use tracing::{debug, info};

use crate::cli::{AppContext, ApplyArgs, CreateArgs, RedoArgs, SessionArgs, StatusArgs, UndoArgs};
use crate::core::history::{ChangeRecord, HistoryRegistry, LedgerState};
use crate::core::locator::{SnippetMatch, locate};
use crate::core::patch::{BatchReport, PatchOp, PatchPlan, SkippedOp, StepReport};
use crate::infra::config::load_config;
use crate::infra::store::{ContentStore, JsonDirStore, ProjectRecord};

// Skip reasons surfaced to the agent that produced the plan.
const REASON_AMBIGUOUS: &str = "Ambiguous match (multiple occurrences)";
const REASON_NOT_FOUND: &str = "Match not found.";
const REASON_EMPTY_MATCH: &str = "Empty match string.";

/// Hard failures: these abort a request, unlike per-operation skips.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Visual-style patches have no defined text transformation here; the
    /// whole batch fails rather than silently dropping the intent.
    #[error("unsupported patch type: style-update")]
    Unsupported,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Provider of original unedited content for a path with no recorded edits.
/// The surrounding system stores pristine template source outside this
/// engine; `ContentStore::read` returning empty means "ask this".
pub trait SourceFallback {
    fn original(&self, project_id: &str, file_path: &str) -> Option<String>;
}

/// Filesystem-backed fallback reading pristine sources under a root.
#[derive(Debug)]
pub struct DirFallback {
    root: PathBuf,
}

impl DirFallback {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Reject absolute paths and any `..`/`.` component; logical paths are
/// opaque but must stay inside the fallback root.
fn sanitize_rel(path: &str) -> Option<PathBuf> {
    let p = Path::new(path);
    if p.is_absolute() {
        return None;
    }
    let mut out = PathBuf::new();
    for comp in p.components() {
        match comp {
            Component::Normal(c) => out.push(c),
            _ => return None,
        }
    }
    Some(out)
}

impl SourceFallback for DirFallback {
    fn original(&self, _project_id: &str, file_path: &str) -> Option<String> {
        let rel = sanitize_rel(file_path)?;
        std::fs::read_to_string(self.root.join(rel)).ok()
    }
}

/// Engine orchestrating store, ledger registry, and locator.
pub struct PatchEngine {
    store: ContentStore,
    histories: HistoryRegistry,
    fallback: Option<Box<dyn SourceFallback>>,
}

impl std::fmt::Debug for PatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchEngine")
            .field("store", &self.store)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl PatchEngine {
    pub fn new(store: ContentStore) -> Self {
        Self {
            store,
            histories: HistoryRegistry::new(),
            fallback: None,
        }
    }

    pub fn with_fallback(store: ContentStore, fallback: Box<dyn SourceFallback>) -> Self {
        Self {
            store,
            histories: HistoryRegistry::new(),
            fallback: Some(fallback),
        }
    }

    /// Allocate a fresh project from a template slug.
    pub fn create_project(&mut self, template_slug: &str) -> Result<ProjectRecord, EngineError> {
        if template_slug.trim().is_empty() {
            return Err(EngineError::InvalidRequest(
                "missing template slug".into(),
            ));
        }
        Ok(self.store.create(template_slug)?)
    }

    /// Apply `ops` in submission order. Per-operation failures become
    /// skips; only `style-update` aborts the batch.
    pub fn apply_batch(
        &mut self,
        project_id: &str,
        ops: &[PatchOp],
    ) -> Result<BatchReport, EngineError> {
        let record = self.prepare(project_id)?;
        let ledger = self.histories.ledger_for(project_id, record.version);

        // Running content per touched path: each operation sees the prior
        // operation's output as its input.
        let mut working: IndexMap<String, String> = IndexMap::new();
        let mut applied = Vec::new();
        let mut skipped = Vec::new();
        let mut last_state: Option<LedgerState> = None;

        for op in ops {
            let path = op.file_path().to_string();
            let before = match working.get(&path) {
                Some(text) => text.clone(),
                None => {
                    let stored = self.store.read(project_id)?.unwrap_or_default();
                    if stored.is_empty() {
                        self.fallback
                            .as_ref()
                            .and_then(|f| f.original(project_id, &path))
                            .unwrap_or_default()
                    } else {
                        stored
                    }
                }
            };

            let after = match op {
                PatchOp::StyleUpdate { .. } => return Err(EngineError::Unsupported),

                PatchOp::ReplaceSnippet {
                    target, content, ..
                } => match locate(&before, target) {
                    SnippetMatch::Found { start, end } => {
                        let mut after = before.clone();
                        after.replace_range(start..end, content);
                        after
                    }
                    SnippetMatch::Ambiguous => {
                        skipped.push(SkippedOp {
                            file_path: path,
                            reason: REASON_AMBIGUOUS.into(),
                        });
                        continue;
                    }
                    SnippetMatch::NotFound => {
                        skipped.push(SkippedOp {
                            file_path: path,
                            reason: REASON_NOT_FOUND.into(),
                        });
                        continue;
                    }
                    SnippetMatch::InvalidMatch => {
                        skipped.push(SkippedOp {
                            file_path: path,
                            reason: REASON_EMPTY_MATCH.into(),
                        });
                        continue;
                    }
                },

                PatchOp::Replace { content, .. } => content.clone(),

                PatchOp::Insert { content, .. } => {
                    if before.is_empty() {
                        content.clone()
                    } else {
                        format!("{before}\n{content}")
                    }
                }
            };

            if after == before {
                // No-op edit: no history entry, no version bump, no skip.
                working.insert(path, after);
                continue;
            }

            let state = ledger.push(ChangeRecord {
                file_path: path.clone(),
                before,
                after: after.clone(),
            });
            self.store.write(project_id, &after, state.version)?;
            debug!(project = project_id, path = %path, version = state.version, "committed patch");

            working.insert(path, after);
            applied.push(op.clone());
            last_state = Some(state);
        }

        let state = last_state.unwrap_or(LedgerState::EMPTY);
        info!(
            project = project_id,
            applied = applied.len(),
            skipped = skipped.len(),
            version = state.version,
            "batch finished"
        );
        Ok(BatchReport {
            committed: !applied.is_empty(),
            version: state.version,
            can_undo: state.can_undo,
            can_redo: state.can_redo,
            applied,
            skipped,
        })
    }

    /// Revert the most recent applied change, if any.
    pub fn undo(&mut self, project_id: &str) -> Result<StepReport, EngineError> {
        let record = self.prepare(project_id)?;
        let out = self
            .histories
            .ledger_for(project_id, record.version)
            .undo();

        let mut report = StepReport::from_state(out.state);
        if let Some(entry) = out.entry {
            self.store
                .write(project_id, &entry.before, out.state.version)?;
            debug!(project = project_id, version = out.state.version, "undid change");
            report.file_path = Some(entry.file_path);
            report.content = Some(entry.before);
        }
        Ok(report)
    }

    /// Re-apply the most recently undone change, if any.
    pub fn redo(&mut self, project_id: &str) -> Result<StepReport, EngineError> {
        let record = self.prepare(project_id)?;
        let out = self
            .histories
            .ledger_for(project_id, record.version)
            .redo();

        let mut report = StepReport::from_state(out.state);
        if let Some(entry) = out.entry {
            self.store
                .write(project_id, &entry.after, out.state.version)?;
            debug!(project = project_id, version = out.state.version, "redid change");
            report.file_path = Some(entry.file_path);
            report.content = Some(entry.after);
        }
        Ok(report)
    }

    /// Ledger snapshot for a project.
    pub fn status(&mut self, project_id: &str) -> Result<LedgerState, EngineError> {
        let record = self.prepare(project_id)?;
        Ok(self
            .histories
            .ledger_for(project_id, record.version)
            .state())
    }

    /// Current stored content for a project (empty when never edited).
    pub fn content(&mut self, project_id: &str) -> Result<String, EngineError> {
        self.prepare(project_id)?;
        Ok(self.store.read(project_id)?.unwrap_or_default())
    }

    fn prepare(&mut self, project_id: &str) -> Result<ProjectRecord, EngineError> {
        if project_id.trim().is_empty() {
            return Err(EngineError::InvalidRequest(
                "missing project identifier".into(),
            ));
        }
        Ok(self.store.ensure(project_id)?)
    }
}

/// One step of a scripted session: a batch apply, or a history traversal.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum SessionStep {
    #[serde(rename_all = "camelCase")]
    Apply { operations: Vec<PatchOp> },
    Undo,
    Redo,
}

// ---------------------------------------------------------------------------
// CLI entry points
// ---------------------------------------------------------------------------

fn build_engine(ctx: &AppContext) -> Result<PatchEngine> {
    let cfg = load_config()?;
    let store_dir = ctx.store_dir.clone().or(cfg.store_dir);

    let store = match store_dir {
        Some(dir) => ContentStore::with_durable(Box::new(JsonDirStore::new(dir)?)),
        None => ContentStore::in_memory(),
    };

    Ok(match cfg.fallback_dir {
        Some(dir) => PatchEngine::with_fallback(store, Box::new(DirFallback::new(dir))),
        None => PatchEngine::new(store),
    })
}

fn read_plan(path: &Path) -> Result<PatchPlan> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read plan: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse plan: {}", path.display()))
}

fn print_batch(report: &BatchReport, ctx: &AppContext) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    if ctx.quiet {
        return Ok(());
    }

    let headline = if report.committed {
        format!("applied {} operation(s)", report.applied.len())
    } else {
        "no changes".to_string()
    };
    if ctx.no_color {
        println!("{headline}");
    } else if report.committed {
        println!("{}", headline.green());
    } else {
        println!("{}", headline.yellow());
    }

    for skip in &report.skipped {
        let line = format!("  skipped {}: {}", skip.file_path, skip.reason);
        if ctx.no_color {
            println!("{line}");
        } else {
            println!("{}", line.red());
        }
    }
    println!(
        "version {} (undo: {}, redo: {})",
        report.version, report.can_undo, report.can_redo
    );
    Ok(())
}

fn print_step(label: &str, report: &StepReport, ctx: &AppContext) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    if ctx.quiet {
        return Ok(());
    }
    match &report.file_path {
        Some(path) => println!(
            "{label}: restored {} at version {}",
            path, report.version
        ),
        None => println!("{label}: nothing to {label}"),
    }
    println!(
        "version {} (undo: {}, redo: {})",
        report.version, report.can_undo, report.can_redo
    );
    Ok(())
}

/// `pup create <template-slug>`
pub fn create_run(args: CreateArgs, ctx: &AppContext) -> Result<()> {
    let mut engine = build_engine(ctx)?;
    let record = engine.create_project(&args.template_slug)?;
    if ctx.json {
        println!(
            "{}",
            serde_json::json!({ "id": record.id, "version": record.version })
        );
    } else if !ctx.quiet {
        println!("{}", record.id);
    }
    Ok(())
}

/// `pup apply <project> <plan.json>`
pub fn apply_run(args: ApplyArgs, ctx: &AppContext) -> Result<()> {
    let mut engine = build_engine(ctx)?;
    let plan = read_plan(&args.plan)?;
    let report = engine.apply_batch(&args.project, &plan.operations)?;
    print_batch(&report, ctx)
}

/// `pup undo <project>`
///
/// Undo/redo stacks live in process memory, so a standalone invocation only
/// sees changes applied earlier in the same process; use `session` to script
/// apply and undo steps together.
pub fn undo_run(args: UndoArgs, ctx: &AppContext) -> Result<()> {
    let mut engine = build_engine(ctx)?;
    let report = engine.undo(&args.project)?;
    print_step("undo", &report, ctx)
}

/// `pup redo <project>`
///
/// Same in-process scope as `undo`.
pub fn redo_run(args: RedoArgs, ctx: &AppContext) -> Result<()> {
    let mut engine = build_engine(ctx)?;
    let report = engine.redo(&args.project)?;
    print_step("redo", &report, ctx)
}

/// `pup status <project>`
pub fn status_run(args: StatusArgs, ctx: &AppContext) -> Result<()> {
    let mut engine = build_engine(ctx)?;
    let state = engine.status(&args.project)?;
    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "version": state.version,
                "canUndo": state.can_undo,
                "canRedo": state.can_redo,
            })
        );
    } else if !ctx.quiet {
        println!(
            "version {} (undo: {}, redo: {})",
            state.version, state.can_undo, state.can_redo
        );
    }
    Ok(())
}

/// `pup session <project> <steps.json>`
///
/// Runs a scripted sequence of apply/undo/redo steps in one process, which
/// is the unit the in-memory ledger lives for. This is how undo and redo
/// are exercised from the command line.
pub fn session_run(args: SessionArgs, ctx: &AppContext) -> Result<()> {
    let text = std::fs::read_to_string(&args.steps)
        .with_context(|| format!("read session: {}", args.steps.display()))?;
    let steps: Vec<SessionStep> = serde_json::from_str(&text)
        .with_context(|| format!("parse session: {}", args.steps.display()))?;

    let mut engine = build_engine(ctx)?;
    for step in steps {
        match step {
            SessionStep::Apply { operations } => {
                let report = engine.apply_batch(&args.project, &operations)?;
                print_batch(&report, ctx)?;
            }
            SessionStep::Undo => {
                let report = engine.undo(&args.project)?;
                print_step("undo", &report, ctx)?;
            }
            SessionStep::Redo => {
                let report = engine.redo(&args.project)?;
                print_step("redo", &report, ctx)?;
            }
        }
    }
    Ok(())
}
