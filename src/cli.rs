use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,                // global --quiet
    pub no_color: bool,             // global --no-color
    pub json: bool,                 // global --json
    pub store_dir: Option<PathBuf>, // global --store-dir override
}

#[derive(Parser)]
#[command(name = "patchup")]
#[command(about = "Safe patch-application engine for agent-proposed edits with versioned undo/redo")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Emit machine-readable JSON reports
    #[arg(long, global = true)]
    pub json: bool,

    /// Durable record directory (overrides config)
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a fresh project from a template slug
    Create(CreateArgs),

    /// Apply a JSON patch plan to a project
    Apply(ApplyArgs),

    /// Revert a project's most recent applied change
    Undo(UndoArgs),

    /// Re-apply a project's most recently undone change
    Redo(RedoArgs),

    /// Run a scripted apply/undo/redo session against a project
    Session(SessionArgs),

    /// Show a project's version and undo/redo availability
    Status(StatusArgs),

    /// Initialize a patchup.toml config file
    Init(InitArgs),
}

#[derive(Parser)]
pub struct CreateArgs {
    /// Human-readable template identifier embedded in the new project id
    pub template_slug: String,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Project identifier
    pub project: String,

    /// Path to the JSON patch plan
    pub plan: PathBuf,
}

#[derive(Parser)]
pub struct UndoArgs {
    /// Project identifier
    pub project: String,
}

#[derive(Parser)]
pub struct RedoArgs {
    /// Project identifier
    pub project: String,
}

#[derive(Parser)]
pub struct SessionArgs {
    /// Project identifier
    pub project: String,

    /// Path to a JSON array of session steps
    pub steps: PathBuf,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Project identifier
    pub project: String,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to write patchup.toml into
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}
