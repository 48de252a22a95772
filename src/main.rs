use anyhow::Result;
use clap::Parser;
use patchup::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        json: cli.json,
        store_dir: cli.store_dir.clone(),
    };

    match cli.command {
        Commands::Create(args) => patchup::core::engine::create_run(args, &ctx),
        Commands::Apply(args) => patchup::core::engine::apply_run(args, &ctx),
        Commands::Undo(args) => patchup::core::engine::undo_run(args, &ctx),
        Commands::Redo(args) => patchup::core::engine::redo_run(args, &ctx),
        Commands::Session(args) => patchup::core::engine::session_run(args, &ctx),
        Commands::Status(args) => patchup::core::engine::status_run(args, &ctx),
        Commands::Init(args) => patchup::infra::config::init(args, &ctx),
    }
}
