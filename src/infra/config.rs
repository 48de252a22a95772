use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for durable project records. Absent means cache-only:
    /// records live for the process lifetime.
    pub store_dir: Option<PathBuf>,

    /// Directory holding pristine template sources, consulted for paths
    /// with no recorded edits.
    pub fallback_dir: Option<PathBuf>,
}

pub fn load_config() -> Result<Config> {
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    let config_paths = ["patchup.toml", ".patchup.toml"];

    for path in &config_paths {
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
            break;
        }
    }

    // Add environment variables with PATCHUP_ prefix
    builder = builder.add_source(config::Environment::with_prefix("PATCHUP"));

    let cfg = builder.build().context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(args: InitArgs, ctx: &AppContext) -> Result<()> {
    let config_path = args.path.join("patchup.toml");

    if config_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let default = Config {
        store_dir: Some(PathBuf::from(".pup/store")),
        fallback_dir: None,
    };
    let text = toml::to_string_pretty(&default).context("serialize default config")?;
    std::fs::write(&config_path, text)
        .with_context(|| format!("write config: {}", config_path.display()))?;

    if !ctx.quiet {
        println!("Wrote {}", config_path.display());
    }
    Ok(())
}
