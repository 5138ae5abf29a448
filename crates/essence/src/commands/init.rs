//! `essence init` -- create `.essence/config.yaml` in the current directory.

use std::env;

use anyhow::{Context, Result, bail};
use essence_config::config::{EssenceConfig, save_config};
use essence_config::essence_dir::ensure_essence_dir;

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `essence init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let dir = ensure_essence_dir(&cwd)
        .with_context(|| format!("failed to create .essence in {}", cwd.display()))?;
    let config_path = dir.join("config.yaml");

    if config_path.exists() && !args.force {
        bail!(
            "{} already exists\nHint: use --force to overwrite it",
            config_path.display()
        );
    }

    // Environment overrides are not persisted.
    let mut config = EssenceConfig::default();
    if let Some(url) = &args.service_url {
        config.service.url = url.trim().to_string();
    }
    save_config(&dir, &config)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    if ctx.json {
        output_json(&serde_json::json!({
            "path": config_path.display().to_string(),
            "config": config,
        }));
    } else if !ctx.quiet {
        println!("Initialized {}", config_path.display());
        println!("  service: {}", config.service.url);
    }
    Ok(())
}
