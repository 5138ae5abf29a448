//! `essence config` -- inspect the effective configuration.

use anyhow::{Context, Result};

use crate::cli::{ConfigArgs, ConfigCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `essence config` command.
pub fn run(ctx: &RuntimeContext, args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommands::Show => {
            if ctx.json {
                output_json(&ctx.config);
            } else {
                let yaml = serde_yaml::to_string(&ctx.config)
                    .context("failed to serialize configuration")?;
                print!("{}", yaml);
            }
        }
        ConfigCommands::Path => {
            let dir = ctx.essence_dir.as_ref().context(
                "no .essence directory found\nHint: run 'essence init' to create one",
            )?;
            if ctx.json {
                output_json(&serde_json::json!({ "path": dir.display().to_string() }));
            } else {
                println!("{}", dir.display());
            }
        }
    }
    Ok(())
}
