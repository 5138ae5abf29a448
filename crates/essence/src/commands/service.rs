//! `essence service` -- probe the calculation service.

use anyhow::{Result, anyhow, bail};
use essence_client::CalculationService;
use essence_ui::styles::{render_fail, render_pass};

use crate::cli::{ServiceArgs, ServiceCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `essence service` command.
pub fn run(ctx: &RuntimeContext, args: &ServiceArgs) -> Result<()> {
    let client = ctx.client();
    match &args.command {
        ServiceCommands::Health => {
            let health = client
                .health()
                .map_err(|e| anyhow!("{}: {}", client.base_url(), e.user_message()))?;
            if ctx.json {
                output_json(&health);
            } else {
                let status = if health.is_ok() {
                    render_pass(&health.status)
                } else {
                    render_fail(&health.status)
                };
                println!("{} {}", client.base_url(), status);
            }
            if !health.is_ok() {
                bail!("service reported status '{}'", health.status);
            }
        }
        ServiceCommands::ReferenceData => {
            let data = client
                .reference_data()
                .map_err(|e| anyhow!("{}: {}", client.base_url(), e.user_message()))?;
            output_json(&data);
        }
    }
    Ok(())
}
