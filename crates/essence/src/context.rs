//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds what a command handler needs: the
//! discovered `.essence/` directory, the layered configuration with CLI
//! overrides applied, and the global flags.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use essence_client::HttpCalculationClient;
use essence_config::config::{EssenceConfig, load_config};
use essence_config::essence_dir::find_essence_dir;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Discovered `.essence/` directory, if any.
    pub essence_dir: Option<PathBuf>,

    /// Effective configuration.
    pub config: EssenceConfig,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// `--json` and `--url` win over the configuration file and environment.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let cwd = env::current_dir().context("failed to get current directory")?;
        let essence_dir = find_essence_dir(&cwd);
        let mut config =
            load_config(essence_dir.as_deref()).context("failed to load configuration")?;
        if let Some(url) = &global.url {
            config.service.url = url.clone();
        }

        Ok(Self {
            json: global.json || config.output.json,
            essence_dir,
            config,
            verbose: global.verbose,
            quiet: global.quiet,
        })
    }

    /// HTTP client for the configured service.
    pub fn client(&self) -> HttpCalculationClient {
        HttpCalculationClient::from_config(&self.config)
    }
}
