//! `essence` -- essential-oil exposure profile CLI.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Tracks whether a Ctrl+C has already been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Log filter used with `--verbose`.
const VERBOSE_FILTER: &str =
    "essence=debug,essence_wizard=debug,essence_client=debug,essence_formula=debug";

fn main() {
    // First Ctrl+C exits cleanly, a second one forces exit.
    let _ = ctrlc::set_handler(|| {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            std::process::exit(1);
        }
        std::process::exit(130);
    });

    let cli = Cli::parse();

    if cli.global.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(VERBOSE_FILTER)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = RuntimeContext::from_global_args(&cli.global).and_then(|ctx| match cli.command {
        Some(Commands::Init(args)) => commands::init::run(&ctx, &args),
        Some(Commands::Config(args)) => commands::config_cmd::run(&ctx, &args),
        Some(Commands::Import(args)) => commands::import::run(&ctx, &args),
        Some(Commands::Merge(args)) => commands::merge::run(&ctx, &args),
        Some(Commands::Validate(args)) => commands::validate::run(&ctx, &args),
        Some(Commands::Calculate(args)) => commands::calculate::run(&ctx, &args),
        Some(Commands::Registry(args)) => commands::registry::run(&ctx, &args),
        Some(Commands::Service(args)) => commands::service::run(&ctx, &args),
        Some(Commands::Completion(args)) => commands::completion::run(&ctx, &args),
        Some(Commands::Version) => commands::version::run(&ctx),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    });

    if let Err(e) = result {
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
