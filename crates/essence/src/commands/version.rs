//! `essence version` -- print version and platform.

use anyhow::Result;

use crate::context::RuntimeContext;
use crate::output::output_json;

/// Version string. Set at compile time via Cargo.toml (workspace version).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build identifier. Can be overridden via environment variable at build time.
const BUILD: &str = {
    match option_env!("ESSENCE_BUILD") {
        Some(b) => b,
        None => "dev",
    }
};

/// Execute the `essence version` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    if ctx.json {
        output_json(&serde_json::json!({
            "version": VERSION,
            "build": BUILD,
            "os": os,
            "arch": arch,
        }));
    } else {
        println!("essence version {} ({}) {}/{}", VERSION, BUILD, os, arch);
    }

    Ok(())
}
