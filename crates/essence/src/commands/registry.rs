//! `essence registry` -- reference values for known constituents.

use anyhow::{Result, bail};
use essence_core::registry::{self, RegistryEntry};
use serde::Serialize;

use crate::cli::RegistryArgs;
use crate::context::RuntimeContext;
use crate::output::{opt_cell, output_json, output_table};

/// JSON view of a registry row.
#[derive(Serialize)]
struct EntryView<'a> {
    name: &'a str,
    aliases: &'a [&'a str],
    noael: Option<f64>,
    ifra_limit: Option<f64>,
    cir_limit: Option<f64>,
    cmr: bool,
}

impl<'a> From<&'a RegistryEntry> for EntryView<'a> {
    fn from(e: &'a RegistryEntry) -> Self {
        Self {
            name: e.name,
            aliases: e.aliases,
            noael: e.noael,
            ifra_limit: e.ifra_limit,
            cir_limit: e.cir_limit,
            cmr: e.cmr,
        }
    }
}

fn row(e: &RegistryEntry) -> Vec<String> {
    vec![
        e.name.to_string(),
        opt_cell(e.noael),
        opt_cell(e.ifra_limit),
        opt_cell(e.cir_limit),
        if e.cmr { "yes".into() } else { String::new() },
        e.aliases.join(", "),
    ]
}

const HEADERS: [&str; 6] = ["constituent", "noael", "ifra %", "cir %", "cmr", "aliases"];

/// Execute the `essence registry` command.
pub fn run(ctx: &RuntimeContext, args: &RegistryArgs) -> Result<()> {
    let selected: Vec<&RegistryEntry> = match &args.name {
        Some(name) => match registry::lookup(name) {
            Some(entry) => vec![entry],
            None => bail!("'{}' is not in the constituent registry", name.trim()),
        },
        None => registry::entries().iter().collect(),
    };

    if ctx.json {
        let views: Vec<EntryView<'_>> = selected.iter().map(|e| EntryView::from(*e)).collect();
        match (&args.name, views.as_slice()) {
            (Some(_), [single]) => output_json(single),
            _ => output_json(&views),
        }
    } else {
        let rows: Vec<Vec<String>> = selected.iter().map(|e| row(e)).collect();
        output_table(&HEADERS, &rows);
    }
    Ok(())
}
