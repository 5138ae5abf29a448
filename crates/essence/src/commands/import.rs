//! `essence import` -- turn a GC-MS report into an oil document.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use essence_core::forms::OilDraft;
use essence_core::registry;
use essence_core::validation::validate_single_oil;
use essence_formula::gcms;
use essence_formula::parser::{load_document, save_document};
use essence_formula::types::SessionDocument;
use essence_ui::report::{render_constituents, render_field_errors};

use crate::cli::ImportArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

fn read_report(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read GC-MS report from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path)
        .with_context(|| format!("failed to read GC-MS report: {}", path.display()))
}

/// Oil name from the report's file stem, empty for stdin.
fn default_name(path: &Path) -> String {
    if path.as_os_str() == "-" {
        return String::new();
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default()
}

/// Execute the `essence import` command.
pub fn run(ctx: &RuntimeContext, args: &ImportArgs) -> Result<()> {
    let text = read_report(&args.report)?;

    let mut document = match &args.into {
        Some(path) => load_document(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SessionDocument::default(),
    };
    if document.is_formula() {
        return Err(anyhow!(
            "{} describes a formula; import into a single-oil document",
            document.source
        ));
    }

    let mut draft = document
        .oil
        .take()
        .unwrap_or_else(|| OilDraft::named(default_name(&args.report)));
    if let Some(name) = &args.name {
        draft.name = name.trim().to_string();
    }

    let mut draft = gcms::apply_import(&draft, &text)
        .with_context(|| args.report.display().to_string())?;
    if args.enrich {
        draft.constituents = registry::enrich_all(&draft.constituents);
    }

    let destination = args.output.as_ref().or(args.into.as_ref());
    document.oil = Some(draft.clone());
    if let Some(path) = destination {
        save_document(path, &document)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if ctx.json {
        output_json(&draft);
        return Ok(());
    }
    if ctx.quiet {
        return Ok(());
    }

    print!("{}", render_constituents(&draft.constituents));
    println!();
    println!(
        "Imported {} constituent(s) into '{}'{}",
        draft.constituents.len(),
        draft.name,
        destination
            .map(|p| format!(" -> {}", p.display()))
            .unwrap_or_default()
    );
    let problems = validate_single_oil(&draft);
    if !problems.is_empty() {
        eprint!("{}", render_field_errors(&problems));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn name_from_file_stem() {
        assert_eq!(default_name(&PathBuf::from("/lab/tea_tree-2024.csv")), "tea tree 2024");
        assert_eq!(default_name(&PathBuf::from("-")), "");
    }
}
