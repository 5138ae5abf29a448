//! `essence merge` -- compose a formula and merge its constituents.

use anyhow::{Context, Result, bail};
use essence_core::forms::FormulaEntryDraft;
use essence_core::model::Formula;
use essence_core::registry;
use essence_core::validation::validate_formula_complete;
use essence_formula::engine;
use essence_formula::parser::load_document;
use essence_ui::report::{render_formula, render_oil};

use crate::cli::MergeArgs;
use crate::context::RuntimeContext;
use crate::output::{output_field_errors, output_json};

/// Adds every entry in order, stopping at the first one that is refused.
fn compose(
    ctx: &RuntimeContext,
    entries: &[FormulaEntryDraft],
    enrich: bool,
) -> Result<Formula> {
    let mut formula = Formula::default();
    for (index, entry) in entries.iter().enumerate() {
        let mut entry = entry.clone();
        if enrich {
            entry.oil.constituents = registry::enrich_all(&entry.oil.constituents);
        }
        formula = match engine::add_oil(&formula, &entry) {
            Ok(next) => next,
            Err(errors) => {
                let step = format!("formula entry {} ('{}')", index, entry.oil.name.trim());
                output_field_errors(ctx, &step, &errors);
                bail!("{} was refused", step);
            }
        };
    }
    Ok(formula)
}

/// Execute the `essence merge` command.
pub fn run(ctx: &RuntimeContext, args: &MergeArgs) -> Result<()> {
    let document = load_document(&args.document)
        .with_context(|| format!("failed to load {}", args.document.display()))?;
    if !document.is_formula() {
        bail!("{} has no formula entries", document.source);
    }

    let formula = compose(ctx, &document.formula, args.enrich)?;
    let errors = validate_formula_complete(&formula);
    if !errors.is_empty() {
        if !ctx.json {
            print!("{}", render_formula(&formula));
        }
        output_field_errors(ctx, "formula", &errors);
        bail!("formula is not complete");
    }
    let formula = engine::with_merged_constituents(&formula);

    if args.oil {
        let oil = engine::merge_formula(&formula)?;
        if ctx.json {
            output_json(&oil);
        } else {
            print!("{}", render_oil(&oil));
        }
    } else if ctx.json {
        output_json(&formula);
    } else {
        print!("{}", render_formula(&formula));
    }
    Ok(())
}
