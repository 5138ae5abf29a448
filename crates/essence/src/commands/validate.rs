//! `essence validate` -- check every step of a profile document.
//!
//! Unlike the wizard, which stops at the first refused step, this reports
//! the problems of all steps at once.

use anyhow::{Context, Result, bail};
use essence_core::forms::OilDraft;
use essence_core::model::Formula;
use essence_core::validation::{
    FieldErrors, validate_application, validate_formula_complete, validate_formula_entry,
    validate_single_oil, validate_subject,
};
use essence_formula::engine;
use essence_formula::parser::load_document;
use essence_formula::types::SessionDocument;
use essence_ui::report::render_field_errors;
use essence_ui::styles::{TREE_INDENT, render_fail_icon, render_pass_icon};
use serde::Serialize;

use crate::cli::ValidateArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

#[derive(Debug, Serialize)]
struct StepReport {
    step: String,
    errors: FieldErrors,
}

impl StepReport {
    fn new(step: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            step: step.into(),
            errors,
        }
    }
}

/// Validates the product part: each formula entry then the blend, or the single oil.
fn product_reports(document: &SessionDocument) -> Vec<StepReport> {
    if !document.is_formula() {
        let oil = document.oil.clone().unwrap_or_default();
        return vec![StepReport::new("oil", validate_single_oil(&oil))];
    }

    let mut reports = Vec::new();
    let mut formula = Formula::default();
    for (index, entry) in document.formula.iter().enumerate() {
        let errors = validate_formula_entry(entry);
        if errors.is_empty() {
            if let Ok(next) = engine::add_oil(&formula, entry) {
                formula = next;
            }
        }
        reports.push(StepReport::new(
            format!("formula[{}] {}", index, entry.oil.name.trim())
                .trim_end()
                .to_string(),
            errors,
        ));
    }
    reports.push(StepReport::new("formula", validate_formula_complete(&formula)));
    reports
}

fn check(document: &SessionDocument) -> Vec<StepReport> {
    let mut reports = vec![StepReport::new("subject", validate_subject(&document.subject))];
    reports.extend(product_reports(document));
    reports.push(StepReport::new(
        "application",
        validate_application(&document.application),
    ));
    reports
}

/// Execute the `essence validate` command.
pub fn run(ctx: &RuntimeContext, args: &ValidateArgs) -> Result<()> {
    let document = load_document(&args.document)
        .with_context(|| format!("failed to load {}", args.document.display()))?;
    let reports = check(&document);
    let failing = reports.iter().filter(|r| !r.errors.is_empty()).count();

    if ctx.json {
        output_json(&serde_json::json!({
            "source": document.source,
            "valid": failing == 0,
            "steps": reports,
        }));
    } else if !ctx.quiet {
        for report in &reports {
            if report.errors.is_empty() {
                println!("{} {}", render_pass_icon(), report.step);
            } else {
                println!("{} {}", render_fail_icon(), report.step);
                for line in render_field_errors(&report.errors).lines() {
                    println!("{}{}", TREE_INDENT, line);
                }
            }
        }
    }

    if failing > 0 {
        bail!("{} step(s) with errors in {}", failing, document.source);
    }
    Ok(())
}
