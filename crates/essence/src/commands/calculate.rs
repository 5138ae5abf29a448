//! `essence calculate` -- run a profile document through the wizard and the
//! calculation service.
//!
//! The document is fed to the wizard one step at a time, exactly as a user
//! would fill the forms, so a document is refused for the same reasons the
//! interactive flow would refuse it. The request then runs on a worker
//! thread while this thread waits for the tagged completion.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use essence_client::{CalculationService, HttpCalculationClient};
use essence_core::registry;
use essence_formula::parser::load_document;
use essence_formula::types::SessionDocument;
use essence_ui::report::render_report;
use essence_ui::styles::render_step_marker;
use essence_wizard::{Completion, Dispatcher, Mode, PendingCalculation, Step, Wizard, WizardError};
use tracing::debug;

use crate::cli::CalculateArgs;
use crate::context::RuntimeContext;
use crate::output::{output_field_errors, output_json};

/// Extra time granted on top of the HTTP timeout before giving up on the worker.
const WAIT_GRACE: Duration = Duration::from_secs(1);

/// Converts a refused wizard action, printing field errors when there are any.
fn refused<T>(
    ctx: &RuntimeContext,
    step: &str,
    result: std::result::Result<T, WizardError>,
) -> Result<T> {
    result.map_err(|err| match err.field_errors() {
        Some(errors) => {
            output_field_errors(ctx, step, errors);
            anyhow!("{} step was refused", step)
        }
        None => anyhow!(err),
    })
}

/// Drives a fresh wizard through steps 1 to 3.
fn prepare(
    ctx: &RuntimeContext,
    wizard: &mut Wizard,
    document: &SessionDocument,
    enrich: bool,
) -> Result<PendingCalculation> {
    refused(ctx, "subject", wizard.submit_subject(&document.subject))?;

    if document.is_formula() {
        refused(ctx, "mode", wizard.set_mode(Mode::MultiOil))?;
        for (index, entry) in document.formula.iter().enumerate() {
            let mut entry = entry.clone();
            if enrich {
                entry.oil.constituents = registry::enrich_all(&entry.oil.constituents);
            }
            let step = format!("formula entry {} ('{}')", index, entry.oil.name.trim());
            refused(ctx, &step, wizard.add_formula_oil(&entry))?;
        }
        refused(ctx, "formula", wizard.submit_formula())?;
    } else {
        let mut oil = document.oil.clone().unwrap_or_default();
        if enrich {
            oil.constituents = registry::enrich_all(&oil.constituents);
        }
        refused(ctx, "oil", wizard.submit_single_oil(&oil))?;
    }

    refused(ctx, "application", wizard.submit_application(&document.application))
}

fn progress_line(wizard: &Wizard) -> String {
    Step::ALL
        .iter()
        .map(|s| render_step_marker(s.number(), s.label(), wizard.step().number()))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Execute the `essence calculate` command.
pub fn run(ctx: &RuntimeContext, args: &CalculateArgs) -> Result<()> {
    let document = load_document(&args.document)
        .with_context(|| format!("failed to load {}", args.document.display()))?;

    let mut wizard = Wizard::new();
    let pending = prepare(ctx, &mut wizard, &document, args.enrich)?;

    if args.dry_run {
        output_json(&pending.request);
        return Ok(());
    }

    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.service.timeout());
    let client = HttpCalculationClient::new(ctx.config.service.url.clone(), timeout);
    debug!(url = client.base_url(), ?timeout, "calculating");
    let service: Arc<dyn CalculationService> = Arc::new(client);
    let dispatcher = Dispatcher::new(service);
    let _worker = dispatcher.dispatch(pending);

    if !ctx.json && !ctx.quiet {
        eprintln!("{}", progress_line(&wizard));
        eprintln!("Calculating with {}...", ctx.config.service.url);
    }

    let finished = dispatcher.wait(timeout + WAIT_GRACE).with_context(|| {
        format!(
            "no answer from {} within {}s",
            ctx.config.service.url,
            timeout.as_secs()
        )
    })?;

    match finished.apply(&mut wizard) {
        Completion::Applied => {}
        Completion::Failed(message) => bail!(message),
        Completion::Discarded => bail!("the calculation result was discarded"),
    }
    let report = wizard
        .session()
        .report
        .as_ref()
        .context("calculation finished without a report")?;

    if ctx.json {
        output_json(report);
    } else {
        println!("{}", progress_line(&wizard));
        println!();
        print!("{}", render_report(report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use essence_config::config::EssenceConfig;
    use essence_core::enums::Route;
    use essence_core::forms::{ApplicationForm, FormulaEntryDraft, OilDraft, SubjectForm};
    use essence_core::model::Constituent;

    fn ctx() -> RuntimeContext {
        RuntimeContext {
            essence_dir: None,
            config: EssenceConfig::default(),
            json: true,
            verbose: false,
            quiet: true,
        }
    }

    fn document() -> SessionDocument {
        let mut lavender = OilDraft::named("Lavender");
        lavender.constituents = vec![
            Constituent::new("Linalool", 0.45),
            Constituent::new("linalyl acetate", 0.55),
        ];
        let mut clove = OilDraft::named("Clove");
        clove.constituents = vec![Constituent::new("eugenol", 1.0)];
        SessionDocument {
            subject: SubjectForm {
                body_weight: Some(70.0),
                ..SubjectForm::default()
            },
            formula: vec![
                FormulaEntryDraft::new(lavender, 80.0),
                FormulaEntryDraft::new(clove, 20.0),
            ],
            application: ApplicationForm {
                route: Route::Topical,
                daily_amount: Some(500.0),
                duration_days: Some(10),
                application_area: Some(100.0),
                ..ApplicationForm::default()
            },
            ..SessionDocument::default()
        }
    }

    #[test]
    fn formula_document_reaches_application_step() {
        let mut wizard = Wizard::new();
        let pending = prepare(&ctx(), &mut wizard, &document(), true).unwrap();
        assert_eq!(wizard.step(), Step::ApplicationParams);
        assert!(wizard.is_calculating());

        let formula = pending.request.formula.as_ref().unwrap();
        assert_eq!(formula.entries.len(), 2);
        assert!(pending.request.essential_oil.is_none());
        // Enrichment joins "Linalool" onto the registry entry.
        let linalool = &formula.entries[0].oil.constituents[0];
        assert_eq!(linalool.noael, Some(500.0));
        assert!(!formula.merged_constituents.is_empty());
    }

    #[test]
    fn incomplete_formula_is_refused_at_submit() {
        let mut doc = document();
        doc.formula.truncate(1);
        let mut wizard = Wizard::new();
        let err = prepare(&ctx(), &mut wizard, &doc, false).unwrap_err();
        assert!(err.to_string().contains("formula step was refused"));
        assert_eq!(wizard.step(), Step::OilOrFormula);
    }

    #[test]
    fn missing_oil_is_refused() {
        let mut doc = document();
        doc.formula.clear();
        let mut wizard = Wizard::new();
        let err = prepare(&ctx(), &mut wizard, &doc, false).unwrap_err();
        assert!(err.to_string().contains("oil step was refused"));
    }
}
