//! Plain-text renderers for reports, formulas and validation errors.
//!
//! Every renderer returns a `String` ending with a newline; styling is
//! applied only when the terminal supports color.

use std::fmt::Write as _;

use essence_core::model::{Constituent, EssentialOil, Formula};
use essence_core::report::CalculationReport;
use essence_core::tolerance::{FORMULA_TOTAL_PERCENTAGE, FORMULA_TOTAL_TOLERANCE, within};
use essence_core::validation::FieldErrors;

use crate::styles::{
    TREE_CHILD, TREE_INDENT, render_accent, render_bold, render_category, render_contraindication_kind,
    render_fail, render_fail_icon, render_flag, render_info_icon, render_muted, render_pass_icon,
    render_ratio, render_separator, render_warn, render_warn_icon,
};
use crate::terminal::wrap_width;

/// Greedy word wrap at `width` columns.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{}", v)).unwrap_or_else(|| "-".to_string())
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Renders field errors, one per line, in field order.
pub fn render_field_errors(errors: &FieldErrors) -> String {
    let mut out = String::new();
    for (field, message) in errors.iter() {
        let _ = writeln!(out, "{} {}: {}", render_fail_icon(), render_bold(field), message);
    }
    out
}

// ---------------------------------------------------------------------------
// Oils and formulas
// ---------------------------------------------------------------------------

/// Renders a constituent table with reference values and hazard flags.
pub fn render_constituents(constituents: &[Constituent]) -> String {
    let mut out = String::new();
    let width = constituents
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(12);
    let _ = writeln!(
        out,
        "{}",
        render_muted(&format!(
            "{:<width$}  {:>8}  {:>7}  {:>6}  {:>6}",
            "constituent", "fraction", "noael", "ifra", "cir"
        ))
    );
    for c in constituents {
        let mut flags = Vec::new();
        if c.cmr {
            flags.push(render_flag("CMR"));
        }
        if c.phototoxic {
            flags.push(render_flag("phototoxic"));
        }
        let mut line = format!(
            "{:<width$}  {:>8.4}  {:>7}  {:>6}  {:>6}",
            c.name,
            c.fraction,
            fmt_opt(c.noael),
            fmt_opt(c.ifra_limit),
            fmt_opt(c.cir_limit),
        );
        if !flags.is_empty() {
            line.push_str("  ");
            line.push_str(&flags.join(" "));
        }
        if let Some(source) = &c.source_oil {
            line.push_str(&render_muted(&format!("  ({})", source)));
        }
        let _ = writeln!(out, "{}", line);
    }
    out
}

/// Renders an oil header followed by its constituents.
pub fn render_oil(oil: &EssentialOil) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        render_bold(&oil.name),
        render_muted(&format!(
            "[{}] density {} g/mL, drop {} mg{}",
            oil.dominant_family.label(),
            oil.density,
            oil.drop_weight_mg,
            if oil.defurocoumarinated { ", defurocoumarinated" } else { "" }
        ))
    );
    let _ = writeln!(
        out,
        "{}",
        render_muted(&format!("total fraction {:.4}", oil.total_fraction()))
    );
    out.push_str(&render_constituents(&oil.constituents));
    out
}

/// Renders the entries of a formula with its running total.
pub fn render_formula(formula: &Formula) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", render_category("formula"));
    for (i, entry) in formula.entries.iter().enumerate() {
        let lot = entry
            .lot
            .as_deref()
            .map(|l| render_muted(&format!(" lot {}", l)))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:>2}. {:>6.2}%  {}{}",
            i,
            entry.percentage,
            entry.oil.name,
            lot
        );
    }
    let total = format!("{:.2}%", formula.total_percentage);
    let complete = !formula.is_empty()
        && within(formula.total_percentage, FORMULA_TOTAL_PERCENTAGE, FORMULA_TOTAL_TOLERANCE);
    let _ = writeln!(
        out,
        "{} total {}",
        if complete { render_pass_icon() } else { render_warn_icon() },
        if complete { render_bold(&total) } else { render_warn(&total) }
    );
    if !formula.merged_constituents.is_empty() {
        let _ = writeln!(out, "{}", render_category("merged constituents"));
        out.push_str(&render_constituents(&formula.merged_constituents));
    }
    out
}

// ---------------------------------------------------------------------------
// Calculation report
// ---------------------------------------------------------------------------

/// Renders a calculation report for the terminal.
pub fn render_report(report: &CalculationReport) -> String {
    let mut out = String::new();
    let dose = &report.dose_recommendation;

    let _ = writeln!(out, "{}", render_category("dose recommendation"));
    let _ = writeln!(
        out,
        "  final dose      {}",
        render_bold(&format!("{:.2} mg", dose.final_dose_mg))
    );
    let _ = writeln!(
        out,
        "  range           {:.2} - {:.2} mg",
        dose.min_dose_mg, dose.max_dose_mg
    );
    let _ = writeln!(out, "  concentration   {:.3} %", dose.concentration_percentage);
    if let Some(drops) = dose.dose_drops_per_kg {
        let _ = writeln!(out, "  drops per kg    {:.3}", drops);
    }
    let _ = writeln!(
        out,
        "  safety margin   factor {} ({}%)",
        dose.safety_margin.applied_factor, dose.safety_margin.margin_percentage
    );
    let limiting = match &dose.limiting_constituent {
        Some(c) => format!("{} ({})", dose.limiting_factor, c),
        None => dose.limiting_factor.clone(),
    };
    let _ = writeln!(out, "  limited by      {}", render_accent(&limiting));
    if let Some(ratio) = dose.sed_ael_ratio {
        let _ = writeln!(out, "  SED/AEL         {}", render_ratio(ratio));
    }
    if let Some(mc) = &dose.monte_carlo_result {
        let _ = writeln!(
            out,
            "  monte carlo     mean {:.2} mg, sd {:.2}, {}",
            mc.mean, mc.std, mc.confidence_interval
        );
    }
    if let Some(category) = &dose.ifra_category_applied {
        let _ = writeln!(out, "  IFRA category   {}", category);
    }
    if let Some(cir) = &dose.cir_limit_applied {
        let _ = writeln!(out, "  CIR limit       {}", cir);
    }
    let _ = writeln!(out, "  max duration    {} days", report.max_duration_days);

    if let Some(why) = report.why_this_limit.as_deref().filter(|w| !w.trim().is_empty()) {
        let _ = writeln!(out);
        for line in wrap(why, wrap_width().saturating_sub(4)) {
            let _ = writeln!(out, "{}{}", TREE_INDENT, render_muted(&line));
        }
    }

    if !report.contraindications.is_empty() {
        let _ = writeln!(out, "{}", render_separator());
        let _ = writeln!(out, "{}", render_category("contraindications"));
        for c in &report.contraindications {
            let _ = writeln!(
                out,
                "{} {}: {}",
                render_fail_icon(),
                render_contraindication_kind(c.kind),
                c.reason
            );
            if !c.recommendation.is_empty() {
                let _ = writeln!(out, "{}{}{}", TREE_INDENT, TREE_CHILD, c.recommendation);
            }
        }
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "{}", render_separator());
        let _ = writeln!(out, "{}", render_category("warnings"));
        for w in &report.warnings {
            let _ = writeln!(out, "{} {}", render_warn_icon(), w);
        }
    }

    if !report.constituent_analysis.is_empty() {
        let _ = writeln!(out, "{}", render_separator());
        let _ = writeln!(out, "{}", render_category("constituent analysis"));
        for (name, analysis) in &report.constituent_analysis {
            let ratio = analysis
                .ratio
                .map(render_ratio)
                .unwrap_or_else(|| render_muted("-"));
            let _ = writeln!(
                out,
                "  {:<24} SED {:>10}  AEL {:>10}  ratio {}",
                name,
                fmt_opt(analysis.sed),
                fmt_opt(analysis.ael),
                ratio
            );
        }
    }

    if !report.uncertainty_factors_applied.is_empty() {
        let _ = writeln!(out, "{}", render_separator());
        let _ = writeln!(out, "{}", render_category("uncertainty factors"));
        for (name, factor) in &report.uncertainty_factors_applied {
            let _ = writeln!(out, "  {:<24} x{}", name, factor);
        }
    }

    if report.has_absolute_contraindication() {
        let _ = writeln!(
            out,
            "\n{} {}",
            render_fail_icon(),
            render_fail("Absolute contraindication: do not use this product for this subject.")
        );
    }
    if let Some(ts) = report.timestamp() {
        let _ = writeln!(
            out,
            "{} {}",
            render_info_icon(),
            render_muted(&format!(
                "calculated {}{}",
                ts.format("%Y-%m-%d %H:%M UTC"),
                report
                    .calculator_version
                    .as_deref()
                    .map(|v| format!(" by calculator {}", v))
                    .unwrap_or_default()
            ))
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use essence_core::model::FormulaEntry;
    use pretty_assertions::assert_eq;

    fn sample_report() -> CalculationReport {
        serde_json::from_str(
            r#"{
                "dose_recommendation": {
                    "final_dose_mg": 12.5,
                    "min_dose_mg": 8,
                    "max_dose_mg": 15,
                    "limiting_factor": "NOAEL",
                    "limiting_constituent": "linalool",
                    "sed_ael_ratio": 0.42
                },
                "contraindications": [
                    {"type": "absolute", "reason": "Pregnancy", "recommendation": "Avoid entirely"}
                ],
                "warnings": ["Patch test first"],
                "max_duration_days": 21,
                "constituent_analysis": {"linalool": {"sed": 0.1, "ael": 0.3, "ratio": 0.33}},
                "why_this_limit": "Linalool reaches its NOAEL-derived limit first.",
                "calculation_timestamp": "2024-03-05T14:30:00",
                "calculator_version": "2.0"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn wrap_breaks_on_words() {
        assert_eq!(wrap("aa bb cc dd", 5), vec!["aa bb", "cc dd"]);
        assert_eq!(wrap("", 10), Vec::<String>::new());
        assert_eq!(wrap("longword", 3), vec!["longword"]);
    }

    #[test]
    fn report_contains_key_figures() {
        let text = render_report(&sample_report());
        assert!(text.contains("12.50 mg"));
        assert!(text.contains("NOAEL (linalool)"));
        assert!(text.contains("Pregnancy"));
        assert!(text.contains("Avoid entirely"));
        assert!(text.contains("Patch test first"));
        assert!(text.contains("21 days"));
        assert!(text.contains("Absolute contraindication"));
        assert!(text.contains("2024-03-05 14:30 UTC"));
    }

    #[test]
    fn field_errors_one_per_line() {
        let mut errors = FieldErrors::new();
        errors.insert("body_weight", "Body weight is required");
        errors.insert("application_area", "Area required");
        let text = render_field_errors(&errors);
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains("application_area"));
    }

    #[test]
    fn formula_shows_total_and_entries() {
        let mut c = Constituent::new("bergapten", 1.0);
        c.phototoxic = true;
        let formula = Formula {
            entries: vec![FormulaEntry {
                oil: EssentialOil::new("Bergamot", vec![c.clone()]),
                percentage: 99.95,
                lot: Some("B-12".into()),
            }],
            total_percentage: 99.95,
            merged_constituents: vec![c],
        };
        let text = render_formula(&formula);
        assert!(text.contains("Bergamot"));
        assert!(text.contains("99.95%"));
        assert!(text.contains("B-12"));
        assert!(text.contains("phototoxic"));
    }
}
