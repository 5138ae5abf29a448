//! Formula composition: add/remove entries, completeness, constituent merge.
//!
//! Every operation takes the formula by reference and returns a new value;
//! nothing is mutated in place.

use std::collections::BTreeMap;

use essence_core::enums::BiochemicalFamily;
use essence_core::forms::FormulaEntryDraft;
use essence_core::model::{Constituent, EssentialOil, Formula, FormulaEntry};
use essence_core::validation::{FieldErrors, validate_formula_complete, validate_formula_entry};
use tracing::debug;

use crate::types::{FormulaError, Result};

/// Appends an oil to `formula`.
///
/// The entry is rejected with field errors if its name is blank, its
/// percentage is not positive, or its constituent fractions do not sum to 1
/// within the entry tolerance. On success the running total grows by exactly
/// the added percentage.
pub fn add_oil(
    formula: &Formula,
    draft: &FormulaEntryDraft,
) -> std::result::Result<Formula, FieldErrors> {
    validate_formula_entry(draft).into_result()?;

    let percentage = draft.percentage.unwrap_or_default();
    let oil = draft.oil.build_oil();
    debug!(oil = %oil.name, percentage, "adding oil to formula");

    let mut entries = formula.entries.clone();
    entries.push(FormulaEntry {
        oil,
        percentage,
        lot: draft
            .lot
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned),
    });

    Ok(Formula {
        entries,
        total_percentage: formula.total_percentage + percentage,
        merged_constituents: Vec::new(),
    })
}

/// Removes the entry at `index`, or returns `None` if there is none.
///
/// The running total shrinks by the removed entry's stored percentage.
pub fn remove_oil(formula: &Formula, index: usize) -> Option<Formula> {
    let removed = formula.entries.get(index)?;
    debug!(oil = %removed.oil.name, index, "removing oil from formula");

    let mut entries = formula.entries.clone();
    entries.remove(index);
    let total_percentage = if entries.is_empty() {
        0.0
    } else {
        formula.total_percentage - removed.percentage
    };

    Some(Formula {
        entries,
        total_percentage,
        merged_constituents: Vec::new(),
    })
}

/// Returns `true` if the formula has at least one entry and totals 100%.
pub fn is_complete(formula: &Formula) -> bool {
    validate_formula_complete(formula).is_empty()
}

// ---------------------------------------------------------------------------
// Constituent merge
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Accumulator<'a> {
    contributions: Vec<f64>,
    oils: Vec<&'a str>,
    noael: Option<f64>,
    ifra_limit: Option<f64>,
    cir_limit: Option<f64>,
    additional_uf: Option<f64>,
    phototoxic: bool,
    cmr: bool,
}

fn min_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

impl<'a> Accumulator<'a> {
    fn push(&mut self, oil: &'a str, percentage: f64, c: &'a Constituent) {
        self.contributions.push(percentage / 100.0 * c.fraction);
        self.oils.push(oil);
        self.noael = min_opt(self.noael, c.noael);
        self.ifra_limit = min_opt(self.ifra_limit, c.ifra_limit);
        self.cir_limit = min_opt(self.cir_limit, c.cir_limit);
        self.additional_uf = max_opt(self.additional_uf, c.additional_uf);
        self.phototoxic |= c.phototoxic;
        self.cmr |= c.cmr;
    }

    fn finish(mut self, name: &str) -> Constituent {
        // Sorting before summing makes the float sum independent of entry order.
        self.contributions.sort_by(f64::total_cmp);
        self.oils.sort_unstable();
        self.oils.dedup();

        let mut merged = Constituent::new(name, self.contributions.iter().sum());
        merged.noael = self.noael;
        merged.ifra_limit = self.ifra_limit;
        merged.cir_limit = self.cir_limit;
        merged.additional_uf = self.additional_uf;
        merged.phototoxic = self.phototoxic;
        merged.cmr = self.cmr;
        if let [only] = self.oils.as_slice() {
            merged.source_oil = Some((*only).to_owned());
        }
        merged
    }
}

/// Computes the formula-weighted union of all constituents.
///
/// Occurrences are joined on their exact (trimmed) name, so "Limonène" and
/// "limonene" stay separate constituents. For each name the
/// merged fraction is the sum of `percentage / 100 * fraction` over every
/// occurrence; reference values take the most conservative occurrence and
/// flags are OR-ed. `source_oil` is set only when a single oil (by name)
/// contributes. The result is sorted by name and does not depend on the
/// order of the entries.
pub fn merge_constituents(formula: &Formula) -> Vec<Constituent> {
    let mut groups: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();
    for entry in &formula.entries {
        let oil = entry.oil.name.trim();
        for constituent in entry.oil.constituents.iter().filter(|c| c.is_filled()) {
            groups
                .entry(constituent.name.trim())
                .or_default()
                .push(oil, entry.percentage, constituent);
        }
    }
    groups
        .into_iter()
        .map(|(name, acc)| acc.finish(name))
        .collect()
}

/// Returns a copy of `formula` with `merged_constituents` populated.
pub fn with_merged_constituents(formula: &Formula) -> Formula {
    Formula {
        merged_constituents: merge_constituents(formula),
        ..formula.clone()
    }
}

/// Derives the single oil equivalent to a complete formula.
///
/// The name lists the entries with their percentages, the constituents are
/// [`merge_constituents`], and the dominant family is the one carrying the
/// largest share of the formula.
pub fn merge_formula(formula: &Formula) -> Result<EssentialOil> {
    validate_formula_complete(formula)
        .into_result()
        .map_err(FormulaError::Incomplete)?;

    let name = formula
        .entries
        .iter()
        .map(|e| format!("{} ({}%)", e.oil.name, e.percentage))
        .collect::<Vec<_>>()
        .join(" + ");

    let mut weights: BTreeMap<BiochemicalFamily, Vec<f64>> = BTreeMap::new();
    for entry in &formula.entries {
        weights
            .entry(entry.oil.dominant_family)
            .or_default()
            .push(entry.percentage);
    }
    let mut dominant = BiochemicalFamily::default();
    let mut best = f64::NEG_INFINITY;
    // BTreeMap iterates in declaration order, so the first family wins ties.
    for (family, mut shares) in weights {
        shares.sort_by(f64::total_cmp);
        let total: f64 = shares.iter().sum();
        if total > best {
            best = total;
            dominant = family;
        }
    }

    let mut oil = EssentialOil::new(name, merge_constituents(formula));
    oil.dominant_family = dominant;
    Ok(oil)
}
