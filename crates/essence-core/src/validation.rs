//! Per-step validation rules.
//!
//! Every validator is a pure function returning a [`FieldErrors`] map keyed by
//! logical field name. An empty map means the step may be submitted.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::enums::Route;
use crate::forms::{ApplicationForm, FormulaEntryDraft, OilDraft, SubjectForm};
use crate::model::Formula;
use crate::tolerance::{
    ENTRY_FRACTION_TOLERANCE, FORMULA_TOTAL_PERCENTAGE, FORMULA_TOTAL_TOLERANCE, MAX_BODY_WEIGHT_KG,
    MAX_DAILY_AMOUNT, MAX_DURATION_DAYS, within,
};

/// Logical field keys used in [`FieldErrors`].
pub mod fields {
    pub const BODY_WEIGHT: &str = "body_weight";
    pub const NAME: &str = "name";
    pub const CONSTITUENTS: &str = "constituents";
    pub const FRACTION_TOTAL: &str = "fraction_total";
    pub const PERCENTAGE: &str = "percentage";
    pub const ESSENTIAL_OILS: &str = "essential_oils";
    pub const TOTAL_PERCENTAGE: &str = "total_percentage";
    pub const DAILY_AMOUNT: &str = "daily_amount";
    pub const DURATION_DAYS: &str = "duration_days";
    pub const APPLICATION_AREA: &str = "application_area";
}

/// Field-keyed validation messages. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`, replacing any earlier one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Validates the subject step.
pub fn validate_subject(form: &SubjectForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match form.body_weight {
        None => errors.insert(fields::BODY_WEIGHT, "Body weight is required"),
        // Negated comparison also rejects NaN.
        Some(w) if !(w > 0.0) => {
            errors.insert(fields::BODY_WEIGHT, "Body weight must be greater than 0 kg")
        }
        Some(w) if w > MAX_BODY_WEIGHT_KG => errors.insert(
            fields::BODY_WEIGHT,
            format!("Body weight must not exceed {} kg", MAX_BODY_WEIGHT_KG),
        ),
        Some(_) => {}
    }
    errors
}

/// Validates a single essential oil.
///
/// The constituent sum may stay below 1 (a partial lab profile) but must not
/// exceed it; there is no tolerance on the upper bound.
pub fn validate_single_oil(draft: &OilDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if draft.name.trim().is_empty() {
        errors.insert(fields::NAME, "Essential oil name is required");
    }

    let filled = draft.filled_constituents();
    let total: f64 = filled.iter().map(|c| c.fraction).sum();
    if total > 1.0 {
        errors.insert(
            fields::FRACTION_TOTAL,
            format!("Constituent fractions sum to {:.3}, which exceeds 1", total),
        );
    }
    if filled.is_empty() {
        errors.insert(
            fields::CONSTITUENTS,
            "At least one constituent with a name and a positive fraction is required",
        );
    }
    errors
}

/// Validates an oil about to be added to a formula.
///
/// Blend members must be mass-complete: their fractions sum to 1 within
/// [`ENTRY_FRACTION_TOLERANCE`].
pub fn validate_formula_entry(draft: &FormulaEntryDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if draft.oil.name.trim().is_empty() {
        errors.insert(fields::NAME, "Essential oil name is required");
    }
    match draft.percentage {
        None => errors.insert(fields::PERCENTAGE, "Percentage is required"),
        Some(p) if !(p > 0.0) => {
            errors.insert(fields::PERCENTAGE, "Percentage must be greater than 0")
        }
        Some(_) => {}
    }

    let total: f64 = draft.oil.filled_constituents().iter().map(|c| c.fraction).sum();
    if !within(total, 1.0, ENTRY_FRACTION_TOLERANCE) {
        errors.insert(
            fields::FRACTION_TOTAL,
            format!(
                "Constituent fractions must sum to 1 (±{}), got {:.3}",
                ENTRY_FRACTION_TOLERANCE, total
            ),
        );
    }
    errors
}

/// Validates that a formula may be submitted.
pub fn validate_formula_complete(formula: &Formula) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if formula.entries.is_empty() {
        errors.insert(fields::ESSENTIAL_OILS, "Add at least one essential oil");
    } else if !within(
        formula.total_percentage,
        FORMULA_TOTAL_PERCENTAGE,
        FORMULA_TOTAL_TOLERANCE,
    ) {
        errors.insert(
            fields::TOTAL_PERCENTAGE,
            format!(
                "Percentages total {:.2}%, expected 100% (±{})",
                formula.total_percentage, FORMULA_TOTAL_TOLERANCE
            ),
        );
    }
    errors
}

/// Validates the application step.
pub fn validate_application(form: &ApplicationForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match form.daily_amount {
        None => errors.insert(fields::DAILY_AMOUNT, "Daily amount is required"),
        Some(a) if !(a > 0.0) => {
            errors.insert(fields::DAILY_AMOUNT, "Daily amount must be greater than 0")
        }
        Some(a) if a > MAX_DAILY_AMOUNT => errors.insert(
            fields::DAILY_AMOUNT,
            format!("Daily amount must not exceed {}", MAX_DAILY_AMOUNT),
        ),
        Some(_) => {}
    }

    match form.duration_days {
        None => errors.insert(fields::DURATION_DAYS, "Duration is required"),
        Some(d) if d <= 0 => {
            errors.insert(fields::DURATION_DAYS, "Duration must be at least 1 day")
        }
        Some(d) if d > MAX_DURATION_DAYS => errors.insert(
            fields::DURATION_DAYS,
            format!("Duration must not exceed {} days", MAX_DURATION_DAYS),
        ),
        Some(_) => {}
    }

    if form.route == Route::Topical && !form.application_area.is_some_and(|a| a > 0.0) {
        errors.insert(
            fields::APPLICATION_AREA,
            "A positive application area is required for topical use",
        );
    }
    errors
}
