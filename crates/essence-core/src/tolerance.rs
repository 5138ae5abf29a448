//! Numeric tolerances and bounds shared by validation and composition.
//!
//! Every floating-point comparison in the workspace goes through these
//! constants so that the thresholds stay identical between the form
//! validators and the formula engine.

/// Allowed distance between a formula's total percentage and 100.
///
/// Entry percentages are typed by hand with one or two decimals, so a blend
/// totalling 99.95% counts as complete while 99.8% does not.
pub const FORMULA_TOTAL_TOLERANCE: f64 = 0.1;

/// Allowed distance between a blend member's constituent fraction sum and 1.0.
///
/// Blend members are assumed mass-complete; lab reports rarely sum to exactly
/// 100% after rounding, hence the 1% slack.
pub const ENTRY_FRACTION_TOLERANCE: f64 = 0.01;

/// Target total percentage of a formula.
pub const FORMULA_TOTAL_PERCENTAGE: f64 = 100.0;

/// Upper sanity bound on body weight, in kilograms.
pub const MAX_BODY_WEIGHT_KG: f64 = 200.0;

/// Upper bound on the daily amount, in the route's unit.
pub const MAX_DAILY_AMOUNT: f64 = 50_000.0;

/// Upper bound on the treatment duration, in days.
pub const MAX_DURATION_DAYS: i64 = 365;

/// Density applied when an oil does not carry its own (g/mL).
pub const DEFAULT_DENSITY: f64 = 0.9;

/// Drop weight applied when an oil does not carry its own (mg).
pub const DEFAULT_DROP_WEIGHT_MG: f64 = 30.0;

/// Returns `true` if `value` lies within `tolerance` of `target` (inclusive).
pub fn within(value: f64, target: f64, tolerance: f64) -> bool {
    (value - target).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_total_boundaries() {
        assert!(within(99.95, FORMULA_TOTAL_PERCENTAGE, FORMULA_TOTAL_TOLERANCE));
        assert!(within(100.1, FORMULA_TOTAL_PERCENTAGE, FORMULA_TOTAL_TOLERANCE));
        assert!(!within(99.8, FORMULA_TOTAL_PERCENTAGE, FORMULA_TOTAL_TOLERANCE));
    }

    #[test]
    fn nan_is_never_within() {
        assert!(!within(f64::NAN, 1.0, ENTRY_FRACTION_TOLERANCE));
    }
}
