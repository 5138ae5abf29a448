//! Calculation report returned by the dose service.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ContraindicationKind;

fn default_applied_factor() -> f64 {
    0.5
}

/// Safety margin applied to the final dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyMargin {
    #[serde(default = "default_applied_factor")]
    pub applied_factor: f64,
    #[serde(default)]
    pub margin_percentage: f64,
}

impl Default for SafetyMargin {
    fn default() -> Self {
        Self {
            applied_factor: default_applied_factor(),
            margin_percentage: 0.0,
        }
    }
}

/// Summary of the service's Monte-Carlo simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloResult {
    pub mean: f64,
    pub std: f64,
    pub p5: f64,
    pub p95: f64,
    pub confidence_interval: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoseRecommendation {
    pub final_dose_mg: f64,
    #[serde(default)]
    pub concentration_percentage: f64,
    #[serde(default)]
    pub min_dose_mg: f64,
    #[serde(default)]
    pub max_dose_mg: f64,
    #[serde(default)]
    pub safety_margin: SafetyMargin,
    #[serde(default)]
    pub limiting_factor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limiting_constituent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sed_ael_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_drops_per_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monte_carlo_result: Option<MonteCarloResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifra_category_applied: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cir_limit_applied: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contraindication {
    #[serde(rename = "type")]
    pub kind: ContraindicationKind,
    pub reason: String,
    #[serde(default)]
    pub recommendation: String,
}

/// Per-constituent exposure figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstituentAnalysis {
    pub sed: Option<f64>,
    pub ael: Option<f64>,
    pub ratio: Option<f64>,
    pub budget_consumed: Option<f64>,
}

/// Body of a successful `POST /calculate` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationReport {
    pub dose_recommendation: DoseRecommendation,

    #[serde(default)]
    pub contraindications: Vec<Contraindication>,

    #[serde(default)]
    pub warnings: Vec<String>,

    #[serde(default)]
    pub max_duration_days: u32,

    /// Factor name to multiplier.
    #[serde(default)]
    pub uncertainty_factors_applied: BTreeMap<String, f64>,

    #[serde(default)]
    pub calculation_details: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub constituent_analysis: BTreeMap<String, ConstituentAnalysis>,

    #[serde(default)]
    pub family_duration_limits: BTreeMap<String, u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_this_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_timestamp: Option<String>,

    #[serde(default)]
    pub calculator_version: Option<String>,

    #[serde(default)]
    pub references: Vec<String>,
}

impl CalculationReport {
    /// Returns `true` if any contraindication is absolute.
    pub fn has_absolute_contraindication(&self) -> bool {
        self.contraindications
            .iter()
            .any(|c| c.kind == ContraindicationKind::Absolute)
    }

    /// Parses `calculation_timestamp`.
    ///
    /// The service emits naive ISO-8601 timestamps, read as UTC; RFC 3339 with
    /// an offset is accepted too.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.calculation_timestamp.as_deref()?.trim();
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
