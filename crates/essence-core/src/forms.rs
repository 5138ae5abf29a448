//! Raw form state for each wizard step.
//!
//! Forms hold whatever the user has typed so far, with optional numbers and
//! blank rows allowed. They turn into model snapshots only through the
//! `to_*` conversions, which run the matching validator first.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::enums::{AgeCategory, BiochemicalFamily, PhysiologicalState, Route, Sex};
use crate::model::{Application, Constituent, EssentialOil, Individual};
use crate::tolerance::{DEFAULT_DENSITY, DEFAULT_DROP_WEIGHT_MG};
use crate::validation::{
    FieldErrors, validate_application, validate_single_oil, validate_subject,
};

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// Step 1 form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectForm {
    pub body_weight: Option<f64>,
    pub age_category: AgeCategory,
    pub sex: Sex,
    pub physiological_state: PhysiologicalState,
    pub pathologies: BTreeSet<String>,
    pub treatments: BTreeSet<String>,
}

impl SubjectForm {
    /// Validates the form and returns the subject snapshot.
    pub fn to_individual(&self) -> Result<Individual, FieldErrors> {
        validate_subject(self).into_result()?;
        Ok(Individual {
            body_weight: self.body_weight.unwrap_or_default(),
            age_category: self.age_category,
            sex: self.sex,
            physiological_state: self.physiological_state,
            pathologies: clean_set(&self.pathologies),
            treatments: clean_set(&self.treatments),
        })
    }
}

fn clean_set(values: &BTreeSet<String>) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

// ---------------------------------------------------------------------------
// Oil
// ---------------------------------------------------------------------------

/// An oil under edition, either for the single-oil step or as a formula entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OilDraft {
    pub name: String,
    pub constituents: Vec<Constituent>,
    pub dominant_family: BiochemicalFamily,
    pub density: Option<f64>,
    pub drop_weight_mg: Option<f64>,
    pub defurocoumarinated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gc_ms_data: Option<BTreeMap<String, f64>>,
}

impl OilDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rows with a non-blank name and a strictly positive fraction.
    ///
    /// Blank rows left over from the editor are dropped here, before any sum
    /// rule is evaluated.
    pub fn filled_constituents(&self) -> Vec<Constituent> {
        self.constituents
            .iter()
            .filter(|c| c.is_filled())
            .map(|c| Constituent {
                name: c.name.trim().to_owned(),
                ..c.clone()
            })
            .collect()
    }

    /// Builds an oil from the filled rows, applying density and drop defaults.
    ///
    /// Performs no validation; callers pick the rule set that applies.
    pub fn build_oil(&self) -> EssentialOil {
        EssentialOil {
            name: self.name.trim().to_owned(),
            constituents: self.filled_constituents(),
            dominant_family: self.dominant_family,
            density: self.density.unwrap_or(DEFAULT_DENSITY),
            drop_weight_mg: self.drop_weight_mg.unwrap_or(DEFAULT_DROP_WEIGHT_MG),
            defurocoumarinated: self.defurocoumarinated,
            gc_ms_data: self.gc_ms_data.clone(),
        }
    }

    /// Validates the draft under the single-oil rules and returns the oil.
    pub fn to_single_oil(&self) -> Result<EssentialOil, FieldErrors> {
        validate_single_oil(self).into_result()?;
        Ok(self.build_oil())
    }
}

impl From<&EssentialOil> for OilDraft {
    fn from(oil: &EssentialOil) -> Self {
        Self {
            name: oil.name.clone(),
            constituents: oil.constituents.clone(),
            dominant_family: oil.dominant_family,
            density: Some(oil.density),
            drop_weight_mg: Some(oil.drop_weight_mg),
            defurocoumarinated: oil.defurocoumarinated,
            gc_ms_data: oil.gc_ms_data.clone(),
        }
    }
}

/// An oil about to be added to a formula.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaEntryDraft {
    #[serde(flatten)]
    pub oil: OilDraft,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
}

impl FormulaEntryDraft {
    pub fn new(oil: OilDraft, percentage: f64) -> Self {
        Self {
            oil,
            percentage: Some(percentage),
            lot: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Step 3 form. Carries fields for every route; only the selected route's
/// fields survive conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationForm {
    pub route: Route,
    pub daily_amount: Option<f64>,
    pub duration_days: Option<i64>,

    pub application_area: Option<f64>,
    pub occlusion: bool,
    pub occlusion_factor: Option<f64>,
    pub damaged_skin: bool,

    pub room_volume_m3: Option<f64>,
    pub exposure_duration_min: Option<f64>,
    pub air_change_rate: Option<f64>,
    pub evaporation_rate: Option<f64>,
}

impl ApplicationForm {
    /// Validates the form and returns the application snapshot.
    pub fn to_application(&self) -> Result<Application, FieldErrors> {
        validate_application(self).into_result()?;

        let days = self
            .duration_days
            .and_then(|d| u32::try_from(d).ok())
            .unwrap_or_default();
        let mut application =
            Application::new(self.route, self.daily_amount.unwrap_or_default(), days);

        match self.route {
            Route::Topical => {
                application.application_area = self.application_area;
                application.occlusion = self.occlusion;
                application.damaged_skin = self.damaged_skin;
                if let Some(factor) = self.occlusion_factor {
                    application.occlusion_factor = factor;
                }
            }
            Route::Inhalation => {
                application.room_volume_m3 = self.room_volume_m3;
                application.exposure_duration_min = self.exposure_duration_min;
                if let Some(rate) = self.air_change_rate {
                    application.air_change_rate = rate;
                }
                if let Some(rate) = self.evaporation_rate {
                    application.evaporation_rate = rate;
                }
            }
            Route::Oral => {}
        }
        Ok(application)
    }
}
