//! Domain model of an exposure profile and of the calculation request.
//!
//! These types are the immutable snapshots that the wizard collects step by
//! step and that are serialized verbatim as the body of `POST /calculate`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::enums::{AgeCategory, BiochemicalFamily, PhysiologicalState, Route, Sex};
use crate::tolerance::{DEFAULT_DENSITY, DEFAULT_DROP_WEIGHT_MG};

fn default_density() -> f64 {
    DEFAULT_DENSITY
}

fn default_drop_weight() -> f64 {
    DEFAULT_DROP_WEIGHT_MG
}

fn default_occlusion_factor() -> f64 {
    1.0
}

fn default_air_change_rate() -> f64 {
    0.5
}

fn default_evaporation_rate() -> f64 {
    0.1
}

/// The exposed subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Body weight in kilograms.
    pub body_weight: f64,
    pub age_category: AgeCategory,
    pub sex: Sex,
    #[serde(default)]
    pub physiological_state: PhysiologicalState,
    /// Pathology identifiers (open set).
    #[serde(default)]
    pub pathologies: BTreeSet<String>,
    /// Ongoing treatment identifiers (open set).
    #[serde(default)]
    pub treatments: BTreeSet<String>,
}

/// A single chemical component of an essential oil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constituent {
    /// Free-text name, joined case- and accent-insensitively against the registry.
    pub name: String,

    /// Mass share of the parent oil, in [0, 1].
    #[serde(default)]
    pub fraction: f64,

    /// No-observed-adverse-effect level (mg/kg/day).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noael: Option<f64>,

    /// IFRA limit in the finished product (%).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifra_limit: Option<f64>,

    /// CIR limit (%).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cir_limit: Option<f64>,

    #[serde(default)]
    pub phototoxic: bool,

    /// Carcinogen, mutagen or reprotoxic.
    #[serde(default, rename = "cmr_status")]
    pub cmr: bool,

    /// Extra uncertainty multiplier specific to this constituent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_uf: Option<f64>,

    /// Oil this constituent came from when it results from a formula merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_oil: Option<String>,
}

impl Constituent {
    /// Creates a constituent with only a name and a fraction.
    pub fn new(name: impl Into<String>, fraction: f64) -> Self {
        Self {
            name: name.into(),
            fraction,
            noael: None,
            ifra_limit: None,
            cir_limit: None,
            phototoxic: false,
            cmr: false,
            additional_uf: None,
            source_oil: None,
        }
    }

    /// Returns `true` if the constituent carries a name and a positive fraction.
    pub fn is_filled(&self) -> bool {
        !self.name.trim().is_empty() && self.fraction > 0.0
    }
}

/// An essential oil as submitted to the dose service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssentialOil {
    pub name: String,

    /// Insertion-ordered; duplicate names are kept.
    #[serde(default)]
    pub constituents: Vec<Constituent>,

    #[serde(default)]
    pub dominant_family: BiochemicalFamily,

    /// Density in g/mL.
    #[serde(default = "default_density")]
    pub density: f64,

    /// Weight of one drop in mg.
    #[serde(default = "default_drop_weight")]
    pub drop_weight_mg: f64,

    /// Furocoumarin-depleted processing (citrus oils).
    #[serde(default)]
    pub defurocoumarinated: bool,

    /// Raw lab report, constituent name to percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gc_ms_data: Option<BTreeMap<String, f64>>,
}

impl EssentialOil {
    /// Creates an oil with default family, density and drop weight.
    pub fn new(name: impl Into<String>, constituents: Vec<Constituent>) -> Self {
        Self {
            name: name.into(),
            constituents,
            dominant_family: BiochemicalFamily::default(),
            density: DEFAULT_DENSITY,
            drop_weight_mg: DEFAULT_DROP_WEIGHT_MG,
            defurocoumarinated: false,
            gc_ms_data: None,
        }
    }

    /// Sum of all constituent fractions.
    pub fn total_fraction(&self) -> f64 {
        self.constituents.iter().map(|c| c.fraction).sum()
    }

    /// Converts a number of drops to milligrams.
    pub fn drops_to_mg(&self, drops: f64) -> f64 {
        drops * self.drop_weight_mg
    }

    /// Converts milligrams to a number of drops.
    pub fn mg_to_drops(&self, mg: f64) -> f64 {
        if self.drop_weight_mg > 0.0 {
            mg / self.drop_weight_mg
        } else {
            0.0
        }
    }

    /// Converts a volume in millilitres to milligrams.
    pub fn ml_to_mg(&self, ml: f64) -> f64 {
        ml * self.density * 1000.0
    }
}

/// One oil of a formula together with its share of the finished product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaEntry {
    pub oil: EssentialOil,
    /// Percentage of the formula (0-100].
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
}

/// A blend of several essential oils.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    #[serde(rename = "essential_oils", default)]
    pub entries: Vec<FormulaEntry>,

    /// Running sum of entry percentages.
    #[serde(default)]
    pub total_percentage: f64,

    /// Formula-weighted union of all constituents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_constituents: Vec<Constituent>,
}

impl Formula {
    /// Returns `true` if the formula has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// How the product is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub route: Route,

    /// Daily amount, in [`Route::amount_unit`].
    pub daily_amount: f64,

    pub duration_days: u32,

    // ===== Topical =====
    /// Application surface in cm².
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_area: Option<f64>,

    #[serde(default)]
    pub occlusion: bool,

    #[serde(default)]
    pub damaged_skin: bool,

    #[serde(default = "default_occlusion_factor")]
    pub occlusion_factor: f64,

    // ===== Inhalation =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_volume_m3: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_duration_min: Option<f64>,

    /// Air changes per hour.
    #[serde(default = "default_air_change_rate")]
    pub air_change_rate: f64,

    /// Evaporated share of the oil.
    #[serde(default = "default_evaporation_rate")]
    pub evaporation_rate: f64,
}

impl Application {
    /// Creates an application with route defaults and no optional fields.
    pub fn new(route: Route, daily_amount: f64, duration_days: u32) -> Self {
        Self {
            route,
            daily_amount,
            duration_days,
            application_area: None,
            occlusion: false,
            damaged_skin: false,
            occlusion_factor: default_occlusion_factor(),
            room_volume_m3: None,
            exposure_duration_min: None,
            air_change_rate: default_air_change_rate(),
            evaporation_rate: default_evaporation_rate(),
        }
    }

    /// Unit of [`Application::daily_amount`].
    pub fn amount_unit(&self) -> &'static str {
        self.route.amount_unit()
    }
}

/// Several products used on the same day, aggregated by the dose service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiProductExposure {
    pub products: Vec<BTreeMap<String, f64>>,
    #[serde(default)]
    pub total_sed_by_constituent: BTreeMap<String, f64>,
    #[serde(default)]
    pub ael_budget_consumed: BTreeMap<String, f64>,
}

/// The product part of a request: exactly one oil or one formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Product<'a> {
    Oil(&'a EssentialOil),
    Formula(&'a Formula),
}

/// Error for a request that does not carry exactly one product.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestShapeError {
    #[error("request carries neither an essential oil nor a formula")]
    MissingProduct,

    #[error("request carries both an essential oil and a formula")]
    BothProducts,
}

/// Body of `POST /calculate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub individual: Individual,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essential_oil: Option<EssentialOil>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<Formula>,

    pub application: Application,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_product_exposure: Option<MultiProductExposure>,
}

impl CalculationRequest {
    /// Builds a single-oil request.
    pub fn for_oil(individual: Individual, oil: EssentialOil, application: Application) -> Self {
        Self {
            individual,
            essential_oil: Some(oil),
            formula: None,
            application,
            multi_product_exposure: None,
        }
    }

    /// Builds a formula request.
    pub fn for_formula(individual: Individual, formula: Formula, application: Application) -> Self {
        Self {
            individual,
            essential_oil: None,
            formula: Some(formula),
            application,
            multi_product_exposure: None,
        }
    }

    /// Returns the product carried by the request.
    pub fn product(&self) -> Result<Product<'_>, RequestShapeError> {
        match (&self.essential_oil, &self.formula) {
            (Some(oil), None) => Ok(Product::Oil(oil)),
            (None, Some(formula)) => Ok(Product::Formula(formula)),
            (None, None) => Err(RequestShapeError::MissingProduct),
            (Some(_), Some(_)) => Err(RequestShapeError::BothProducts),
        }
    }

    /// Checks the exactly-one-product invariant.
    pub fn validate_shape(&self) -> Result<(), RequestShapeError> {
        self.product().map(|_| ())
    }
}
