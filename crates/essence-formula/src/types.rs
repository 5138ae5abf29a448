//! Error types and input documents for formula composition.

use essence_core::forms::{ApplicationForm, FormulaEntryDraft, OilDraft, SubjectForm};
use essence_core::validation::FieldErrors;
use serde::{Deserialize, Serialize};

/// Errors from loading documents or deriving views of a formula.
#[derive(Debug, thiserror::Error)]
pub enum FormulaError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("formula is not complete: {0}")]
    Incomplete(FieldErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error from a GC-MS import that produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("import failed: no usable constituent rows found")]
    NoRows,
}

/// Result alias for formula operations.
pub type Result<T> = std::result::Result<T, FormulaError>;

/// A saved exposure profile: subject, product and application, all optional.
///
/// A document describes either a single oil (`oil`) or a blend (`formula`);
/// it may also carry only the part being worked on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDocument {
    pub subject: SubjectForm,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub oil: Option<OilDraft>,

    #[serde(alias = "essential_oils", skip_serializing_if = "Vec::is_empty")]
    pub formula: Vec<FormulaEntryDraft>,

    pub application: ApplicationForm,

    /// Where this document was loaded from (set by the parser).
    #[serde(skip)]
    pub source: String,
}

impl SessionDocument {
    /// Returns `true` if the document describes a blend.
    pub fn is_formula(&self) -> bool {
        !self.formula.is_empty()
    }
}
