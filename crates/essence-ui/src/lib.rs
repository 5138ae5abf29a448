//! Terminal rendering for the essence tools.
//!
//! Provides Ayu-themed color styling, terminal detection, and text renderers
//! for calculation reports, formulas and validation errors.

pub mod report;
pub mod styles;
pub mod terminal;
