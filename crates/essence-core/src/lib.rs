//! Core types for the essence system.
//!
//! This crate holds the domain model of an exposure profile (subject, oils,
//! formulas, application), the closed option sets used by every form, the
//! constituent reference registry, the per-step validation rules, and the
//! shape of the report returned by the dose-calculation service.

pub mod enums;
pub mod forms;
pub mod model;
pub mod registry;
pub mod report;
pub mod tolerance;
pub mod validation;
