//! Formula composition for essential-oil blends.
//!
//! Oils are folded into a [`Formula`](essence_core::model::Formula) one entry
//! at a time, each entry checked for mass completeness before it is committed.
//! Constituent lists can be fed from a GC-MS lab report, and whole sessions can
//! be loaded from TOML or JSON documents.

pub mod engine;
pub mod gcms;
pub mod parser;
pub mod types;
