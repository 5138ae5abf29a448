//! Configuration management for the essence tools.
//!
//! This crate handles layered loading of `.essence/config.yaml` (and an
//! optional `config.toml` next to it) with environment overrides, saving the
//! YAML file, and discovering `.essence/` directories in the filesystem.

pub mod config;
pub mod essence_dir;
