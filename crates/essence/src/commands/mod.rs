//! Command handlers, one module per subcommand.

pub mod calculate;
pub mod completion;
pub mod config_cmd;
pub mod import;
pub mod init;
pub mod merge;
pub mod registry;
pub mod service;
pub mod validate;
pub mod version;
