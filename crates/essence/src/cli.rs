//! Clap CLI definitions for the `essence` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// essence -- essential-oil exposure profiles.
///
/// Builds exposure profiles (subject, single oil or formula, application)
/// from documents and GC-MS reports, and sends them to the dose-calculation
/// service.
#[derive(Parser, Debug)]
#[command(
    name = "essence",
    about = "Essential-oil exposure profile tool",
    long_about = "Builds exposure profiles (subject, single oil or formula, application) from documents and GC-MS reports, and sends them to the dose-calculation service.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Calculation service base URL (overrides service.url).
    #[arg(long, global = true)]
    pub url: Option<String>,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // ===== Setup & Configuration =====
    /// Create a .essence directory with a default configuration.
    Init(InitArgs),

    /// Inspect configuration.
    Config(ConfigArgs),

    // ===== Profiles =====
    /// Import a GC-MS report into an oil document.
    Import(ImportArgs),

    /// Compose a formula and show its merged constituents.
    Merge(MergeArgs),

    /// Check every step of a profile document.
    Validate(ValidateArgs),

    /// Run a profile document through the wizard and the calculation service.
    #[command(alias = "calc")]
    Calculate(CalculateArgs),

    /// Show reference values for known constituents.
    Registry(RegistryArgs),

    // ===== Service =====
    /// Probe the calculation service.
    Service(ServiceArgs),

    // ===== Utilities =====
    /// Generate shell completions.
    Completion(CompletionArgs),

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Arguments for `essence init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Service URL to store in the new configuration.
    #[arg(long)]
    pub service_url: Option<String>,

    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Arguments for `essence config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration after all layers.
    Show,
    /// Show the .essence directory in use.
    Path,
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Arguments for `essence import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// GC-MS report (comma-separated, one header line; `-` reads stdin).
    pub report: PathBuf,

    /// Oil name for the new document.
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Oil document to import into (its other fields are kept).
    #[arg(long)]
    pub into: Option<PathBuf>,

    /// Fill missing reference values from the constituent registry.
    #[arg(long)]
    pub enrich: bool,

    /// Write the resulting oil document here (.toml or .json).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Arguments for `essence merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Profile document with a `formula` list.
    pub document: PathBuf,

    /// Show the single merged oil instead of the constituent table.
    #[arg(long)]
    pub oil: bool,

    /// Fill missing reference values from the constituent registry first.
    #[arg(long)]
    pub enrich: bool,
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

/// Arguments for `essence validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Profile document to check.
    pub document: PathBuf,
}

// ---------------------------------------------------------------------------
// Calculate
// ---------------------------------------------------------------------------

/// Arguments for `essence calculate`.
#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// Complete profile document (subject, oil or formula, application).
    pub document: PathBuf,

    /// Print the request that would be sent and stop.
    #[arg(long)]
    pub dry_run: bool,

    /// Fill missing reference values from the constituent registry first.
    #[arg(long)]
    pub enrich: bool,

    /// Seconds to wait for the service (default: service.timeout-secs).
    #[arg(long)]
    pub timeout: Option<u64>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Arguments for `essence registry`.
#[derive(Args, Debug)]
pub struct RegistryArgs {
    /// Constituent to look up (any spelling; omit to list all).
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Arguments for `essence service`.
#[derive(Args, Debug)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommands,
}

/// Service subcommands.
#[derive(Subcommand, Debug)]
pub enum ServiceCommands {
    /// Check that the service answers.
    Health,
    /// Print the service's reference data.
    ReferenceData,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Arguments for `essence completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}
