//! The service seam consumed by the wizard.

use essence_core::model::CalculationRequest;
use essence_core::report::CalculationReport;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Body of `GET /healthz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// A dose-calculation backend.
///
/// Implementations perform exactly one call per method invocation and never
/// retry. Keeping a single request in flight is the caller's job.
pub trait CalculationService: Send + Sync {
    /// Submits a request and returns the report.
    fn calculate(&self, request: &CalculationRequest) -> Result<CalculationReport>;

    /// Probes service liveness.
    fn health(&self) -> Result<HealthStatus>;

    /// Fetches the reference tables the service calculates with.
    fn reference_data(&self) -> Result<serde_json::Value>;
}
