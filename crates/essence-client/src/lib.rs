//! Client for the remote dose-calculation service.
//!
//! [`CalculationService`] is the seam the wizard depends on;
//! [`HttpCalculationClient`] implements it over blocking HTTP.

pub mod error;
pub mod http;
pub mod traits;

pub use error::{ClientError, Result};
pub use http::HttpCalculationClient;
pub use traits::{CalculationService, HealthStatus};
