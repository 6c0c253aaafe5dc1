//! API response and query types.
//!
//! AEP field names match the artifact JSON (`mean_aep_GWh`, `p50_GWh`, ...).

use serde::{Deserialize, Serialize};

use crate::cache::EntrySummary;
use crate::risk::RiskAssessment;
use crate::sim::SimulationResult;

/// Liveness marker for `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// Query parameters for `GET /analysis/aep`.
///
/// `num_sim` stays a string so the cache policy decides how to treat values
/// that are not integers.
#[derive(Debug, Deserialize)]
pub struct AepQuery {
    pub num_sim: Option<String>,
}

/// Simulation result with its risk annotation.
#[derive(Debug, Serialize)]
pub struct AepResponse {
    #[serde(flatten)]
    pub result: SimulationResult,
    pub risk: RiskAssessment,
}

/// Body of `GET /analysis/aep/cache`.
#[derive(Debug, Serialize)]
pub struct CacheStatusResponse {
    pub policy: &'static str,
    /// `None` when the policy never evicts.
    pub capacity: Option<usize>,
    pub entries: Vec<EntrySummary>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
