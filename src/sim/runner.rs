//! Runs the estimator and reduces its samples to a [`SimulationResult`].

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use super::estimator::AepEstimator;
use super::types::SimulationResult;
use crate::error::{AepError, Result};
use crate::plant::PlantDataset;

/// Estimator wrapper enforcing the output contract.
#[derive(Clone)]
pub struct SimulationRunner {
    estimator: Arc<dyn AepEstimator>,
}

impl SimulationRunner {
    pub fn new(estimator: Arc<dyn AepEstimator>) -> Self {
        Self { estimator }
    }

    /// Runs `num_simulations` draws and summarizes them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSimulationCount` for zero, and `Simulation` if the
    /// estimator fails, returns the wrong number of samples, or returns a
    /// non-finite sample.
    pub fn run(&self, dataset: &PlantDataset, num_simulations: usize) -> Result<SimulationResult> {
        if num_simulations == 0 {
            return Err(AepError::InvalidSimulationCount(num_simulations));
        }

        let started = Instant::now();
        let distribution = self.estimator.simulate(dataset, num_simulations)?;

        if distribution.len() != num_simulations {
            return Err(AepError::Simulation(format!(
                "estimator returned {} samples, expected {num_simulations}",
                distribution.len()
            )));
        }
        if let Some(bad) = distribution.iter().find(|v| !v.is_finite()) {
            return Err(AepError::Simulation(format!(
                "estimator returned non-finite sample {bad}"
            )));
        }

        let result = SimulationResult::from_distribution(distribution).ok_or_else(|| {
            AepError::Simulation("estimator returned an empty distribution".into())
        })?;
        info!(
            num_simulations,
            mean_aep_gwh = result.mean_aep_gwh,
            p50_gwh = result.p50_gwh,
            p90_gwh = result.p90_gwh,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "simulation finished"
        );
        Ok(result)
    }
}
