/// Estimator seam and the bundled Monte Carlo implementation.
pub mod estimator;
pub mod runner;
/// Mean, percentile, and standard deviation helpers.
pub mod stats;
pub mod types;

pub use estimator::{AepEstimator, MonteCarloAep};
pub use runner::SimulationRunner;
pub use types::SimulationResult;
