//! Offline generation of precomputed artifacts.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info};

use crate::cache::{ArtifactStore, SimulationBackend};
use crate::error::Result;

/// Counts generated when none are given.
pub const DEFAULT_SIZES: [usize; 4] = [100, 300, 500, 1000];

/// Runs one simulation per size, in order, and writes each result as an
/// artifact. Existing artifacts for the same sizes are replaced.
///
/// Stops at the first failure; artifacts already written are kept.
///
/// # Errors
///
/// Returns the simulation or artifact error for the failing size.
pub fn precompute_all(
    backend: &dyn SimulationBackend,
    store: &ArtifactStore,
    sizes: &[usize],
) -> Result<Vec<PathBuf>> {
    let started = Instant::now();
    let mut written = Vec::with_capacity(sizes.len());

    for &n in sizes {
        info!(num_simulations = n, "running precompute");
        let result = backend.compute(n).inspect_err(|e| {
            error!(num_simulations = n, error = %e, "precompute failed");
        })?;
        written.push(store.save(&result)?);
    }

    info!(
        artifacts = written.len(),
        dir = %store.dir().display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "all precomputed results generated"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AepError;
    use crate::sim::SimulationResult;

    fn flat(n: usize) -> Result<SimulationResult> {
        SimulationResult::from_distribution(vec![12.0; n])
            .ok_or(AepError::InvalidSimulationCount(n))
    }

    #[test]
    fn writes_one_artifact_per_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let paths = precompute_all(&flat, &store, &[10, 30]).unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(store.load(10).unwrap().unwrap().num_simulations, 10);
        assert_eq!(store.load(30).unwrap().unwrap().distribution.len(), 30);
    }

    #[test]
    fn stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let backend = |n: usize| -> Result<SimulationResult> {
            if n == 20 {
                Err(AepError::Simulation("no overlap".into()))
            } else {
                flat(n)
            }
        };

        let err = precompute_all(&backend, &store, &[10, 20, 30]).unwrap_err();
        assert!(matches!(err, AepError::Simulation(_)));
        assert!(store.load(10).unwrap().is_some());
        assert!(store.load(30).unwrap().is_none());
    }
}
