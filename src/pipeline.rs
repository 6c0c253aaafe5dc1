//! Load-then-simulate pipeline backing the result cache.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::cache::SimulationBackend;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::plant::{PlantDataset, PlantLoader, PlantPaths};
use crate::sim::{MonteCarloAep, SimulationResult, SimulationRunner};

/// Loads the plant and runs the simulation for one count.
///
/// By default every computation reloads the plant. With dataset reuse on,
/// the first successful load is kept and shared read-only by later runs.
pub struct PlantSimulator {
    loader: PlantLoader,
    runner: SimulationRunner,
    reuse_dataset: bool,
    dataset: Mutex<Option<Arc<PlantDataset>>>,
}

impl PlantSimulator {
    pub fn new(loader: PlantLoader, runner: SimulationRunner) -> Self {
        Self {
            loader,
            runner,
            reuse_dataset: false,
            dataset: Mutex::new(None),
        }
    }

    pub fn reuse_dataset(mut self, reuse: bool) -> Self {
        self.reuse_dataset = reuse;
        self
    }

    /// Wires the loader and the bundled Monte Carlo estimator from config.
    pub fn from_config(cfg: &ServiceConfig) -> Self {
        let loader = PlantLoader::new(PlantPaths::from_config(&cfg.data));
        let runner = SimulationRunner::new(Arc::new(MonteCarloAep::new(cfg.estimator.clone())));
        Self::new(loader, runner).reuse_dataset(cfg.data.reuse_dataset)
    }

    pub fn loader(&self) -> &PlantLoader {
        &self.loader
    }

    /// Runs one load and simulation.
    ///
    /// # Errors
    ///
    /// Returns `AepError::Load` if the plant cannot be assembled, or a
    /// simulation error from the runner.
    pub fn simulate(&self, num_simulations: usize) -> Result<SimulationResult> {
        let dataset = self.dataset()?;
        self.runner.run(&dataset, num_simulations)
    }

    fn dataset(&self) -> Result<Arc<PlantDataset>> {
        if !self.reuse_dataset {
            return Ok(Arc::new(self.loader.load()?));
        }
        let mut shared = self.dataset.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = shared.as_ref() {
            debug!("reusing loaded plant dataset");
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(self.loader.load()?);
        *shared = Some(Arc::clone(&dataset));
        Ok(dataset)
    }
}

impl SimulationBackend for PlantSimulator {
    fn compute(&self, num_simulations: usize) -> Result<SimulationResult> {
        self.simulate(num_simulations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AepError;
    use crate::plant::PlantDataset;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn write_minimal_plant(dir: &std::path::Path) -> PlantPaths {
        std::fs::write(dir.join("meta.json"), "{}").unwrap();
        std::fs::write(
            dir.join("scada.csv"),
            "Date_time,Wind_turbine_name,P_avg,Ws_avg\n2014-01-01T00:00:00Z,R80711,500,7\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("plant.csv"),
            "time_utc,net_energy_kwh,availability_kwh,curtailment_kwh\n2014-01-01 00:00,100,0,0\n",
        )
        .unwrap();
        std::fs::write(dir.join("asset.csv"), "Wind_turbine_name\nR80711\n").unwrap();
        PlantPaths {
            metadata: dir.join("meta.json"),
            scada: dir.join("scada.csv"),
            plant: dir.join("plant.csv"),
            asset: dir.join("asset.csv"),
            reanalysis: BTreeMap::new(),
        }
    }

    fn counting_runner(samples: Arc<AtomicUsize>) -> SimulationRunner {
        SimulationRunner::new(Arc::new(move |plant: &PlantDataset, n: usize| -> Result<Vec<f64>> {
            samples.fetch_add(1, Ordering::SeqCst);
            assert_eq!(plant.scada.len(), 1);
            Ok(vec![10.0; n])
        }))
    }

    #[test]
    fn simulate_loads_and_runs() {
        let dir = tempfile::tempdir().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let sim = PlantSimulator::new(
            PlantLoader::new(write_minimal_plant(dir.path())),
            counting_runner(runs.clone()),
        );
        let result = sim.compute(5).unwrap();
        assert_eq!(result.num_simulations, 5);
        assert_eq!(result.p50_gwh, 10.0);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reused_dataset_survives_file_removal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_minimal_plant(dir.path());
        let sim = PlantSimulator::new(
            PlantLoader::new(paths.clone()),
            counting_runner(Arc::default()),
        )
        .reuse_dataset(true);

        sim.compute(3).unwrap();
        std::fs::remove_file(&paths.scada).unwrap();
        assert!(sim.compute(3).is_ok());
    }

    #[test]
    fn load_failure_surfaces_as_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_minimal_plant(dir.path());
        paths.plant = dir.path().join("absent.csv");
        let sim = PlantSimulator::new(PlantLoader::new(paths), counting_runner(Arc::default()));
        assert!(matches!(sim.compute(3), Err(AepError::Load(_))));
    }
}
