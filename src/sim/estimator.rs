//! Monte Carlo AEP estimation.
//!
//! The [`AepEstimator`] trait is the seam between the caching layer and the
//! numerical method. [`MonteCarloAep`] is the bundled implementation: a
//! monthly operational assessment that regresses gross plant energy on
//! reanalysis wind speed and propagates meter, loss, regression, and
//! reanalysis-choice uncertainty by resampling.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::EstimatorConfig;
use crate::error::{AepError, Result};
use crate::plant::{PlantDataset, ReanalysisRecord};

/// kWh per GWh.
const KWH_PER_GWH: f64 = 1.0e6;

/// Produces a distribution of plausible AEP values for a plant.
///
/// Implementations must return exactly `num_simulations` samples in GWh.
/// They may be stochastic; callers must not assume repeatability.
pub trait AepEstimator: Send + Sync {
    /// Runs `num_simulations` independent AEP draws.
    ///
    /// # Errors
    ///
    /// Returns an `AepError` if the plant data cannot support an estimate.
    fn simulate(&self, plant: &PlantDataset, num_simulations: usize) -> Result<Vec<f64>>;
}

impl<F> AepEstimator for F
where
    F: Fn(&PlantDataset, usize) -> Result<Vec<f64>> + Send + Sync,
{
    fn simulate(&self, plant: &PlantDataset, num_simulations: usize) -> Result<Vec<f64>> {
        self(plant, num_simulations)
    }
}

/// Gaussian noise via the Box-Muller transform.
///
/// Returns `0.0` when `std_dev <= 0`.
pub fn gaussian_noise(rng: &mut impl Rng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

type MonthKey = (i32, u32);

fn month_key(t: &NaiveDateTime) -> MonthKey {
    (t.year(), t.month())
}

/// Plant energy totals for one calendar month (kWh).
#[derive(Debug, Clone, Copy, Default)]
struct MonthEnergy {
    net: f64,
    availability: f64,
    curtailment: f64,
}

/// One month usable for the regression: energy plus matching wind speed.
#[derive(Debug, Clone, Copy)]
struct MonthSample {
    energy: MonthEnergy,
    wind_speed: f64,
}

/// Reanalysis product reduced to regression inputs.
#[derive(Debug)]
struct Product {
    name: String,
    samples: Vec<MonthSample>,
    /// Long-term mean wind speed per calendar month (index 0 = January).
    climatology: [f64; 12],
}

/// Monthly operational-assessment Monte Carlo estimator.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloAep {
    config: EstimatorConfig,
}

impl MonteCarloAep {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    fn rng_for(&self, num_simulations: usize) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(num_simulations as u64)),
            None => StdRng::from_os_rng(),
        }
    }

    fn prepare(&self, plant: &PlantDataset) -> Result<Vec<Product>> {
        let energy = monthly_energy(plant);
        if energy.is_empty() {
            return Err(AepError::Simulation("plant has no metered energy".into()));
        }

        let mut products = Vec::new();
        for name in plant.reanalysis_products() {
            let records = plant.load_reanalysis(name)?;
            products.push(build_product(name, &records, &energy, self.config.min_months)?);
        }
        if products.is_empty() {
            return Err(AepError::Simulation(
                "no reanalysis products referenced by the plant".into(),
            ));
        }
        Ok(products)
    }

    fn draw(&self, product: &Product, rng: &mut StdRng) -> f64 {
        let meter_factor = 1.0 + gaussian_noise(rng, self.config.meter_uncertainty);
        let loss_factor = (1.0 + gaussian_noise(rng, self.config.loss_uncertainty)).max(0.0);

        let n = product.samples.len();
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        let mut losses = 0.0;
        let mut gross_total = 0.0;
        for _ in 0..n {
            let s = &product.samples[rng.random_range(0..n)];
            let loss = (s.energy.availability + s.energy.curtailment) * loss_factor;
            let gross = s.energy.net * meter_factor + loss;
            xs.push(s.wind_speed);
            ys.push(gross);
            losses += loss;
            gross_total += gross;
        }

        let (intercept, slope) = linear_fit(&xs, &ys);
        let loss_fraction = if gross_total > 0.0 {
            (losses / gross_total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let gross_lt: f64 = product
            .climatology
            .iter()
            .map(|ws| (intercept + slope * ws).max(0.0))
            .sum();
        gross_lt * (1.0 - loss_fraction) / KWH_PER_GWH
    }
}

impl AepEstimator for MonteCarloAep {
    fn simulate(&self, plant: &PlantDataset, num_simulations: usize) -> Result<Vec<f64>> {
        let products = self.prepare(plant)?;
        let mut rng = self.rng_for(num_simulations);

        let mut aep = Vec::with_capacity(num_simulations);
        for _ in 0..num_simulations {
            let product = &products[rng.random_range(0..products.len())];
            aep.push(self.draw(product, &mut rng));
        }
        debug!(
            num_simulations,
            products = ?products.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "monte carlo draws complete"
        );
        Ok(aep)
    }
}

fn monthly_energy(plant: &PlantDataset) -> BTreeMap<MonthKey, MonthEnergy> {
    let mut months: BTreeMap<MonthKey, MonthEnergy> = BTreeMap::new();
    for m in &plant.meter {
        months.entry(month_key(&m.time)).or_default().net += m.net_energy_kwh;
    }
    for c in &plant.curtail {
        // losses only count for months that were metered
        if let Some(month) = months.get_mut(&month_key(&c.time)) {
            month.availability += c.availability_kwh;
            month.curtailment += c.curtailment_kwh;
        }
    }
    months
}

fn build_product(
    name: &str,
    records: &[ReanalysisRecord],
    energy: &BTreeMap<MonthKey, MonthEnergy>,
    min_months: usize,
) -> Result<Product> {
    let mut sums: BTreeMap<MonthKey, (f64, usize)> = BTreeMap::new();
    for r in records {
        let e = sums.entry(month_key(&r.time)).or_default();
        e.0 += r.wind_speed_ms;
        e.1 += 1;
    }
    let monthly: BTreeMap<MonthKey, f64> = sums
        .into_iter()
        .map(|(k, (sum, count))| (k, sum / count as f64))
        .collect();

    let mut clim_sum = [0.0_f64; 12];
    let mut clim_count = [0_usize; 12];
    for (&(_, month), &ws) in &monthly {
        let idx = (month - 1) as usize;
        clim_sum[idx] += ws;
        clim_count[idx] += 1;
    }
    let mut climatology = [0.0_f64; 12];
    for idx in 0..12 {
        if clim_count[idx] == 0 {
            return Err(AepError::Simulation(format!(
                "reanalysis \"{name}\" has no data for calendar month {}",
                idx + 1
            )));
        }
        climatology[idx] = clim_sum[idx] / clim_count[idx] as f64;
    }

    let samples: Vec<MonthSample> = energy
        .iter()
        .filter_map(|(k, e)| {
            monthly.get(k).map(|&wind_speed| MonthSample {
                energy: *e,
                wind_speed,
            })
        })
        .collect();
    if samples.len() < min_months {
        return Err(AepError::Simulation(format!(
            "reanalysis \"{name}\" overlaps {} metered months, need at least {min_months}",
            samples.len()
        )));
    }

    Ok(Product {
        name: name.to_string(),
        samples,
        climatology,
    })
}

/// Ordinary least squares `y = a + b x`; degenerate inputs fall back to a
/// flat fit at the mean of `y`.
fn linear_fit(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    if xs.is_empty() {
        return (0.0, 0.0);
    }
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - mx) * (x - mx)).sum();
    if sxx <= f64::EPSILON {
        return (my, 0.0);
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope = sxy / sxx;
    (my - slope * mx, slope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_std_dev_gives_zero_noise() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
        assert_eq!(gaussian_noise(&mut rng, -1.0), 0.0);
    }

    #[test]
    fn gaussian_noise_is_roughly_standard() {
        let mut rng = StdRng::seed_from_u64(42);
        let draws: Vec<f64> = (0..20_000).map(|_| gaussian_noise(&mut rng, 2.0)).collect();
        let m = draws.iter().sum::<f64>() / draws.len() as f64;
        let var = draws.iter().map(|d| (d - m) * (d - m)).sum::<f64>() / draws.len() as f64;
        assert!(m.abs() < 0.1, "mean {m}");
        assert!((var.sqrt() - 2.0).abs() < 0.1, "std {}", var.sqrt());
    }

    #[test]
    fn linear_fit_recovers_line() {
        let xs = [4.0, 5.0, 6.0, 7.0];
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 + 2.0 * x).collect();
        let (a, b) = linear_fit(&xs, &ys);
        assert!((a - 3.0).abs() < 1e-9);
        assert!((b - 2.0).abs() < 1e-9);
    }

    #[test]
    fn linear_fit_flat_when_x_is_constant() {
        let (a, b) = linear_fit(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]);
        assert_eq!(b, 0.0);
        assert!((a - 2.0).abs() < 1e-12);
    }

    #[test]
    fn closures_are_estimators() {
        let fixed = |_: &PlantDataset, n: usize| -> Result<Vec<f64>> { Ok(vec![1.0; n]) };
        let plant = PlantDataset {
            metadata: Default::default(),
            scada: Vec::new(),
            meter: Vec::new(),
            curtail: Vec::new(),
            asset: Default::default(),
            reanalysis: Default::default(),
        };
        assert_eq!(fixed.simulate(&plant, 3).unwrap().len(), 3);
    }

    #[test]
    fn plant_without_meter_data_fails() {
        let plant = PlantDataset {
            metadata: Default::default(),
            scada: Vec::new(),
            meter: Vec::new(),
            curtail: Vec::new(),
            asset: Default::default(),
            reanalysis: Default::default(),
        };
        let err = MonteCarloAep::default().simulate(&plant, 10).unwrap_err();
        assert!(matches!(err, AepError::Simulation(_)));
    }
}
