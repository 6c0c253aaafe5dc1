//! Simulation output types.

use serde::{Deserialize, Serialize};

use super::stats::{mean, percentile, population_std_dev};

/// Percentile used for the `p90_GWh` field.
///
/// P90 is the exceedance level: the yield that 90% of simulated years
/// exceed, i.e. the 10th percentile of the distribution. Downstream
/// consumers depend on this convention; do not change it to 90.
pub const P90_PERCENTILE: f64 = 10.0;

/// Percentile used for the `p50_GWh` field.
pub const P50_PERCENTILE: f64 = 50.0;

/// Summary of one Monte Carlo AEP run.
///
/// Serialized field names match the persisted artifact format and the
/// `/analysis/aep` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// AEP per simulated year (GWh), in estimator order.
    pub distribution: Vec<f64>,
    #[serde(rename = "mean_aep_GWh")]
    pub mean_aep_gwh: f64,
    #[serde(rename = "p50_GWh")]
    pub p50_gwh: f64,
    /// 10th percentile of `distribution`, see [`P90_PERCENTILE`].
    #[serde(rename = "p90_GWh")]
    pub p90_gwh: f64,
    /// Population standard deviation (GWh).
    pub std_dev: f64,
    /// Artifacts written before this field existed omit it; zero means
    /// "take it from the distribution length".
    #[serde(default)]
    pub num_simulations: usize,
}

impl SimulationResult {
    /// Reduces a sample distribution to summary statistics.
    ///
    /// Returns `None` for an empty distribution.
    pub fn from_distribution(distribution: Vec<f64>) -> Option<Self> {
        let p50_gwh = percentile(&distribution, P50_PERCENTILE)?;
        let p90_gwh = percentile(&distribution, P90_PERCENTILE)?;
        Some(Self {
            mean_aep_gwh: mean(&distribution),
            p50_gwh,
            p90_gwh,
            std_dev: population_std_dev(&distribution),
            num_simulations: distribution.len(),
            distribution,
        })
    }

    /// Uncertainty spread between the median and the P90 yield (GWh).
    pub fn spread_gwh(&self) -> f64 {
        self.p50_gwh - self.p90_gwh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p90_is_tenth_percentile_not_ninetieth() {
        let dist: Vec<f64> = (0..=100).map(f64::from).collect();
        let r = SimulationResult::from_distribution(dist).unwrap();
        assert!((r.p90_gwh - 10.0).abs() < 1e-9);
        assert!((r.p50_gwh - 50.0).abs() < 1e-9);
        assert!(r.p90_gwh < r.p50_gwh);
    }

    #[test]
    fn counts_and_mean_follow_distribution() {
        let r = SimulationResult::from_distribution(vec![10.0, 12.0, 14.0, 16.0]).unwrap();
        assert_eq!(r.num_simulations, 4);
        assert!((r.mean_aep_gwh - 13.0).abs() < 1e-12);
        assert!((r.spread_gwh() - (r.p50_gwh - r.p90_gwh)).abs() < 1e-12);
    }

    #[test]
    fn empty_distribution_has_no_summary() {
        assert!(SimulationResult::from_distribution(Vec::new()).is_none());
    }

    #[test]
    fn serialized_field_names() {
        let r = SimulationResult::from_distribution(vec![1.0, 2.0]).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        for key in [
            "distribution",
            "mean_aep_GWh",
            "p50_GWh",
            "p90_GWh",
            "std_dev",
            "num_simulations",
        ] {
            assert!(json.get(key).is_some(), "missing key: {key}");
        }
    }
}
