//! Population policies and request-count resolution.

use crate::config::{CacheConfig, ConfigError};
use crate::error::{AepError, Result};

/// How cache keys are chosen and how a missing key gets populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePolicy {
    /// One count, computed once; every request is served that slot
    /// whatever count it asked for. Trades resolution for bounded cost.
    SingleSlot { num_simulations: usize },
    /// A fixed set of counts whose results are produced offline by the batch
    /// driver and read from artifacts.
    Precomputed {
        /// Sorted ascending, no duplicates.
        allowed: Vec<usize>,
        default: usize,
        /// Run the simulation when an allowed count has no artifact.
        compute_missing: bool,
    },
    /// Any count in `[min, max]`, computed on first request and retained.
    OnDemand {
        min: usize,
        max: usize,
        default: usize,
        /// Most entries kept; `0` means unbounded.
        capacity: usize,
    },
}

impl CachePolicy {
    /// Builds the policy named by `cfg.policy`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown policy name or an empty
    /// precomputed set.
    pub fn from_config(cfg: &CacheConfig) -> std::result::Result<Self, ConfigError> {
        match cfg.policy.as_str() {
            "single_slot" => Ok(Self::SingleSlot {
                num_simulations: cfg.single_slot_num_sim,
            }),
            "precomputed" => {
                let mut allowed: Vec<usize> =
                    cfg.allowed.iter().copied().filter(|&n| n > 0).collect();
                allowed.sort_unstable();
                allowed.dedup();
                if allowed.is_empty() {
                    return Err(ConfigError {
                        field: "cache.allowed".into(),
                        message: "must contain at least one positive count".into(),
                    });
                }
                let default = if allowed.contains(&cfg.default_num_sim) {
                    cfg.default_num_sim
                } else {
                    allowed[0]
                };
                Ok(Self::Precomputed {
                    allowed,
                    default,
                    compute_missing: cfg.compute_missing,
                })
            }
            "on_demand" => Ok(Self::OnDemand {
                min: cfg.min_num_sim,
                max: cfg.max_num_sim,
                default: cfg.default_num_sim,
                capacity: cfg.capacity,
            }),
            other => Err(ConfigError {
                field: "cache.policy".into(),
                message: format!("unknown policy \"{other}\""),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleSlot { .. } => "single_slot",
            Self::Precomputed { .. } => "precomputed",
            Self::OnDemand { .. } => "on_demand",
        }
    }

    /// Entry bound; `None` when the policy never evicts.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::OnDemand { capacity, .. } if *capacity > 0 => Some(*capacity),
            _ => None,
        }
    }

    /// Maps the raw `num_sim` query value to the cache key to serve.
    ///
    /// - `SingleSlot`: always the slot count.
    /// - `Precomputed`: the nearest allowed count (ties go to the smaller
    ///   one); absent, non-integer, or non-positive values use the default.
    /// - `OnDemand`: absent values use the default; anything that is not an
    ///   integer in `[min, max]` is rejected.
    ///
    /// # Errors
    ///
    /// Returns `AepError::Validation` for rejected `OnDemand` values.
    pub fn resolve(&self, requested: Option<&str>) -> Result<usize> {
        let requested = requested.map(str::trim).filter(|s| !s.is_empty());
        match self {
            Self::SingleSlot { num_simulations } => Ok(*num_simulations),
            Self::Precomputed {
                allowed, default, ..
            } => {
                let value = requested.and_then(|raw| raw.parse::<i64>().ok());
                match value {
                    Some(v) if v > 0 => Ok(nearest(allowed, v as u64).unwrap_or(*default)),
                    _ => Ok(*default),
                }
            }
            Self::OnDemand {
                min, max, default, ..
            } => {
                let Some(raw) = requested else {
                    return Ok(*default);
                };
                let value = raw.parse::<i64>().map_err(|_| {
                    AepError::Validation(format!("num_sim must be an integer, got \"{raw}\""))
                })?;
                if value < *min as i64 || value > *max as i64 {
                    return Err(AepError::Validation(format!(
                        "num_sim must be between {min} and {max}, got {value}"
                    )));
                }
                Ok(value as usize)
            }
        }
    }

    /// Key under which a count is stored; single-slot folds every count
    /// onto its one slot.
    pub fn key_for(&self, num_simulations: usize) -> usize {
        match self {
            Self::SingleSlot { num_simulations: slot } => *slot,
            _ => num_simulations,
        }
    }
}

fn nearest(allowed: &[usize], value: u64) -> Option<usize> {
    allowed
        .iter()
        .copied()
        .min_by_key(|&a| (a as u64).abs_diff(value))
}
