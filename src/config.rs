//! TOML-based service configuration and preset definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level service configuration parsed from TOML.
///
/// All fields have defaults matching the `on_demand` preset. Load from TOML
/// with [`ServiceConfig::from_toml_file`] or use a preset via
/// [`ServiceConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Plant data file locations.
    #[serde(default)]
    pub data: DataConfig,
    /// Result cache policy and bounds.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Monte Carlo estimator parameters.
    #[serde(default)]
    pub estimator: EstimatorConfig,
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Log filter and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Plant data file locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Plant metadata descriptor (JSON).
    pub metadata: PathBuf,
    /// Directory holding the data files below.
    pub data_dir: PathBuf,
    /// SCADA telemetry CSV.
    pub scada_file: String,
    /// Combined meter and curtailment CSV.
    pub plant_file: String,
    /// Asset table CSV (referenced, not parsed).
    pub asset_file: String,
    /// Reanalysis product name to CSV file.
    pub reanalysis: BTreeMap<String, String>,
    /// Load the dataset once and share it read-only across runs.
    pub reuse_dataset: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            metadata: PathBuf::from("data/plant_meta.json"),
            data_dir: PathBuf::from("data/la_haute_borne"),
            scada_file: "la-haute-borne-data-2014-2015.csv".to_string(),
            plant_file: "plant_data.csv".to_string(),
            asset_file: "la-haute-borne_asset_table.csv".to_string(),
            reanalysis: BTreeMap::from([
                ("era5".to_string(), "era5_wind_la_haute_borne.csv".to_string()),
                ("merra2".to_string(), "merra2_la_haute_borne.csv".to_string()),
            ]),
            reuse_dataset: false,
        }
    }
}

/// Result cache policy and bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// `"on_demand"`, `"precomputed"`, or `"single_slot"`.
    pub policy: String,
    /// Count used when a request omits `num_sim` (or, for `precomputed`,
    /// sends an invalid one).
    pub default_num_sim: usize,
    /// Smallest count accepted by `on_demand` (inclusive).
    pub min_num_sim: usize,
    /// Largest count accepted by `on_demand` (inclusive).
    pub max_num_sim: usize,
    /// Counts served by `precomputed`.
    pub allowed: Vec<usize>,
    /// Directory of `precomputed_<n>.json` artifacts.
    pub artifact_dir: PathBuf,
    /// Maximum entries kept by `on_demand` (0 = unbounded).
    pub capacity: usize,
    /// Let `precomputed` run the simulation when an artifact is missing.
    pub compute_missing: bool,
    /// Seconds a request waits for a computation before giving up.
    pub compute_timeout_secs: Option<u64>,
    /// The one count computed by `single_slot`.
    pub single_slot_num_sim: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: "on_demand".to_string(),
            default_num_sim: 100,
            min_num_sim: 10,
            max_num_sim: 5000,
            allowed: vec![100, 300, 500, 1000],
            artifact_dir: PathBuf::from("artifacts"),
            capacity: 64,
            compute_missing: false,
            compute_timeout_secs: None,
            single_slot_num_sim: 10,
        }
    }
}

/// Monte Carlo estimator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimatorConfig {
    /// Fixed seed for reproducible draws; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Relative standard deviation applied to metered energy.
    pub meter_uncertainty: f64,
    /// Relative standard deviation applied to availability and curtailment losses.
    pub loss_uncertainty: f64,
    /// Minimum metered months overlapping each reanalysis product.
    pub min_months: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            meter_uncertainty: 0.005,
            loss_uncertainty: 0.05,
            min_months: 12,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: String,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Log filter and output format.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"cache.policy"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ServiceConfig {
    /// Free-form counts, computed on first request and kept in an LRU.
    pub fn on_demand() -> Self {
        Self::default()
    }

    /// Counts snapped to the batch-precomputed set, served from artifacts.
    pub fn precomputed() -> Self {
        Self {
            cache: CacheConfig {
                policy: "precomputed".to_string(),
                ..CacheConfig::default()
            },
            ..Self::default()
        }
    }

    /// One small run computed at startup and served to every request.
    pub fn single_slot() -> Self {
        Self {
            cache: CacheConfig {
                policy: "single_slot".to_string(),
                ..CacheConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["on_demand", "precomputed", "single_slot"];

    /// Cache policy names accepted by `cache.policy`.
    pub const POLICIES: &[&str] = &["on_demand", "precomputed", "single_slot"];

    /// Loads configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "on_demand" => Ok(Self::on_demand()),
            "precomputed" => Ok(Self::precomputed()),
            "single_slot" => Ok(Self::single_slot()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let c = &self.cache;

        if !Self::POLICIES.contains(&c.policy.as_str()) {
            errors.push(ConfigError {
                field: "cache.policy".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    Self::POLICIES.join(", "),
                    c.policy
                ),
            });
        }
        if c.min_num_sim == 0 {
            errors.push(ConfigError {
                field: "cache.min_num_sim".into(),
                message: "must be > 0".into(),
            });
        }
        if c.min_num_sim > c.max_num_sim {
            errors.push(ConfigError {
                field: "cache.min_num_sim".into(),
                message: "must be <= cache.max_num_sim".into(),
            });
        }
        if c.single_slot_num_sim == 0 {
            errors.push(ConfigError {
                field: "cache.single_slot_num_sim".into(),
                message: "must be > 0".into(),
            });
        }
        if c.compute_timeout_secs == Some(0) {
            errors.push(ConfigError {
                field: "cache.compute_timeout_secs".into(),
                message: "must be > 0 when set".into(),
            });
        }

        match c.policy.as_str() {
            "on_demand" => {
                if !(c.min_num_sim..=c.max_num_sim).contains(&c.default_num_sim) {
                    errors.push(ConfigError {
                        field: "cache.default_num_sim".into(),
                        message: "must be within [cache.min_num_sim, cache.max_num_sim]".into(),
                    });
                }
            }
            "precomputed" => {
                if c.allowed.is_empty() || c.allowed.contains(&0) {
                    errors.push(ConfigError {
                        field: "cache.allowed".into(),
                        message: "must be a non-empty list of positive counts".into(),
                    });
                }
                if !c.allowed.contains(&c.default_num_sim) {
                    errors.push(ConfigError {
                        field: "cache.default_num_sim".into(),
                        message: "must be one of cache.allowed".into(),
                    });
                }
            }
            _ => {}
        }

        let e = &self.estimator;
        if e.meter_uncertainty.is_nan() || e.meter_uncertainty < 0.0 {
            errors.push(ConfigError {
                field: "estimator.meter_uncertainty".into(),
                message: "must be >= 0".into(),
            });
        }
        if e.loss_uncertainty.is_nan() || e.loss_uncertainty < 0.0 {
            errors.push(ConfigError {
                field: "estimator.loss_uncertainty".into(),
                message: "must be >= 0".into(),
            });
        }
        if e.min_months < 2 {
            errors.push(ConfigError {
                field: "estimator.min_months".into(),
                message: "must be >= 2".into(),
            });
        }

        if self.data.reanalysis.is_empty() {
            errors.push(ConfigError {
                field: "data.reanalysis".into(),
                message: "at least one reanalysis product is required".into(),
            });
        }

        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ConfigError {
                field: "server.bind".into(),
                message: format!("\"{}\" is not a socket address", self.server.bind),
            });
        }

        errors
    }
}
