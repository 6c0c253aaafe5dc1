//! Command-line interface.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::{ConfigError, ServiceConfig};

#[derive(Parser, Debug)]
#[command(
    name = "windfarm-aep",
    version,
    about = "Wind farm AEP analytics: plant summary, Monte Carlo AEP, cached results"
)]
pub struct Cli {
    /// Load configuration from a TOML file
    #[arg(long, global = true, env = "WINDFARM_AEP_CONFIG", conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Use a built-in preset (on_demand, precomputed, single_slot)
    #[arg(long, global = true)]
    pub preset: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        /// Socket address to bind, overriding `server.bind`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Generate precomputed artifacts for a set of simulation counts
    Precompute {
        /// Counts to generate (defaults to 100,300,500,1000)
        #[arg(long, value_delimiter = ',')]
        sizes: Vec<usize>,
        /// Output directory, overriding `cache.artifact_dir`
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Run one simulation and print its summary
    Simulate {
        #[arg(long, default_value_t = 100)]
        num_sim: usize,
        /// Write the sampled distribution to a CSV file
        #[arg(long)]
        distribution_out: Option<PathBuf>,
    },
    /// Print the SCADA summary
    Analyze,
}

impl Cli {
    /// Resolves the configuration: `--config` file, then `--preset`, then
    /// the default preset. Subcommand overrides are applied on top.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file or preset cannot be loaded.
    pub fn service_config(&self) -> Result<ServiceConfig, ConfigError> {
        let mut cfg = match (&self.config, &self.preset) {
            (Some(path), _) => ServiceConfig::from_toml_file(Path::new(path))?,
            (None, Some(name)) => ServiceConfig::from_preset(name)?,
            (None, None) => ServiceConfig::default(),
        };

        match &self.command {
            Command::Serve { bind: Some(bind) } => cfg.server.bind = bind.clone(),
            Command::Precompute {
                out_dir: Some(dir), ..
            } => cfg.cache.artifact_dir = dir.clone(),
            _ => {}
        }
        Ok(cfg)
    }
}
