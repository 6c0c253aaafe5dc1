//! Error taxonomy shared by the loader, runner, cache, and API layers.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, AepError>;

/// Failure while assembling a [`PlantDataset`](crate::plant::PlantDataset).
///
/// Every variant names the offending file; a dataset is all-or-nothing.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid metadata in \"{path}\": {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid CSV in \"{path}\": {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("column \"{column}\" missing from \"{path}\"")]
    MissingColumn { path: PathBuf, column: String },
    #[error("malformed value in \"{path}\" at row {row}: {message}")]
    Malformed {
        path: PathBuf,
        row: usize,
        message: String,
    },
    #[error("referenced file \"{path}\" does not exist")]
    Missing { path: PathBuf },
    #[error("unknown reanalysis product \"{name}\"")]
    UnknownReanalysis { name: String },
}

/// Top-level error for simulation, caching, and request handling.
#[derive(Debug, Error)]
pub enum AepError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("simulation failed: {0}")]
    Simulation(String),
    #[error("number of simulations must be positive, got {0}")]
    InvalidSimulationCount(usize),
    #[error("{0}")]
    Validation(String),
    #[error("artifact \"{path}\": {message}")]
    Artifact { path: PathBuf, message: String },
    #[error("simulation for {num_simulations} runs did not finish within {seconds}s, retry later")]
    Timeout { num_simulations: usize, seconds: u64 },
    #[error("background task failed: {0}")]
    Task(String),
}

impl AepError {
    /// Whether a caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_names_the_path() {
        let err = AepError::from(LoadError::Missing {
            path: PathBuf::from("data/era5.csv"),
        });
        assert!(err.to_string().contains("data/era5.csv"));
    }

    #[test]
    fn only_timeouts_are_retryable() {
        let timeout = AepError::Timeout {
            num_simulations: 100,
            seconds: 5,
        };
        assert!(timeout.is_retryable());
        assert!(!AepError::Simulation("boom".into()).is_retryable());
    }
}
