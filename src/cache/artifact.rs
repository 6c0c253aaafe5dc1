//! On-disk precomputed results, one JSON file per simulation count.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{AepError, Result};
use crate::sim::SimulationResult;

/// Directory of `precomputed_<n>.json` artifacts.
///
/// Artifacts hold a bare [`SimulationResult`]; risk is never persisted.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, num_simulations: usize) -> PathBuf {
        self.dir.join(format!("precomputed_{num_simulations}.json"))
    }

    /// Reads the artifact for `num_simulations`, `Ok(None)` if absent.
    ///
    /// Artifacts without a `num_simulations` field take it from the
    /// distribution length.
    ///
    /// # Errors
    ///
    /// Returns `AepError::Artifact` if the file is unreadable, not valid
    /// JSON, or its sample count disagrees with `num_simulations`.
    pub fn load(&self, num_simulations: usize) -> Result<Option<SimulationResult>> {
        let path = self.path_for(num_simulations);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(artifact_error(&path, e.to_string())),
        };
        let mut result: SimulationResult =
            serde_json::from_str(&raw).map_err(|e| artifact_error(&path, e.to_string()))?;

        if result.num_simulations == 0 {
            result.num_simulations = result.distribution.len();
        }
        if result.distribution.len() != num_simulations
            || result.num_simulations != num_simulations
        {
            return Err(artifact_error(
                &path,
                format!(
                    "holds {} samples (num_simulations {}), expected {num_simulations}",
                    result.distribution.len(),
                    result.num_simulations
                ),
            ));
        }
        debug!(path = %path.display(), num_simulations, "artifact loaded");
        Ok(Some(result))
    }

    /// Writes `result` to its artifact path, replacing any previous file.
    ///
    /// The JSON is written to a temporary sibling first and renamed into
    /// place so readers never observe a partial file.
    ///
    /// # Errors
    ///
    /// Returns `AepError::Artifact` if the directory or file cannot be written.
    pub fn save(&self, result: &SimulationResult) -> Result<PathBuf> {
        let path = self.path_for(result.num_simulations);
        fs::create_dir_all(&self.dir).map_err(|e| artifact_error(&self.dir, e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        let body =
            serde_json::to_vec_pretty(result).map_err(|e| artifact_error(&path, e.to_string()))?;
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&body)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| artifact_error(&path, e.to_string()))?;

        info!(path = %path.display(), num_simulations = result.num_simulations, "artifact written");
        Ok(path)
    }
}

fn artifact_error(path: &Path, message: String) -> AepError {
    AepError::Artifact {
        path: path.to_path_buf(),
        message,
    }
}
