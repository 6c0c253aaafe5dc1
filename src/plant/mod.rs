//! Plant dataset assembly from raw SCADA, meter, and reanalysis files.

mod loader;
/// Column-role descriptor for the plant's data sources.
pub mod metadata;
pub mod time;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::error::LoadError;

pub use loader::{PlantLoader, PlantPaths};
pub use metadata::PlantMetadata;

/// One turbine telemetry sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ScadaRecord {
    /// UTC instant, timezone stripped.
    pub time: NaiveDateTime,
    pub asset_id: String,
    /// Average active power (kW), `None` when the source cell is empty.
    pub power_kw: Option<f64>,
    /// Average wind speed (m/s), `None` when the source cell is empty.
    pub wind_speed_ms: Option<f64>,
}

/// Revenue meter energy for one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterRecord {
    pub time: NaiveDateTime,
    pub net_energy_kwh: f64,
}

/// Availability and curtailment losses for one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurtailRecord {
    pub time: NaiveDateTime,
    pub availability_kwh: f64,
    pub curtailment_kwh: f64,
}

/// One reanalysis wind-speed sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReanalysisRecord {
    pub time: NaiveDateTime,
    pub wind_speed_ms: f64,
}

/// Normalized, immutable bundle of everything the estimator needs.
///
/// SCADA, meter, and curtailment tables are held in memory. The asset table
/// and reanalysis products are referenced by path and only read on demand
/// through [`PlantDataset::load_reanalysis`].
#[derive(Debug, Clone)]
pub struct PlantDataset {
    pub metadata: PlantMetadata,
    pub scada: Vec<ScadaRecord>,
    pub meter: Vec<MeterRecord>,
    pub curtail: Vec<CurtailRecord>,
    pub asset: PathBuf,
    pub reanalysis: BTreeMap<String, PathBuf>,
}

impl PlantDataset {
    /// Names of the referenced reanalysis products, in sorted order.
    pub fn reanalysis_products(&self) -> impl Iterator<Item = &str> {
        self.reanalysis.keys().map(String::as_str)
    }

    /// Reads and normalizes one reanalysis product.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if `name` is not referenced by this dataset or
    /// its file is missing or malformed.
    pub fn load_reanalysis(&self, name: &str) -> Result<Vec<ReanalysisRecord>, LoadError> {
        let path = self
            .reanalysis
            .get(name)
            .ok_or_else(|| LoadError::UnknownReanalysis {
                name: name.to_string(),
            })?;
        loader::read_reanalysis(path, &self.metadata.reanalysis_columns(name))
    }
}
