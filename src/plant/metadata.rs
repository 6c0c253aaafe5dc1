//! Plant metadata descriptor: which source column plays which role.
//!
//! The JSON layout follows the IEC-style tag names used by operational
//! assessment tooling (`WTUR_W`, `MMTR_SupWh`, ...). Unknown keys are ignored
//! so full upstream descriptors can be used unchanged.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;

/// Canonical name bound to the meter and curtailment time columns.
pub const CANONICAL_TIME_COLUMN: &str = "time_utc";

/// Column roles for every data source of a plant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlantMetadata {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Installed capacity (MW).
    pub capacity: Option<f64>,
    pub scada: ScadaColumns,
    pub meter: MeterColumns,
    pub curtail: CurtailColumns,
    pub reanalysis: BTreeMap<String, ReanalysisColumns>,
}

/// SCADA telemetry column bindings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScadaColumns {
    pub time: String,
    pub asset_id: String,
    /// Average active power (kW).
    #[serde(rename = "WTUR_W")]
    pub power: String,
    /// Average nacelle wind speed (m/s).
    #[serde(rename = "WMET_HorWdSpd")]
    pub wind_speed: String,
}

impl Default for ScadaColumns {
    fn default() -> Self {
        Self {
            time: "Date_time".to_string(),
            asset_id: "Wind_turbine_name".to_string(),
            power: "P_avg".to_string(),
            wind_speed: "Ws_avg".to_string(),
        }
    }
}

/// Revenue meter column bindings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeterColumns {
    pub time: String,
    #[serde(rename = "MMTR_SupWh")]
    pub net_energy: String,
}

impl Default for MeterColumns {
    fn default() -> Self {
        Self {
            time: CANONICAL_TIME_COLUMN.to_string(),
            net_energy: "net_energy_kwh".to_string(),
        }
    }
}

/// Availability and curtailment loss column bindings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CurtailColumns {
    pub time: String,
    #[serde(rename = "IAVL_DnWh")]
    pub availability: String,
    #[serde(rename = "IAVL_ExtPwrDnWh")]
    pub curtailment: String,
}

impl Default for CurtailColumns {
    fn default() -> Self {
        Self {
            time: CANONICAL_TIME_COLUMN.to_string(),
            availability: "availability_kwh".to_string(),
            curtailment: "curtailment_kwh".to_string(),
        }
    }
}

/// Reanalysis product column bindings.
///
/// Products publish either a horizontal wind speed or its `u`/`v`
/// components; the loader uses whichever the file actually carries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReanalysisColumns {
    pub time: String,
    #[serde(rename = "WMETR_HorWdSpd")]
    pub wind_speed: Option<String>,
    #[serde(rename = "WMETR_HorWdSpdU")]
    pub wind_u: Option<String>,
    #[serde(rename = "WMETR_HorWdSpdV")]
    pub wind_v: Option<String>,
}

impl Default for ReanalysisColumns {
    fn default() -> Self {
        Self {
            time: "datetime".to_string(),
            wind_speed: Some("ws_100m".to_string()),
            wind_u: Some("u_50".to_string()),
            wind_v: Some("v_50".to_string()),
        }
    }
}

impl PlantMetadata {
    /// Reads the descriptor and rebinds the meter and curtailment time
    /// columns to [`CANONICAL_TIME_COLUMN`].
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` naming `path` if it cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut metadata: Self =
            serde_json::from_str(&raw).map_err(|source| LoadError::Metadata {
                path: path.to_path_buf(),
                source,
            })?;
        metadata.canonicalize_time_columns();
        Ok(metadata)
    }

    /// Points the meter and curtailment time bindings at the canonical field.
    pub fn canonicalize_time_columns(&mut self) {
        self.meter.time = CANONICAL_TIME_COLUMN.to_string();
        self.curtail.time = CANONICAL_TIME_COLUMN.to_string();
    }

    /// Column bindings for a reanalysis product, falling back to defaults.
    pub fn reanalysis_columns(&self, name: &str) -> ReanalysisColumns {
        self.reanalysis.get(name).cloned().unwrap_or_default()
    }
}
