//! Shared test fixtures for integration tests.
//!
//! Writes a small synthetic plant to a temporary directory: two years of
//! monthly meter data driven by the ERA5 wind speed, sixteen years of
//! reanalysis (ERA5 as speed, MERRA-2 as u/v components), and a short SCADA
//! table.

#![allow(dead_code)]

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use windfarm_aep::config::ServiceConfig;

/// SCADA rows written by the fixture.
pub const SCADA_ROWS: usize = 12;
/// Distinct turbines in the SCADA table.
pub const TURBINES: usize = 4;

/// A plant on disk plus a configuration pointing at it.
///
/// The directory is removed when the fixture is dropped.
pub struct PlantFixture {
    pub dir: TempDir,
    pub config: ServiceConfig,
}

impl PlantFixture {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.config.cache.artifact_dir.clone()
    }

    /// Writes the configuration as TOML and returns its path.
    pub fn write_config_toml(&self, policy: &str) -> PathBuf {
        let path = self.root().join("service.toml");
        let c = &self.config;
        let body = format!(
            r#"[data]
metadata = "{metadata}"
data_dir = "{data_dir}"
scada_file = "{scada}"
plant_file = "{plant}"
asset_file = "{asset}"

[data.reanalysis]
era5 = "era5.csv"
merra2 = "merra2.csv"

[cache]
policy = "{policy}"
artifact_dir = "{artifacts}"

[estimator]
seed = 7

[logging]
level = "warn"
"#,
            metadata = c.data.metadata.display(),
            data_dir = c.data.data_dir.display(),
            scada = c.data.scada_file,
            plant = c.data.plant_file,
            asset = c.data.asset_file,
            artifacts = c.cache.artifact_dir.display(),
        );
        fs::write(&path, body).unwrap();
        path
    }
}

/// Mean ERA5 wind speed for a month; seasonal cycle plus a year offset.
pub fn era5_speed(year: i32, month: u32) -> f64 {
    let seasonal = 1.5 * (2.0 * PI * f64::from(month - 1) / 12.0).cos();
    let wobble = f64::from(((year * 7 + month as i32 * 3) % 5) as u8) * 0.1;
    6.5 + seasonal + wobble
}

/// Builds the fixture with the `on_demand` defaults and a fixed seed.
pub fn plant_fixture() -> PlantFixture {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("plant");
    fs::create_dir_all(&data_dir).unwrap();

    let metadata = dir.path().join("plant_meta.json");
    fs::write(
        &metadata,
        r#"{
  "latitude": 48.4497,
  "longitude": 5.5896,
  "capacity": 8.2,
  "scada": {"time": "Date_time", "asset_id": "Wind_turbine_name", "WTUR_W": "P_avg", "WMET_HorWdSpd": "Ws_avg"},
  "meter": {"time": "time", "MMTR_SupWh": "net_energy_kwh"},
  "curtail": {"time": "time", "IAVL_DnWh": "availability_kwh", "IAVL_ExtPwrDnWh": "curtailment_kwh"},
  "reanalysis": {
    "era5": {"time": "datetime", "WMETR_HorWdSpd": "ws_100m"},
    "merra2": {"time": "datetime", "WMETR_HorWdSpdU": "u_50", "WMETR_HorWdSpdV": "v_50"}
  }
}"#,
    )
    .unwrap();

    let mut scada = String::from("Date_time,Wind_turbine_name,P_avg,Ws_avg\n");
    for i in 0..SCADA_ROWS {
        let turbine = format!("R807{}", 11 + (i % TURBINES) * 10);
        let minute = (i / TURBINES) * 10;
        let _ = writeln!(
            scada,
            "2014-01-01T00:{minute:02}:00+00:00,{turbine},{},{}",
            100.0 * (i + 1) as f64,
            5.0 + 0.5 * i as f64
        );
    }
    fs::write(data_dir.join("scada.csv"), scada).unwrap();

    let mut plant = String::from("time_utc,net_energy_kwh,availability_kwh,curtailment_kwh\n");
    for year in 2014..=2015 {
        for month in 1..=12u32 {
            let net = 400_000.0 + 120_000.0 * era5_speed(year, month);
            let _ = writeln!(plant, "{year}-{month:02}-01 00:00:00,{net:.1},2500.0,800.0");
        }
    }
    fs::write(data_dir.join("plant.csv"), plant).unwrap();

    let mut era5 = String::from("datetime,ws_100m\n");
    let mut merra2 = String::from("datetime,u_50,v_50\n");
    for year in 2000..=2015 {
        for month in 1..=12u32 {
            let ws = era5_speed(year, month);
            let _ = writeln!(era5, "{year}-{month:02}-01 00:00:00,{ws:.4}");
            let ws2 = ws * 1.05;
            let _ = writeln!(
                merra2,
                "{year}-{month:02}-01 00:00:00,{:.4},{:.4}",
                ws2 * 0.6,
                ws2 * 0.8
            );
        }
    }
    fs::write(data_dir.join("era5.csv"), era5).unwrap();
    fs::write(data_dir.join("merra2.csv"), merra2).unwrap();
    fs::write(
        data_dir.join("asset.csv"),
        "Wind_turbine_name,Latitude,Longitude,Rated_power\nR80711,48.45,5.59,2050\n",
    )
    .unwrap();

    let mut config = ServiceConfig::default();
    config.data.metadata = metadata;
    config.data.data_dir = data_dir;
    config.data.scada_file = "scada.csv".into();
    config.data.plant_file = "plant.csv".into();
    config.data.asset_file = "asset.csv".into();
    config.data.reanalysis = [
        ("era5".to_string(), "era5.csv".to_string()),
        ("merra2".to_string(), "merra2.csv".to_string()),
    ]
    .into_iter()
    .collect();
    config.cache.artifact_dir = dir.path().join("artifacts");
    config.estimator.seed = Some(7);

    PlantFixture { dir, config }
}
