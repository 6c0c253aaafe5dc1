//! CSV readers for the plant data sources.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::StringRecord;
use tracing::{debug, info};

use super::metadata::{PlantMetadata, ReanalysisColumns, ScadaColumns};
use super::time::parse_utc_naive;
use super::{CurtailRecord, MeterRecord, PlantDataset, ReanalysisRecord, ScadaRecord};
use crate::config::DataConfig;
use crate::error::LoadError;

/// Fixed file locations of one plant.
#[derive(Debug, Clone)]
pub struct PlantPaths {
    pub metadata: PathBuf,
    pub scada: PathBuf,
    /// Combined meter + curtailment time series.
    pub plant: PathBuf,
    pub asset: PathBuf,
    pub reanalysis: BTreeMap<String, PathBuf>,
}

impl PlantPaths {
    /// Resolves the configured file names against `data_dir`.
    pub fn from_config(cfg: &DataConfig) -> Self {
        let dir = &cfg.data_dir;
        Self {
            metadata: cfg.metadata.clone(),
            scada: dir.join(&cfg.scada_file),
            plant: dir.join(&cfg.plant_file),
            asset: dir.join(&cfg.asset_file),
            reanalysis: cfg
                .reanalysis
                .iter()
                .map(|(name, file)| (name.clone(), dir.join(file)))
                .collect(),
        }
    }
}

/// Builds [`PlantDataset`]s from a fixed set of files.
///
/// Stateless: every call to [`PlantLoader::load`] re-reads the sources.
#[derive(Debug, Clone)]
pub struct PlantLoader {
    paths: PlantPaths,
}

impl PlantLoader {
    pub fn new(paths: PlantPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &PlantPaths {
        &self.paths
    }

    /// Assembles the full dataset.
    ///
    /// # Errors
    ///
    /// Returns the first `LoadError` encountered; no partial dataset is
    /// produced.
    pub fn load(&self) -> Result<PlantDataset, LoadError> {
        let metadata = PlantMetadata::from_json_file(&self.paths.metadata)?;
        let scada = read_scada(&self.paths.scada, &metadata.scada)?;
        let (meter, curtail) = read_plant_series(&self.paths.plant, &metadata)?;

        ensure_exists(&self.paths.asset)?;
        for path in self.paths.reanalysis.values() {
            ensure_exists(path)?;
        }

        info!(
            scada_rows = scada.len(),
            meter_rows = meter.len(),
            reanalysis = self.paths.reanalysis.len(),
            "plant dataset loaded"
        );

        Ok(PlantDataset {
            metadata,
            scada,
            meter,
            curtail,
            asset: self.paths.asset.clone(),
            reanalysis: self.paths.reanalysis.clone(),
        })
    }

    /// Reads only the metadata and SCADA table.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if either file is missing or malformed.
    pub fn load_scada(&self) -> Result<Vec<ScadaRecord>, LoadError> {
        let metadata = PlantMetadata::from_json_file(&self.paths.metadata)?;
        read_scada(&self.paths.scada, &metadata.scada)
    }
}

fn ensure_exists(path: &Path) -> Result<(), LoadError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LoadError::Missing {
            path: path.to_path_buf(),
        })
    }
}

/// Column lookup over an opened CSV file.
struct Table {
    path: PathBuf,
    reader: csv::Reader<File>,
    headers: StringRecord,
}

impl Table {
    fn open(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
        let headers = reader.headers().map_err(|source| csv_error(path, source))?.clone();
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            headers,
        })
    }

    fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    fn column(&self, name: &str) -> Result<usize, LoadError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    /// Visits every data row with its 1-based line number (header is line 1).
    fn for_each_row(
        &mut self,
        mut visit: impl FnMut(usize, &StringRecord) -> Result<(), LoadError>,
    ) -> Result<(), LoadError> {
        let mut record = StringRecord::new();
        let mut row = 1;
        loop {
            let more = self
                .reader
                .read_record(&mut record)
                .map_err(|source| csv_error(&self.path, source))?;
            if !more {
                return Ok(());
            }
            row += 1;
            visit(row, &record)?;
        }
    }
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn malformed(path: &Path, row: usize, message: String) -> LoadError {
    LoadError::Malformed {
        path: path.to_path_buf(),
        row,
        message,
    }
}

fn parse_time(path: &Path, row: usize, raw: &str) -> Result<NaiveDateTime, LoadError> {
    parse_utc_naive(raw).ok_or_else(|| malformed(path, row, format!("invalid timestamp \"{raw}\"")))
}

/// Parses a numeric cell; empty and `NaN` cells are missing values.
fn parse_optional(path: &Path, row: usize, raw: &str) -> Result<Option<f64>, LoadError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| malformed(path, row, format!("invalid number \"{raw}\"")))
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

pub(crate) fn read_scada(path: &Path, cols: &ScadaColumns) -> Result<Vec<ScadaRecord>, LoadError> {
    let mut table = Table::open(path)?;
    let time = table.column(&cols.time)?;
    let asset = table.column(&cols.asset_id)?;
    let power = table.column(&cols.power)?;
    let wind = table.column(&cols.wind_speed)?;

    let mut rows = Vec::new();
    table.for_each_row(|row, rec| {
        rows.push(ScadaRecord {
            time: parse_time(path, row, cell(rec, time))?,
            asset_id: cell(rec, asset).to_string(),
            power_kw: parse_optional(path, row, cell(rec, power))?,
            wind_speed_ms: parse_optional(path, row, cell(rec, wind))?,
        });
        Ok(())
    })?;
    debug!(path = %path.display(), rows = rows.len(), "scada parsed");
    Ok(rows)
}

/// Splits the combined plant series into meter and curtailment tables.
///
/// Meter rows without a net energy value are dropped; missing loss values
/// count as zero loss.
fn read_plant_series(
    path: &Path,
    metadata: &PlantMetadata,
) -> Result<(Vec<MeterRecord>, Vec<CurtailRecord>), LoadError> {
    let mut table = Table::open(path)?;
    let meter_time = table.column(&metadata.meter.time)?;
    let net = table.column(&metadata.meter.net_energy)?;
    let curtail_time = table.column(&metadata.curtail.time)?;
    let avail = table.column(&metadata.curtail.availability)?;
    let curt = table.column(&metadata.curtail.curtailment)?;

    let mut meter = Vec::new();
    let mut curtail = Vec::new();
    table.for_each_row(|row, rec| {
        let t = parse_time(path, row, cell(rec, meter_time))?;
        if let Some(net_energy_kwh) = parse_optional(path, row, cell(rec, net))? {
            meter.push(MeterRecord {
                time: t,
                net_energy_kwh,
            });
        }
        let tc = if curtail_time == meter_time {
            t
        } else {
            parse_time(path, row, cell(rec, curtail_time))?
        };
        curtail.push(CurtailRecord {
            time: tc,
            availability_kwh: parse_optional(path, row, cell(rec, avail))?.unwrap_or(0.0),
            curtailment_kwh: parse_optional(path, row, cell(rec, curt))?.unwrap_or(0.0),
        });
        Ok(())
    })?;
    Ok((meter, curtail))
}

pub(crate) fn read_reanalysis(
    path: &Path,
    cols: &ReanalysisColumns,
) -> Result<Vec<ReanalysisRecord>, LoadError> {
    enum Speed {
        Direct(usize),
        Components(usize, usize),
    }

    let mut table = Table::open(path)?;
    let time = table.column(&cols.time)?;
    let speed = match (&cols.wind_speed, &cols.wind_u, &cols.wind_v) {
        (Some(ws), _, _) if table.has_column(ws) => Speed::Direct(table.column(ws)?),
        (_, Some(u), Some(v)) => Speed::Components(table.column(u)?, table.column(v)?),
        (Some(ws), _, _) => Speed::Direct(table.column(ws)?),
        _ => {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: "wind speed".to_string(),
            });
        }
    };

    let mut rows = Vec::new();
    table.for_each_row(|row, rec| {
        let value = match speed {
            Speed::Direct(idx) => parse_optional(path, row, cell(rec, idx))?,
            Speed::Components(u, v) => {
                let u = parse_optional(path, row, cell(rec, u))?;
                let v = parse_optional(path, row, cell(rec, v))?;
                u.zip(v).map(|(u, v)| u.hypot(v))
            }
        };
        if let Some(wind_speed_ms) = value {
            rows.push(ReanalysisRecord {
                time: parse_time(path, row, cell(rec, time))?,
                wind_speed_ms,
            });
        }
        Ok(())
    })?;
    Ok(rows)
}
