//! Descriptive statistics over the SCADA table.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::plant::ScadaRecord;

/// First and last SCADA timestamps (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Summary served by `GET /analysis`.
///
/// Averages skip missing cells. Float fields are rounded to 2 decimals. An
/// empty table yields zeros and no time range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicAnalysis {
    pub total_records: usize,
    pub time_range: Option<TimeRange>,
    pub number_of_turbines: usize,
    /// m/s
    pub average_wind_speed: f64,
    /// kW
    pub average_power: f64,
    /// Sum of the power column.
    pub total_energy: f64,
}

impl BasicAnalysis {
    pub fn from_records(records: &[ScadaRecord]) -> Self {
        let mut turbines = BTreeSet::new();
        let mut time_range: Option<TimeRange> = None;
        let mut wind = Accumulator::default();
        let mut power = Accumulator::default();

        for r in records {
            turbines.insert(r.asset_id.as_str());
            time_range = Some(match time_range {
                None => TimeRange {
                    start: r.time,
                    end: r.time,
                },
                Some(range) => TimeRange {
                    start: range.start.min(r.time),
                    end: range.end.max(r.time),
                },
            });
            wind.push(r.wind_speed_ms);
            power.push(r.power_kw);
        }

        Self {
            total_records: records.len(),
            time_range,
            number_of_turbines: turbines.len(),
            average_wind_speed: round2(wind.mean()),
            average_power: round2(power.mean()),
            total_energy: round2(power.sum),
        }
    }
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
