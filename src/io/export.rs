//! CSV export for simulated AEP distributions.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::SimulationResult;

/// Column header for distribution export.
const HEADER: [&str; 2] = ["sample", "aep_gwh"];

/// Exports a result's distribution to a CSV file at the given path.
///
/// One row per sample in draw order. Produces deterministic output for
/// identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_distribution(result: &SimulationResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_distribution(result, buf)
}

/// Writes a result's distribution as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_distribution(result: &SimulationResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;

    for (i, aep) in result.distribution.iter().enumerate() {
        wtr.write_record(&[i.to_string(), format!("{aep:.6}")])?;
    }

    wtr.flush()?;
    Ok(())
}
