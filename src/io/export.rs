//! CSV export for per-group heat-rejection series.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::WriteError;
use crate::rejection::HourlyRejectionSeries;
use crate::rejection::series::DATE_FORMAT;

/// Column header of every group output file.
pub const HEADER: [&str; 4] = [
    "Date",
    "Q_reject_sens_kWh",
    "Q_reject_lat_kWh",
    "Q_reject_kWh",
];

/// Writes a series as CSV to any writer.
///
/// Values use the shortest representation that parses back to the same
/// `f64`, so identical inputs give byte-identical files.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_series_csv(series: &HourlyRejectionSeries, writer: impl Write) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;

    for r in series.records() {
        wtr.write_record(&[
            r.timestamp.format(DATE_FORMAT).to_string(),
            r.sensible_kwh.to_string(),
            r.latent_kwh.to_string(),
            r.total_kwh.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Output file of a group inside `dir`.
pub fn output_path(dir: &Path, group: &str) -> PathBuf {
    dir.join(format!("{group}.csv"))
}

/// Writes `{dir}/{group}.csv` atomically.
///
/// The series goes to a temporary file in `dir` that is renamed over the
/// target only once complete; readers never observe a partial file.
///
/// # Errors
///
/// Returns a [`WriteError`] naming the target path.
pub fn export_series(series: &HourlyRejectionSeries, dir: &Path) -> Result<PathBuf, WriteError> {
    let path = output_path(dir, series.group());
    let fail = |source: io::Error| WriteError {
        path: path.clone(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
    {
        let buf = BufWriter::new(tmp.as_file_mut());
        write_series_csv(series, buf).map_err(|e| fail(e.into()))?;
    }
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(&path).map_err(|e| fail(e.error))?;
    Ok(path)
}

/// Removes a stale output left by an earlier run, if any.
///
/// # Errors
///
/// Returns a [`WriteError`] if the file exists and cannot be removed.
pub fn remove_stale_output(dir: &Path, group: &str) -> Result<(), WriteError> {
    let path = output_path(dir, group);
    match fs::remove_file(&path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(WriteError { path, source: e }),
        _ => Ok(()),
    }
}
