//! Run report: per-group outcomes, data-quality warnings and conflicts.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::aggregator::DataQualityIssue;
use crate::catalogue::RejectionTechnology;
use crate::groups::{ResolutionMode, SharedSystemConflict};

/// What happened to one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupStatus {
    Written {
        path: PathBuf,
        hours: usize,
        /// Annual heat rejected (kWh).
        total_kwh: f64,
        /// Peak hourly heat rejected (kWh).
        peak_kwh: f64,
    },
    Failed {
        /// Error kind, e.g. `MisalignedSeriesError`.
        error: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub group: String,
    pub technology: RejectionTechnology,
    pub buildings: Vec<String>,
    #[serde(flatten)]
    pub status: GroupStatus,
}

/// Summary of one pipeline run.
///
/// Built after all groups have been aggregated and written, so the counts
/// always agree with the files on disk.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub resolution: ResolutionMode,
    pub groups: Vec<GroupReport>,
    pub conflicts: Vec<SharedSystemConflict>,
    pub warnings: Vec<DataQualityIssue>,
}

impl RunReport {
    pub fn written_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.status, GroupStatus::Written { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.groups.len() - self.written_count()
    }

    /// True when every group was written.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Writes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the file cannot be created or written.
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Heat Rejection Report ---")?;
        writeln!(f, "Groups from:        {}", self.resolution)?;
        writeln!(
            f,
            "Groups written:     {} of {}",
            self.written_count(),
            self.groups.len()
        )?;
        for g in &self.groups {
            match &g.status {
                GroupStatus::Written {
                    hours,
                    total_kwh,
                    peak_kwh,
                    ..
                } => writeln!(
                    f,
                    "  {:<6} {:<18} {:>5} h  total={:>12.1} kWh  peak={:>9.2} kWh  [{}]",
                    g.group,
                    g.technology.to_string(),
                    hours,
                    total_kwh,
                    peak_kwh,
                    g.buildings.join(",")
                )?,
                GroupStatus::Failed { error, message } => {
                    writeln!(f, "  {:<6} FAILED {error}: {message}", g.group)?
                }
            }
        }
        writeln!(f, "Data-quality warnings: {}", self.warnings.len())?;
        write!(f, "Shared-system conflicts: {}", self.conflicts.len())
    }
}
