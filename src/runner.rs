//! End-to-end pipeline: resolve groups, aggregate in parallel, write, report.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::catalogue::Catalogue;
use crate::config::RunConfig;
use crate::error::{RunError, WriteError};
use crate::groups::{self, Assignment};
use crate::io::demand::DemandReader;
use crate::io::export::{export_series, remove_stale_output};
use crate::io::group_file::write_group_file;
use crate::io::supply::load_catalogue;
use crate::rejection::{
    DataQualityIssue, GroupAggregate, GroupOutcome, GroupReport, GroupStatus,
    HourlyRejectionSeries, LoadSource, RunReport, aggregate_groups,
};

fn catalogue(config: &RunConfig) -> Result<Catalogue, RunError> {
    let catalogue = load_catalogue(
        &config.building_supply(),
        &config.supply_database(),
        &config.heat_rejection.cooling_tower_systems,
    )?;
    info!(buildings = catalogue.len(), "loaded building catalogue");
    Ok(catalogue)
}

fn create_dir(path: &Path) -> Result<(), RunError> {
    fs::create_dir_all(path).map_err(|source| RunError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs the pipeline with building loads read from the configured demand
/// directory.
///
/// # Errors
///
/// Returns a [`RunError`] when no group can be processed at all: catalogue or
/// group file problems, an unusable output directory, or a worker pool that
/// cannot start. Per-group failures are recorded in the report instead.
pub fn run(config: &RunConfig) -> Result<RunReport, RunError> {
    let source = DemandReader::new(config.demand_dir(), config.demand.clone());
    run_with_source(config, &source)
}

/// Runs the pipeline with building loads from `source`.
///
/// Groups are aggregated on a dedicated pool of `heat_rejection.workers`
/// threads; successful series are then written in parallel, one file each.
/// A group that fails leaves no output file behind.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_source<S: LoadSource>(
    config: &RunConfig,
    source: &S,
) -> Result<RunReport, RunError> {
    let started = Instant::now();
    let catalogue = catalogue(config)?;
    let resolution = groups::resolve(&config.group_file(), &catalogue)?;
    info!(
        groups = resolution.assignment.len(),
        mode = %resolution.mode,
        "resolved groups"
    );

    let output_dir = config.output_dir();
    create_dir(&output_dir)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.heat_rejection.workers)
        .build()?;
    debug!(threads = pool.current_num_threads(), "worker pool ready");

    let tolerance_kwh = config.heat_rejection.tolerance_kwh;
    let assignment = &resolution.assignment;
    let (groups, warnings) = pool.install(|| {
        let outcomes = aggregate_groups(assignment, source, tolerance_kwh);
        let reports: Vec<(GroupReport, Vec<DataQualityIssue>)> = outcomes
            .into_par_iter()
            .map(|outcome| finish_group(outcome, &output_dir, export_series))
            .collect();
        let mut groups = Vec::with_capacity(reports.len());
        let mut warnings = Vec::new();
        for (report, w) in reports {
            groups.push(report);
            warnings.extend(w);
        }
        (groups, warnings)
    });

    let report = RunReport {
        resolution: resolution.mode,
        groups,
        conflicts: resolution.conflicts,
        warnings,
    };
    info!(
        written = report.written_count(),
        failed = report.failed_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "run complete"
    );
    Ok(report)
}

fn discard_output(output_dir: &Path, group: &str) {
    if let Err(stale) = remove_stale_output(output_dir, group) {
        warn!(group, error = %stale, "cannot remove stale output");
    }
}

/// Writes a successful group with `write`, or clears its stale output when
/// either aggregation or writing failed.
fn finish_group<W>(
    outcome: GroupOutcome<'_>,
    output_dir: &Path,
    write: W,
) -> (GroupReport, Vec<DataQualityIssue>)
where
    W: Fn(&HourlyRejectionSeries, &Path) -> Result<PathBuf, WriteError>,
{
    let group = outcome.group;
    let report = |status| GroupReport {
        group: group.id().to_string(),
        technology: group.technology(),
        buildings: group.buildings().to_vec(),
        status,
    };

    match outcome.result {
        Ok(GroupAggregate { series, warnings }) => match write(&series, output_dir) {
            Ok(path) => {
                debug!(group = %group.id(), path = %path.display(), "wrote group");
                let status = GroupStatus::Written {
                    path,
                    hours: series.len(),
                    total_kwh: series.total_kwh(),
                    peak_kwh: series.peak_kwh(),
                };
                (report(status), warnings)
            }
            Err(e) => {
                warn!(group = %group.id(), error = %e, "group output not written");
                discard_output(output_dir, group.id());
                let status = GroupStatus::Failed {
                    error: "WriteError".to_string(),
                    message: e.to_string(),
                };
                (report(status), warnings)
            }
        },
        Err(e) => {
            warn!(group = %group.id(), error = %e, "group failed");
            discard_output(output_dir, group.id());
            let status = GroupStatus::Failed {
                error: e.kind().to_string(),
                message: e.to_string(),
            };
            (report(status), Vec::new())
        }
    }
}

/// Derives groups from the building catalogue and writes them to the
/// configured group file, replacing any existing one.
///
/// # Errors
///
/// Returns a [`RunError`] if the catalogue cannot be loaded or the file
/// cannot be written.
pub fn run_groups_helper(config: &RunConfig) -> Result<Assignment, RunError> {
    let catalogue = catalogue(config)?;
    let assignment = groups::derive_groups(&catalogue)?;

    let path = config.group_file();
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    if path.exists() {
        info!(path = %path.display(), "replacing existing group file");
    }
    write_group_file(&assignment, &path).map_err(|source| RunError::GroupFile {
        path: path.clone(),
        source,
    })?;
    info!(
        groups = assignment.len(),
        buildings = assignment.building_count(),
        path = %path.display(),
        "wrote group file"
    );
    Ok(assignment)
}
