//! Per-group aggregation of building loads into sensible/latent rejection.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use super::series::{BuildingLoad, HourlyRejectionSeries, RejectionRecord};
use crate::catalogue::RejectionTechnology;
use crate::error::AggregateError;
use crate::groups::{Assignment, Group};

/// Supplies the hourly load of a building by identifier.
///
/// Implementations must be shareable across worker threads; each group's
/// unit of work calls `load` for its own members only.
pub trait LoadSource: Sync {
    /// Loads one building's series.
    ///
    /// # Errors
    ///
    /// Any [`AggregateError`]; it fails the group the building belongs to.
    fn load(&self, building: &str) -> Result<BuildingLoad, AggregateError>;
}

/// Non-fatal upstream data problem found while aggregating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DataQualityIssue {
    /// Hours with negative values in one of a building's source columns. The
    /// values are kept as given.
    NegativeValues {
        building: String,
        column: String,
        hours: usize,
        min_kwh: f64,
    },
    /// Wet-cooling-tower hours with heat to reject but no sensible/latent
    /// split upstream. Those hours are booked as sensible.
    UnsplitHours { group: String, hours: usize },
}

/// A group's series together with the warnings raised while building it.
#[derive(Debug, Clone)]
pub struct GroupAggregate {
    pub series: HourlyRejectionSeries,
    pub warnings: Vec<DataQualityIssue>,
}

/// Outcome of aggregating one group.
#[derive(Debug)]
pub struct GroupOutcome<'a> {
    pub group: &'a Group,
    pub result: Result<GroupAggregate, AggregateError>,
}

fn check_alignment(reference: &BuildingLoad, other: &BuildingLoad) -> Result<(), AggregateError> {
    let misaligned = |reason: String| AggregateError::MisalignedSeries {
        reference: reference.building.clone(),
        building: other.building.clone(),
        reason,
    };

    if other.len() != reference.len() {
        return Err(misaligned(format!(
            "{} hours vs {} hours",
            other.len(),
            reference.len()
        )));
    }
    if let Some(idx) = reference
        .timestamps
        .iter()
        .zip(&other.timestamps)
        .position(|(a, b)| a != b)
    {
        return Err(misaligned(format!(
            "hour {idx} is {} vs {}",
            other.timestamps[idx], reference.timestamps[idx]
        )));
    }
    Ok(())
}

fn sum_into(acc: &mut [f64], values: &[f64]) {
    for (a, v) in acc.iter_mut().zip(values) {
        *a += v;
    }
}

/// Splits `total` per hour in the proportions of `sensible` to `latent`.
///
/// Hours whose component sum is within `tolerance_kwh` of zero cannot be
/// split; they are booked as sensible and counted in the returned tally when
/// `total` itself is not negligible.
fn split_total(
    total: &[f64],
    sensible: &[f64],
    latent: &[f64],
    tolerance_kwh: f64,
) -> (Vec<f64>, Vec<f64>, usize) {
    let mut unsplit = 0;
    let (sens, lat) = total
        .iter()
        .zip(sensible.iter().zip(latent))
        .map(|(&t, (&s, &l))| {
            let components = s + l;
            if components.abs() <= tolerance_kwh {
                if t.abs() > tolerance_kwh {
                    unsplit += 1;
                }
                return (t, 0.0);
            }
            let sens = t * (s / components);
            (sens, t - sens)
        })
        .unzip();
    (sens, lat, unsplit)
}

/// Combines the loads of a group's members into its rejection series.
///
/// Members must share one time axis. The hourly total is the sum of the
/// members' totals. Wet-cooling-tower groups split it in the proportions of
/// the summed upstream sensible and latent components; every other group is
/// 100% sensible.
///
/// # Arguments
///
/// * `group` - The group being aggregated
/// * `loads` - One load per member of `group`
/// * `tolerance_kwh` - Component sums at or below this are treated as zero
///
/// # Errors
///
/// - [`AggregateError::MisalignedSeries`] if members' time axes differ
/// - [`AggregateError::MissingComponentData`] if a wet-tower member lacks
///   sensible/latent components
pub fn aggregate_group(
    group: &Group,
    loads: &[BuildingLoad],
    tolerance_kwh: f64,
) -> Result<GroupAggregate, AggregateError> {
    let technology = group.technology();
    let Some(reference) = loads.first() else {
        return Ok(GroupAggregate {
            series: HourlyRejectionSeries::new(
                group.id(),
                technology,
                group.buildings().to_vec(),
                Vec::new(),
            ),
            warnings: Vec::new(),
        });
    };
    for other in &loads[1..] {
        check_alignment(reference, other)?;
    }

    let hours = reference.len();
    let mut warnings: Vec<DataQualityIssue> = loads
        .iter()
        .flat_map(|load| {
            load.negatives
                .iter()
                .map(|neg| DataQualityIssue::NegativeValues {
                    building: load.building.clone(),
                    column: neg.column.clone(),
                    hours: neg.hours,
                    min_kwh: neg.min_kwh,
                })
        })
        .collect();
    let mut total = vec![0.0_f64; hours];
    for load in loads {
        sum_into(&mut total, &load.total_kwh);
    }

    let (sensible, latent) = match technology {
        RejectionTechnology::WetCoolingTower => {
            let mut sensible = vec![0.0_f64; hours];
            let mut latent = vec![0.0_f64; hours];
            for load in loads {
                let components = load.components.as_ref().ok_or_else(|| {
                    AggregateError::MissingComponentData {
                        building: load.building.clone(),
                    }
                })?;
                sum_into(&mut sensible, &components.sensible_kwh);
                sum_into(&mut latent, &components.latent_kwh);
            }

            let (sensible, latent, unsplit) =
                split_total(&total, &sensible, &latent, tolerance_kwh);
            if unsplit > 0 {
                warnings.push(DataQualityIssue::UnsplitHours {
                    group: group.id().to_string(),
                    hours: unsplit,
                });
            }
            (sensible, latent)
        }
        RejectionTechnology::Other => (total, vec![0.0_f64; hours]),
    };

    for w in &warnings {
        warn!(group = %group.id(), issue = ?w, "data quality");
    }

    let records = reference
        .timestamps
        .iter()
        .zip(sensible.iter().zip(&latent))
        .map(|(ts, (s, l))| RejectionRecord::new(*ts, *s, *l))
        .collect();

    debug!(
        group = %group.id(),
        members = loads.len(),
        hours,
        technology = %technology,
        "aggregated group"
    );

    Ok(GroupAggregate {
        series: HourlyRejectionSeries::new(
            group.id(),
            technology,
            group.buildings().to_vec(),
            records,
        ),
        warnings,
    })
}

/// Loads and aggregates every group of `assignment` in parallel.
///
/// Runs on the current rayon pool. Groups are independent: one group's
/// failure is recorded in its outcome and does not affect the others.
/// Outcomes are returned in the assignment's group order.
pub fn aggregate_groups<'a, S: LoadSource>(
    assignment: &'a Assignment,
    source: &S,
    tolerance_kwh: f64,
) -> Vec<GroupOutcome<'a>> {
    assignment
        .groups()
        .par_iter()
        .map(|group| {
            let result = group
                .buildings()
                .iter()
                .map(|b| source.load(b))
                .collect::<Result<Vec<_>, _>>()
                .and_then(|loads| aggregate_group(group, &loads, tolerance_kwh));
            GroupOutcome { group, result }
        })
        .collect()
}
