//! Hourly series: per-building loads in, per-group rejection records out.

use std::fmt;

use chrono::NaiveDateTime;

use crate::catalogue::RejectionTechnology;

/// Timestamp layout used for the `Date` column of group outputs.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Upstream sensible/latent split of a building's rejected heat.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadComponents {
    pub sensible_kwh: Vec<f64>,
    pub latent_kwh: Vec<f64>,
}

/// Negative cells found in one upstream column.
#[derive(Debug, Clone, PartialEq)]
pub struct NegativeColumn {
    pub column: String,
    pub hours: usize,
    /// Most negative value seen (kWh).
    pub min_kwh: f64,
}

impl NegativeColumn {
    /// Tallies the negative entries of `values`, `None` when there are none.
    pub fn scan(column: &str, values: &[f64]) -> Option<Self> {
        let (hours, min_kwh) = values
            .iter()
            .filter(|v| **v < 0.0)
            .fold((0_usize, 0.0_f64), |(n, min), v| (n + 1, min.min(*v)));
        (hours > 0).then(|| Self {
            column: column.to_string(),
            hours,
            min_kwh,
        })
    }
}

/// Hourly cooling-related heat of one building, as produced upstream.
///
/// `total_kwh` and, when present, both component vectors have one value per
/// entry of `timestamps`. `negatives` lists the source columns that held
/// negative values; the values themselves are kept as given.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingLoad {
    pub building: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub total_kwh: Vec<f64>,
    pub components: Option<LoadComponents>,
    pub negatives: Vec<NegativeColumn>,
}

impl BuildingLoad {
    /// Number of hours in the series.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Heat rejected by a group during one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RejectionRecord {
    pub timestamp: NaiveDateTime,
    /// Sensible share (kWh).
    pub sensible_kwh: f64,
    /// Latent share (kWh), zero unless the group rejects through a wet tower.
    pub latent_kwh: f64,
    /// `sensible_kwh + latent_kwh` (kWh).
    pub total_kwh: f64,
}

impl RejectionRecord {
    /// Builds a record whose total is the sum of its parts.
    pub fn new(timestamp: NaiveDateTime, sensible_kwh: f64, latent_kwh: f64) -> Self {
        Self {
            timestamp,
            sensible_kwh,
            latent_kwh,
            total_kwh: sensible_kwh + latent_kwh,
        }
    }
}

impl fmt::Display for RejectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | sens={:>10.3} kWh  lat={:>10.3} kWh  total={:>10.3} kWh",
            self.timestamp.format(DATE_FORMAT),
            self.sensible_kwh,
            self.latent_kwh,
            self.total_kwh,
        )
    }
}

/// The heat-rejection time series of one group, ascending by timestamp.
///
/// Created once per group per run and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRejectionSeries {
    group: String,
    technology: RejectionTechnology,
    buildings: Vec<String>,
    records: Vec<RejectionRecord>,
}

impl HourlyRejectionSeries {
    /// Wraps records, sorting them by timestamp.
    pub fn new(
        group: impl Into<String>,
        technology: RejectionTechnology,
        buildings: Vec<String>,
        mut records: Vec<RejectionRecord>,
    ) -> Self {
        records.sort_by_key(|r| r.timestamp);
        Self {
            group: group.into(),
            technology,
            buildings,
            records,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn technology(&self) -> RejectionTechnology {
        self.technology
    }

    pub fn buildings(&self) -> &[String] {
        &self.buildings
    }

    pub fn records(&self) -> &[RejectionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Annual heat rejected (kWh).
    pub fn total_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.total_kwh).sum()
    }

    /// Largest hourly rejection (kWh), zero for an empty series.
    pub fn peak_kwh(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.total_kwh)
            .fold(0.0_f64, f64::max)
    }
}
