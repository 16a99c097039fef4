//! Aggregation of building loads into per-group heat-rejection series.

pub mod aggregator;
pub mod report;
pub mod series;

pub use aggregator::{
    DataQualityIssue, GroupAggregate, GroupOutcome, LoadSource, aggregate_group, aggregate_groups,
};
pub use report::{GroupReport, GroupStatus, RunReport};
pub use series::{
    BuildingLoad, HourlyRejectionSeries, LoadComponents, NegativeColumn, RejectionRecord,
};
