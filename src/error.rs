//! Error taxonomy for group resolution, aggregation and output.

use std::io;
use std::path::PathBuf;

/// Fatal errors raised while building the group assignment.
///
/// Any of these aborts the run before a single group is aggregated.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("schema error in {}: {message}", .path.display())]
    Schema { path: PathBuf, message: String },

    #[error("building \"{building}\" in group {group} is not in the building catalogue")]
    UnknownBuilding { group: String, building: String },

    #[error("building \"{building}\" is assigned to both {first} and {second}")]
    DuplicateAssignment {
        building: String,
        first: String,
        second: String,
    },

    #[error("group id {group} appears in more than one row")]
    DuplicateGroupId { group: String },

    #[error("group {group} lists no buildings")]
    EmptyGroup { group: String },

    #[error("{groups} groups do not fit the G1000..G9999 identifier range")]
    TooManyGroups { groups: usize },

    #[error("group {group} mixes rejection technologies: {details}")]
    MixedTechnology { group: String, details: String },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Per-group failures while loading and combining member series.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error(
        "building \"{building}\" does not share the simulation horizon of \"{reference}\": {reason}"
    )]
    MisalignedSeries {
        reference: String,
        building: String,
        reason: String,
    },

    #[error("building \"{building}\" has no sensible/latent components for its wet cooling tower")]
    MissingComponentData { building: String },

    #[error("schema error in {}: {message}", .path.display())]
    Schema { path: PathBuf, message: String },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// A building identifier that appears twice while building a catalogue.
#[derive(Debug, thiserror::Error)]
#[error("building \"{name}\" is listed more than once")]
pub struct DuplicateBuilding {
    pub name: String,
}

/// Failure to persist one group's output file.
#[derive(Debug, thiserror::Error)]
#[error("cannot write {}: {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Run-level failures. Every variant aborts the run without group output.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("group resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("cannot write group file {}: {source}", .path.display())]
    GroupFile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl AggregateError {
    /// Short stable name for the failure, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MisalignedSeries { .. } => "MisalignedSeriesError",
            Self::MissingComponentData { .. } => "MissingComponentDataError",
            Self::Schema { .. } => "SchemaError",
            Self::Io { .. } => "IoError",
            Self::Csv { .. } => "CsvError",
        }
    }
}

impl ResolveError {
    /// Short stable name for the failure, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "SchemaError",
            Self::UnknownBuilding { .. } => "UnknownBuildingError",
            Self::DuplicateAssignment { .. } => "DuplicateAssignmentError",
            Self::DuplicateGroupId { .. } => "DuplicateGroupIdError",
            Self::EmptyGroup { .. } => "SchemaError",
            Self::TooManyGroups { .. } => "TooManyGroupsError",
            Self::MixedTechnology { .. } => "MixedTechnologyError",
            Self::Io { .. } => "IoError",
            Self::Csv { .. } => "CsvError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_messages_name_the_building() {
        let err = ResolveError::DuplicateAssignment {
            building: "B1".into(),
            first: "G1000".into(),
            second: "G1001".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("B1"));
        assert!(msg.contains("G1000") && msg.contains("G1001"));
        assert_eq!(err.kind(), "DuplicateAssignmentError");
    }

    #[test]
    fn aggregate_error_kind_is_stable() {
        let err = AggregateError::MissingComponentData {
            building: "B3".into(),
        };
        assert_eq!(err.kind(), "MissingComponentDataError");
        assert!(err.to_string().contains("B3"));
    }
}
