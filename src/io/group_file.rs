//! Group file: `Group,Buildings` with member buildings comma separated.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Deserialize;

use super::missing_columns;
use crate::error::ResolveError;
use crate::groups::{Assignment, GroupRow};

pub const GROUP_COLUMN: &str = "Group";
pub const BUILDINGS_COLUMN: &str = "Buildings";

#[derive(Debug, Deserialize)]
struct RawGroupRow {
    #[serde(rename = "Group")]
    group: String,
    #[serde(rename = "Buildings")]
    buildings: String,
}

/// Reads a group file from disk.
///
/// # Errors
///
/// [`ResolveError::Io`] if the file cannot be opened, otherwise as
/// [`parse_group_csv`].
pub fn read_group_file(path: &Path) -> Result<Vec<GroupRow>, ResolveError> {
    let file = File::open(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_group_csv(file, path)
}

/// Parses group rows from any reader. `path` is used in error messages only.
///
/// # Errors
///
/// [`ResolveError::Schema`] when `Group` or `Buildings` is missing,
/// [`ResolveError::Csv`] for malformed records.
pub fn parse_group_csv(reader: impl Read, path: &Path) -> Result<Vec<GroupRow>, ResolveError> {
    let csv_err = |source| ResolveError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let missing = missing_columns(&headers, &[GROUP_COLUMN, BUILDINGS_COLUMN]);
    if !missing.is_empty() {
        return Err(ResolveError::Schema {
            path: path.to_path_buf(),
            message: format!("missing columns: {}", missing.join(", ")),
        });
    }

    let mut rows = Vec::new();
    for record in rdr.deserialize::<RawGroupRow>() {
        let raw = record.map_err(csv_err)?;
        rows.push(GroupRow {
            group: raw.group,
            buildings: split_buildings(&raw.buildings),
        });
    }
    Ok(rows)
}

/// Splits a `Buildings` cell, dropping blanks left by stray commas.
pub fn split_buildings(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

/// Writes an assignment as a group file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns a `csv::Error` if the file cannot be created or written.
pub fn write_group_file(assignment: &Assignment, path: &Path) -> csv::Result<()> {
    let file = File::create(path)?;
    write_group_csv(assignment, file)
}

/// Writes an assignment as group CSV to any writer.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_group_csv(assignment: &Assignment, writer: impl Write) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record([GROUP_COLUMN, BUILDINGS_COLUMN])?;
    for group in assignment.groups() {
        wtr.write_record([group.id(), group.buildings().join(",").as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_building_lists() {
        let csv = "Group,Buildings\nG1000,\"B1, B2\"\nG1001,B3\n";
        let rows = parse_group_csv(csv.as_bytes(), Path::new("groups.csv")).expect("valid csv");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, "G1000");
        assert_eq!(rows[0].buildings, vec!["B1".to_string(), "B2".to_string()]);
        assert_eq!(rows[1].buildings, vec!["B3".to_string()]);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let csv = "Group,Members\nG1000,B1\n";
        let err = parse_group_csv(csv.as_bytes(), Path::new("groups.csv"));
        match err {
            Err(ResolveError::Schema { message, .. }) => assert!(message.contains("Buildings")),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn blank_entries_are_dropped() {
        assert_eq!(
            split_buildings(" B1,,B2 , "),
            vec!["B1".to_string(), "B2".to_string()]
        );
        assert!(split_buildings("").is_empty());
    }
}
