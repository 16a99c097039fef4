//! Reader for per-building hourly demand results.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use csv::StringRecord;
use tracing::debug;

use super::{column_index, missing_columns};
use crate::config::DemandConfig;
use crate::error::AggregateError;
use crate::rejection::{BuildingLoad, LoadComponents, LoadSource, NegativeColumn};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses an upstream timestamp, keeping local wall time.
///
/// Offsets (RFC 3339 or `+hh:mm` suffixes) are accepted and dropped.
///
/// ```
/// use heat_rejection::io::demand::parse_timestamp;
///
/// let a = parse_timestamp("2005-01-01 13:00:00+08:00");
/// let b = parse_timestamp("2005-01-01 13:00:00");
/// assert!(a.is_some());
/// assert_eq!(a, b);
/// ```
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn value(
    record: &StringRecord,
    idx: usize,
    column: &str,
    row: usize,
    path: &Path,
) -> Result<f64, AggregateError> {
    let raw = record.get(idx).unwrap_or("").trim();
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AggregateError::Schema {
            path: path.to_path_buf(),
            message: format!("row {row}, column {column}: \"{raw}\" is not a finite number"),
        }),
    }
}

/// Parses one building's demand results from any reader.
///
/// The hourly total is the sum of `columns.total_columns`. Components are
/// read only when both component columns are present. Negative cells are
/// kept and tallied per column in [`BuildingLoad::negatives`].
///
/// # Errors
///
/// [`AggregateError::Schema`] for missing columns, unparseable or non-finite
/// cells, or timestamps that do not strictly increase. [`AggregateError::Csv`] for
/// malformed records.
pub fn parse_building_load(
    input: impl Read,
    path: &Path,
    building: &str,
    columns: &DemandConfig,
) -> Result<BuildingLoad, AggregateError> {
    let schema = |message: String| AggregateError::Schema {
        path: path.to_path_buf(),
        message,
    };
    let csv_err = |source| AggregateError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = rdr.headers().map_err(csv_err)?.clone();

    let mut required: Vec<&str> = vec![columns.date_column.as_str()];
    required.extend(columns.total_columns.iter().map(String::as_str));
    let missing = missing_columns(&headers, &required);
    if !missing.is_empty() {
        return Err(schema(format!("missing columns: {}", missing.join(", "))));
    }

    let locate = |name: &str| column_index(&headers, name);
    let date_idx = locate(&columns.date_column).unwrap_or(0);
    let total_idx: Vec<(usize, &str)> = columns
        .total_columns
        .iter()
        .filter_map(|c| locate(c).map(|i| (i, c.as_str())))
        .collect();
    let component_idx = locate(&columns.sensible_column).zip(locate(&columns.latent_column));

    let mut timestamps: Vec<NaiveDateTime> = Vec::new();
    let mut total_kwh = Vec::new();
    let mut by_column: Vec<Vec<f64>> = vec![Vec::new(); total_idx.len()];
    let mut sensible_kwh = Vec::new();
    let mut latent_kwh = Vec::new();

    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        // header is line 1
        let row = i + 2;

        let raw = record.get(date_idx).unwrap_or("");
        let ts = parse_timestamp(raw).ok_or_else(|| {
            schema(format!(
                "row {row}, column {}: cannot parse \"{raw}\" as a timestamp",
                columns.date_column
            ))
        })?;
        if let Some(prev) = timestamps.last() {
            if ts <= *prev {
                return Err(schema(format!(
                    "row {row}: timestamp {ts} does not follow {prev}"
                )));
            }
        }
        timestamps.push(ts);

        let mut total = 0.0;
        for (values, &(idx, column)) in by_column.iter_mut().zip(&total_idx) {
            let v = value(&record, idx, column, row, path)?;
            values.push(v);
            total += v;
        }
        total_kwh.push(total);

        if let Some((s, l)) = component_idx {
            sensible_kwh.push(value(&record, s, &columns.sensible_column, row, path)?);
            latent_kwh.push(value(&record, l, &columns.latent_column, row, path)?);
        }
    }

    let mut negatives: Vec<NegativeColumn> = total_idx
        .iter()
        .zip(&by_column)
        .filter_map(|(&(_, column), values)| NegativeColumn::scan(column, values))
        .collect();
    if component_idx.is_some() {
        negatives.extend(NegativeColumn::scan(&columns.sensible_column, &sensible_kwh));
        negatives.extend(NegativeColumn::scan(&columns.latent_column, &latent_kwh));
    }

    debug!(
        building,
        hours = timestamps.len(),
        components = component_idx.is_some(),
        "loaded demand"
    );

    Ok(BuildingLoad {
        building: building.to_string(),
        timestamps,
        total_kwh,
        components: component_idx.map(|_| LoadComponents {
            sensible_kwh,
            latent_kwh,
        }),
        negatives,
    })
}

/// Reads `path` as the demand results of `building`.
///
/// # Errors
///
/// [`AggregateError::Io`] if the file cannot be opened, otherwise as
/// [`parse_building_load`].
pub fn read_building_load(
    path: &Path,
    building: &str,
    columns: &DemandConfig,
) -> Result<BuildingLoad, AggregateError> {
    let file = File::open(path).map_err(|source| AggregateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_building_load(file, path, building, columns)
}

/// Loads building demand from `{dir}/{building}.csv`.
#[derive(Debug, Clone)]
pub struct DemandReader {
    dir: PathBuf,
    columns: DemandConfig,
}

impl DemandReader {
    pub fn new(dir: impl Into<PathBuf>, columns: DemandConfig) -> Self {
        Self {
            dir: dir.into(),
            columns,
        }
    }

    /// Location of a building's results file.
    pub fn path_for(&self, building: &str) -> PathBuf {
        self.dir.join(format!("{building}.csv"))
    }
}

impl LoadSource for DemandReader {
    fn load(&self, building: &str) -> Result<BuildingLoad, AggregateError> {
        read_building_load(&self.path_for(building), building, &self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2005, 1, 1)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .expect("valid date")
    }

    fn parse(csv: &str) -> Result<BuildingLoad, AggregateError> {
        parse_building_load(
            csv.as_bytes(),
            Path::new("B1.csv"),
            "B1",
            &DemandConfig::default(),
        )
    }

    #[test]
    fn accepts_offset_and_naive_timestamps() {
        assert_eq!(parse_timestamp("2005-01-01 03:00:00+08:00"), Some(hour(3)));
        assert_eq!(parse_timestamp("2005-01-01T03:00:00Z"), Some(hour(3)));
        assert_eq!(parse_timestamp("2005-01-01T03:00:00"), Some(hour(3)));
        assert_eq!(parse_timestamp("2005-01-01 03:00"), Some(hour(3)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn totals_sum_configured_columns() {
        let load = parse(
            "DATE,DC_cs_kWh,E_cs_kWh,Qcs_kWh,Qhs_kWh\n\
             2005-01-01 00:00:00,1.0,2.0,3.0,99\n\
             2005-01-01 01:00:00,0,0.5,0,99\n",
        )
        .expect("valid demand");
        assert_eq!(load.timestamps, vec![hour(0), hour(1)]);
        assert!((load.total_kwh[0] - 6.0).abs() < 1e-9);
        assert!((load.total_kwh[1] - 0.5).abs() < 1e-9);
        assert!(load.components.is_none());
    }

    #[test]
    fn components_read_when_both_columns_present() {
        let load = parse(
            "DATE,DC_cs_kWh,E_cs_kWh,Qcs_kWh,Q_reject_sens_kWh,Q_reject_lat_kWh\n\
             2005-01-01 00:00:00,0,0,10,7,3\n",
        )
        .expect("valid demand");
        let c = load.components.expect("components present");
        assert!((c.sensible_kwh[0] - 7.0).abs() < 1e-9);
        assert!((c.latent_kwh[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn missing_total_column_is_a_schema_error() {
        let err = parse("DATE,DC_cs_kWh\n2005-01-01 00:00:00,1\n");
        match err {
            Err(AggregateError::Schema { message, .. }) => {
                assert!(message.contains("E_cs_kWh"));
                assert!(message.contains("Qcs_kWh"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_value_names_row_and_column() {
        let err = parse(
            "DATE,DC_cs_kWh,E_cs_kWh,Qcs_kWh\n\
             2005-01-01 00:00:00,1,1,1\n\
             2005-01-01 01:00:00,1,n/a,1\n",
        );
        match err {
            Err(AggregateError::Schema { message, .. }) => {
                assert!(message.contains("row 3"));
                assert!(message.contains("E_cs_kWh"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn negative_column_is_recorded_even_when_total_is_positive() {
        let load = parse(
            "DATE,DC_cs_kWh,E_cs_kWh,Qcs_kWh\n\
             2005-01-01 00:00:00,0,25,-20\n\
             2005-01-01 01:00:00,0,1,2\n",
        )
        .expect("negatives are not fatal");
        assert!((load.total_kwh[0] - 5.0).abs() < 1e-9);
        assert_eq!(
            load.negatives,
            vec![NegativeColumn {
                column: "Qcs_kWh".into(),
                hours: 1,
                min_kwh: -20.0,
            }]
        );
    }

    #[test]
    fn non_finite_values_are_schema_errors() {
        for cell in ["NaN", "inf", "-inf"] {
            let err = parse(&format!(
                "DATE,DC_cs_kWh,E_cs_kWh,Qcs_kWh\n2005-01-01 00:00:00,0,{cell},3\n"
            ));
            match err {
                Err(AggregateError::Schema { message, .. }) => {
                    assert!(message.contains("row 2"), "{message}");
                    assert!(message.contains("E_cs_kWh"), "{message}");
                }
                other => panic!("expected schema error for {cell}, got {other:?}"),
            }
        }
    }

    #[test]
    fn repeated_timestamp_is_a_schema_error() {
        let err = parse(
            "DATE,DC_cs_kWh,E_cs_kWh,Qcs_kWh\n\
             2005-01-01 00:00:00,1,1,1\n\
             2005-01-01 00:00:00,1,1,1\n",
        );
        assert!(matches!(err, Err(AggregateError::Schema { .. })));
    }

    #[test]
    fn reader_reports_missing_file_as_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let reader = DemandReader::new(dir.path(), DemandConfig::default());
        assert!(matches!(
            reader.load("B404"),
            Err(AggregateError::Io { .. })
        ));
    }
}
