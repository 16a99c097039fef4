//! Building supply catalogue and supply-system database readers.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::missing_columns;
use crate::catalogue::{BuildingEntry, Catalogue, RejectionTechnology, SupplyScale};
use crate::error::ResolveError;

#[derive(Debug, Deserialize)]
struct SupplyRow {
    #[serde(rename = "Name")]
    name: String,
    type_cs: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseRow {
    code: String,
    scale: String,
}

fn open(path: &Path) -> Result<File, ResolveError> {
    File::open(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Reads building → cooling supply code pairs (`Name`, `type_cs`).
///
/// # Errors
///
/// [`ResolveError::Schema`] for missing columns, [`ResolveError::Csv`] for
/// malformed records.
pub fn parse_building_supply(
    input: impl Read,
    path: &Path,
) -> Result<Vec<(String, String)>, ResolveError> {
    let csv_err = |source| ResolveError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = reader(input);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let missing = missing_columns(&headers, &["Name", "type_cs"]);
    if !missing.is_empty() {
        return Err(ResolveError::Schema {
            path: path.to_path_buf(),
            message: format!("missing columns: {}", missing.join(", ")),
        });
    }

    rdr.deserialize::<SupplyRow>()
        .map(|r| r.map(|row| (row.name, row.type_cs)).map_err(csv_err))
        .collect()
}

/// Reads supply code → scale from the supply database (`code`, `scale`).
///
/// # Errors
///
/// [`ResolveError::Schema`] for missing columns, [`ResolveError::Csv`] for
/// malformed records.
pub fn parse_supply_database(
    input: impl Read,
    path: &Path,
) -> Result<BTreeMap<String, SupplyScale>, ResolveError> {
    let csv_err = |source| ResolveError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = reader(input);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let missing = missing_columns(&headers, &["code", "scale"]);
    if !missing.is_empty() {
        return Err(ResolveError::Schema {
            path: path.to_path_buf(),
            message: format!("missing columns: {}", missing.join(", ")),
        });
    }

    rdr.deserialize::<DatabaseRow>()
        .map(|r| {
            r.map(|row| (row.code, SupplyScale::from_label(&row.scale)))
                .map_err(csv_err)
        })
        .collect()
}

/// Joins building supplies with the supply database into a catalogue.
///
/// # Errors
///
/// [`ResolveError::Schema`] if a building uses a code absent from
/// `database`, or a building is listed twice.
pub fn build_catalogue(
    supplies: Vec<(String, String)>,
    database: &BTreeMap<String, SupplyScale>,
    cooling_tower_systems: &[String],
    path: &Path,
) -> Result<Catalogue, ResolveError> {
    let entries = supplies
        .into_iter()
        .map(|(name, code)| -> Result<BuildingEntry, ResolveError> {
            let scale = *database.get(&code).ok_or_else(|| ResolveError::Schema {
                path: path.to_path_buf(),
                message: format!("building \"{name}\" uses unknown supply code \"{code}\""),
            })?;
            Ok(BuildingEntry {
                technology: RejectionTechnology::from_supply_code(&code, cooling_tower_systems),
                name,
                supply_code: code,
                scale,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Catalogue::new(entries).map_err(|dup| ResolveError::Schema {
        path: path.to_path_buf(),
        message: dup.to_string(),
    })
}

/// Loads the building catalogue from the supply file and supply database.
///
/// # Errors
///
/// Any [`ResolveError`] from reading either file or joining them.
pub fn load_catalogue(
    building_supply: &Path,
    supply_database: &Path,
    cooling_tower_systems: &[String],
) -> Result<Catalogue, ResolveError> {
    let supplies = parse_building_supply(open(building_supply)?, building_supply)?;
    let database = parse_supply_database(open(supply_database)?, supply_database)?;
    build_catalogue(supplies, &database, cooling_tower_systems, building_supply)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPLY: &str = "Name,type_cs,type_hs\nB1,DC,H1\nB2,DC,H1\nB3,CT,H1\n";
    const DATABASE: &str = "code,description,scale\nDC,district plant,DISTRICT\nCT,tower,BUILDING\n";

    #[test]
    fn joins_supply_and_database() {
        let p = Path::new("supply.csv");
        let supplies = parse_building_supply(SUPPLY.as_bytes(), p).expect("valid supply");
        let db = parse_supply_database(DATABASE.as_bytes(), p).expect("valid database");
        let cat = build_catalogue(supplies, &db, &["CT".to_string()], p).expect("valid catalogue");

        assert_eq!(cat.len(), 3);
        let b1 = cat.get("B1").expect("B1 present");
        assert_eq!(b1.scale, SupplyScale::District);
        assert_eq!(b1.technology, RejectionTechnology::Other);
        let b3 = cat.get("B3").expect("B3 present");
        assert_eq!(b3.scale, SupplyScale::Building);
        assert_eq!(b3.technology, RejectionTechnology::WetCoolingTower);
    }

    #[test]
    fn unknown_code_is_a_schema_error() {
        let p = Path::new("supply.csv");
        let supplies = vec![("B1".to_string(), "ZZ".to_string())];
        let db = parse_supply_database(DATABASE.as_bytes(), p).expect("valid database");
        let err = build_catalogue(supplies, &db, &[], p);
        assert!(matches!(err, Err(ResolveError::Schema { .. })));
    }

    #[test]
    fn missing_type_cs_column_is_a_schema_error() {
        let err = parse_building_supply("Name,type_hs\nB1,H1\n".as_bytes(), Path::new("s.csv"));
        assert!(matches!(err, Err(ResolveError::Schema { .. })));
    }
}
