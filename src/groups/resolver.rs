//! Group resolution from a user group file or from supply-system metadata.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::assignment::{
    Assignment, FIRST_GROUP_NUMBER, Group, LAST_GROUP_NUMBER, SharedSystemConflict, group_id,
    is_group_id,
};
use crate::catalogue::{BuildingEntry, Catalogue, SupplyScale};
use crate::error::ResolveError;
use crate::io::group_file::read_group_file;

/// One parsed row of a group file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub group: String,
    pub buildings: Vec<String>,
}

/// Where the assignment of a run came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Read from a user-supplied group file.
    GroupFile { path: PathBuf },
    /// Derived from supply-system scales.
    Automatic,
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupFile { path } => write!(f, "group file {}", path.display()),
            Self::Automatic => write!(f, "automatic (groups helper)"),
        }
    }
}

/// A validated assignment and how it was obtained.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub assignment: Assignment,
    pub mode: ResolutionMode,
    /// District supplies split across user groups. Always empty for
    /// automatic resolution.
    pub conflicts: Vec<SharedSystemConflict>,
}

/// Resolves the assignment for a run.
///
/// Reads `group_file` when it exists, otherwise derives groups from the
/// catalogue. A user file is authoritative: district supplies it splits are
/// reported as conflicts but never merged.
///
/// # Errors
///
/// Any [`ResolveError`]; no partial assignment is returned.
pub fn resolve(group_file: &Path, catalogue: &Catalogue) -> Result<Resolution, ResolveError> {
    if !group_file.is_file() {
        info!(
            path = %group_file.display(),
            "no group file, each building forms its own group unless on a district system"
        );
        return Ok(Resolution {
            assignment: derive_groups(catalogue)?,
            mode: ResolutionMode::Automatic,
            conflicts: Vec::new(),
        });
    }

    let rows = read_group_file(group_file)?;
    let assignment = resolve_rows(rows, catalogue, group_file)?;
    let conflicts = assignment.shared_system_conflicts(catalogue);
    for c in &conflicts {
        warn!(
            supply = %c.supply_code,
            groups = %c.groups.join(","),
            "district supply is split across user groups; keeping the group file as given"
        );
    }

    Ok(Resolution {
        assignment,
        mode: ResolutionMode::GroupFile {
            path: group_file.to_path_buf(),
        },
        conflicts,
    })
}

/// Validates group file rows and completes them with singleton groups for
/// catalogue buildings the file leaves out.
///
/// # Errors
///
/// - [`ResolveError::Schema`] for identifiers not matching `G####`
/// - [`ResolveError::DuplicateGroupId`] for a repeated group identifier
/// - [`ResolveError::EmptyGroup`] for a row without buildings
/// - [`ResolveError::UnknownBuilding`] for a building missing from `catalogue`
/// - [`ResolveError::DuplicateAssignment`] for a building listed twice
/// - [`ResolveError::MixedTechnology`] for a group mixing technologies
/// - [`ResolveError::TooManyGroups`] when no `G####` is left for a
///   building the file leaves out
pub fn resolve_rows(
    rows: Vec<GroupRow>,
    catalogue: &Catalogue,
    source: &Path,
) -> Result<Assignment, ResolveError> {
    let mut used_ids = BTreeSet::new();
    let mut owners: BTreeMap<String, String> = BTreeMap::new();
    let mut groups = Vec::with_capacity(rows.len());

    for row in rows {
        if !is_group_id(&row.group) {
            return Err(ResolveError::Schema {
                path: source.to_path_buf(),
                message: format!("group id \"{}\" does not match G####", row.group),
            });
        }
        if !used_ids.insert(row.group.clone()) {
            return Err(ResolveError::DuplicateGroupId { group: row.group });
        }
        if row.buildings.is_empty() {
            return Err(ResolveError::EmptyGroup { group: row.group });
        }
        for building in &row.buildings {
            if !catalogue.contains(building) {
                return Err(ResolveError::UnknownBuilding {
                    group: row.group.clone(),
                    building: building.clone(),
                });
            }
            if let Some(first) = owners.insert(building.clone(), row.group.clone()) {
                return Err(ResolveError::DuplicateAssignment {
                    building: building.clone(),
                    first,
                    second: row.group.clone(),
                });
            }
        }
        groups.push(Group::new(row.group, row.buildings, catalogue)?);
    }

    let unassigned: Vec<&BuildingEntry> = catalogue
        .iter()
        .filter(|entry| !owners.contains_key(&entry.name))
        .collect();
    let needed = groups.len() + unassigned.len();
    let mut next = FIRST_GROUP_NUMBER;
    for entry in unassigned {
        let id = loop {
            if next > LAST_GROUP_NUMBER {
                return Err(ResolveError::TooManyGroups { groups: needed });
            }
            let candidate = group_id(next);
            next += 1;
            if !used_ids.contains(&candidate) {
                break candidate;
            }
        };
        debug!(building = %entry.name, group = %id, "building not in group file, assigned alone");
        used_ids.insert(id.clone());
        groups.push(Group::new(id, vec![entry.name.clone()], catalogue)?);
    }

    Ok(Assignment::from_groups(groups))
}

/// Derives groups from supply scales alone.
///
/// Buildings with their own supply become singleton groups; buildings on the
/// same district supply form one group. Groups are numbered from `G1000` in
/// order of their smallest member, so the result depends only on building
/// identifiers and supply codes.
///
/// # Errors
///
/// [`ResolveError::TooManyGroups`] if the groups would need identifiers past
/// `G9999`.
pub fn derive_groups(catalogue: &Catalogue) -> Result<Assignment, ResolveError> {
    let mut members: Vec<Vec<String>> = Vec::new();
    let mut districts: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for entry in catalogue.iter() {
        match entry.scale {
            SupplyScale::Building => members.push(vec![entry.name.clone()]),
            SupplyScale::District => districts
                .entry(entry.supply_code.as_str())
                .or_default()
                .push(entry.name.clone()),
        }
    }
    members.extend(districts.into_values());
    members.sort();
    if members.len() > (LAST_GROUP_NUMBER - FIRST_GROUP_NUMBER + 1) as usize {
        return Err(ResolveError::TooManyGroups {
            groups: members.len(),
        });
    }

    let groups = members
        .into_iter()
        .zip(FIRST_GROUP_NUMBER..)
        .map(|(buildings, number)| Group::new(group_id(number), buildings, catalogue))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        groups = groups.len(),
        buildings = catalogue.len(),
        "derived building groups"
    );
    Ok(Assignment::from_groups(groups))
}
