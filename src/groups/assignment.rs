//! Groups of buildings sharing a heat-rejection point, and the assignment of
//! every catalogue building to exactly one group.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::catalogue::{Catalogue, RejectionTechnology, SupplyScale};
use crate::error::ResolveError;

/// First numeric suffix handed out for generated group identifiers.
pub const FIRST_GROUP_NUMBER: u32 = 1000;
/// Last numeric suffix that still fits `G####`.
pub const LAST_GROUP_NUMBER: u32 = 9999;

/// Returns true for identifiers of the form `G####`.
///
/// # Examples
///
/// ```
/// use heat_rejection::groups::is_group_id;
///
/// assert!(is_group_id("G1000"));
/// assert!(!is_group_id("G12"));
/// assert!(!is_group_id("B1000"));
/// ```
pub fn is_group_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 5 && bytes[0] == b'G' && bytes[1..].iter().all(u8::is_ascii_digit)
}

/// Formats a group number as an identifier.
pub fn group_id(number: u32) -> String {
    format!("G{number}")
}

/// A set of buildings rejecting heat through one common point.
///
/// The technology is derived from the members when the group is built, so a
/// `Group` can never hold buildings with different rejection technologies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    id: String,
    buildings: Vec<String>,
    technology: RejectionTechnology,
}

impl Group {
    /// Builds a group, sorting its members by building identifier.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::EmptyGroup`] if `buildings` is empty
    /// - [`ResolveError::UnknownBuilding`] if a member is not in `catalogue`
    /// - [`ResolveError::MixedTechnology`] if members disagree on technology
    pub fn new(
        id: impl Into<String>,
        mut buildings: Vec<String>,
        catalogue: &Catalogue,
    ) -> Result<Self, ResolveError> {
        let id = id.into();
        buildings.sort();

        let mut technologies: BTreeMap<String, RejectionTechnology> = BTreeMap::new();
        for name in &buildings {
            let entry = catalogue
                .get(name)
                .ok_or_else(|| ResolveError::UnknownBuilding {
                    group: id.clone(),
                    building: name.clone(),
                })?;
            technologies.insert(name.clone(), entry.technology);
        }

        let Some(technology) = technologies.values().next().copied() else {
            return Err(ResolveError::EmptyGroup { group: id });
        };
        if technologies.values().any(|t| *t != technology) {
            let details = technologies
                .iter()
                .map(|(name, t)| format!("{name}={t}"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ResolveError::MixedTechnology { group: id, details });
        }

        Ok(Self {
            id,
            buildings,
            technology,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Member building identifiers, ascending.
    pub fn buildings(&self) -> &[String] {
        &self.buildings
    }

    pub fn technology(&self) -> RejectionTechnology {
        self.technology
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.id,
            self.technology,
            self.buildings.join(",")
        )
    }
}

/// District supply whose buildings a user group file split across groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedSystemConflict {
    pub supply_code: String,
    pub groups: Vec<String>,
}

/// Immutable mapping of group identifiers to member buildings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    groups: Vec<Group>,
}

impl Assignment {
    /// Wraps already validated groups, ordering them by identifier.
    pub(crate) fn from_groups(mut groups: Vec<Group>) -> Self {
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        Self { groups }
    }

    /// Groups in ascending identifier order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups
            .binary_search_by(|g| g.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.groups[idx])
    }

    /// The group a building belongs to.
    pub fn group_of(&self, building: &str) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.buildings.binary_search_by(|b| b.as_str().cmp(building)).is_ok())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of assigned buildings.
    pub fn building_count(&self) -> usize {
        self.groups.iter().map(|g| g.buildings.len()).sum()
    }

    /// District supplies whose buildings are spread over more than one group.
    pub fn shared_system_conflicts(&self, catalogue: &Catalogue) -> Vec<SharedSystemConflict> {
        let mut by_system: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for group in &self.groups {
            for name in &group.buildings {
                let Some(entry) = catalogue.get(name) else {
                    continue;
                };
                if entry.scale == SupplyScale::District {
                    by_system
                        .entry(entry.supply_code.as_str())
                        .or_default()
                        .insert(group.id.as_str());
                }
            }
        }

        by_system
            .into_iter()
            .filter(|(_, groups)| groups.len() > 1)
            .map(|(code, groups)| SharedSystemConflict {
                supply_code: code.to_string(),
                groups: groups.into_iter().map(str::to_string).collect(),
            })
            .collect()
    }
}
