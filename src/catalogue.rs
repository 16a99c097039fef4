//! Building catalogue: which cooling supply serves each building, at what
//! scale, and how that supply rejects its heat.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::DuplicateBuilding;

/// How a cooling supply rejects heat to the environment.
///
/// Only wet cooling towers produce a latent share; every other technology is
/// treated as 100% sensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionTechnology {
    WetCoolingTower,
    Other,
}

impl RejectionTechnology {
    /// Classifies a supply code against the configured wet-cooling-tower codes.
    ///
    /// # Examples
    ///
    /// ```
    /// use heat_rejection::catalogue::RejectionTechnology;
    ///
    /// let towers = vec!["SUPPLY_COOLING_AS1".to_string()];
    /// assert_eq!(
    ///     RejectionTechnology::from_supply_code("SUPPLY_COOLING_AS1", &towers),
    ///     RejectionTechnology::WetCoolingTower
    /// );
    /// assert_eq!(
    ///     RejectionTechnology::from_supply_code("SUPPLY_COOLING_AS0", &towers),
    ///     RejectionTechnology::Other
    /// );
    /// ```
    pub fn from_supply_code(code: &str, cooling_tower_systems: &[String]) -> Self {
        if cooling_tower_systems.iter().any(|c| c == code) {
            Self::WetCoolingTower
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for RejectionTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WetCoolingTower => write!(f, "wet cooling tower"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Whether a supply serves one building or is shared through a district plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyScale {
    Building,
    District,
}

impl SupplyScale {
    /// Parses the supply database `scale` column. Anything other than
    /// `DISTRICT` (case-insensitive) is an individually owned system.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("district") {
            Self::District
        } else {
            Self::Building
        }
    }
}

/// One building and the cooling supply serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingEntry {
    /// Unique building identifier.
    pub name: String,
    /// Cooling supply assembly code (`type_cs`).
    pub supply_code: String,
    pub scale: SupplyScale,
    pub technology: RejectionTechnology,
}

/// All buildings of a scenario, keyed and iterated by building identifier.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    buildings: BTreeMap<String, BuildingEntry>,
}

impl Catalogue {
    /// Builds a catalogue from entries.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateBuilding`] for the first building listed twice.
    pub fn new(
        entries: impl IntoIterator<Item = BuildingEntry>,
    ) -> Result<Self, DuplicateBuilding> {
        let mut buildings = BTreeMap::new();
        for entry in entries {
            if buildings.contains_key(&entry.name) {
                return Err(DuplicateBuilding { name: entry.name });
            }
            buildings.insert(entry.name.clone(), entry);
        }
        Ok(Self { buildings })
    }

    pub fn get(&self, name: &str) -> Option<&BuildingEntry> {
        self.buildings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.buildings.contains_key(name)
    }

    /// Entries in ascending building-identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildingEntry> {
        self.buildings.values()
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}
