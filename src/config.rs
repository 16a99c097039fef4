//! TOML-based run configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level run configuration parsed from TOML.
///
/// All sections have defaults matching the platform's scenario layout. Load
/// from TOML with [`RunConfig::from_toml_file`] or use [`RunConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Scenario-relative input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Technology classification and execution parameters.
    #[serde(default)]
    pub heat_rejection: HeatRejectionConfig,
    /// Column layout of per-building demand results.
    #[serde(default)]
    pub demand: DemandConfig,
}

/// Input and output locations. Relative paths resolve against `scenario`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Scenario root directory.
    pub scenario: PathBuf,
    /// User group file (`Group,Buildings`). Groups are derived when absent.
    pub group_file: PathBuf,
    /// Building → cooling supply code (`Name,type_cs`).
    pub building_supply: PathBuf,
    /// Supply code → scale (`code,scale`).
    pub supply_database: PathBuf,
    /// Directory holding one `{building}.csv` of hourly demand per building.
    pub demand_dir: PathBuf,
    /// Directory receiving one `{group}.csv` per group.
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scenario: PathBuf::from("."),
            group_file: PathBuf::from("inputs/groups/groups.csv"),
            building_supply: PathBuf::from("inputs/building-properties/supply_systems.csv"),
            supply_database: PathBuf::from("inputs/technology/assemblies/SUPPLY_COOLING.csv"),
            demand_dir: PathBuf::from("outputs/data/demand"),
            output_dir: PathBuf::from("outputs/data/heat_rejection"),
        }
    }
}

/// Technology classification and execution parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatRejectionConfig {
    /// Cooling supply codes that reject heat through wet cooling towers.
    pub cooling_tower_systems: Vec<String>,
    /// Worker threads for per-group processing (0 = one per CPU).
    pub workers: usize,
    /// Hourly component sums at or below this are treated as zero (kWh).
    pub tolerance_kwh: f64,
}

impl Default for HeatRejectionConfig {
    fn default() -> Self {
        Self {
            cooling_tower_systems: vec![
                "SUPPLY_COOLING_AS1".to_string(),
                "SUPPLY_COOLING_AS3".to_string(),
            ],
            workers: 0,
            tolerance_kwh: 1e-6,
        }
    }
}

/// Column names of the per-building demand results.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandConfig {
    /// Hourly timestamp column.
    pub date_column: String,
    /// Columns summed into the hourly rejected heat (kWh).
    pub total_columns: Vec<String>,
    /// Sensible component column, required for wet cooling towers.
    pub sensible_column: String,
    /// Latent component column, required for wet cooling towers.
    pub latent_column: String,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            date_column: "DATE".to_string(),
            total_columns: vec![
                "DC_cs_kWh".to_string(),
                "E_cs_kWh".to_string(),
                "Qcs_kWh".to_string(),
            ],
            sensible_column: "Q_reject_sens_kWh".to_string(),
            latent_column: "Q_reject_lat_kWh".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"demand.total_columns"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl RunConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Resolves a configured path against the scenario directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.paths.scenario.join(path)
    }

    pub fn group_file(&self) -> PathBuf {
        self.resolve(&self.paths.group_file)
    }

    pub fn building_supply(&self) -> PathBuf {
        self.resolve(&self.paths.building_supply)
    }

    pub fn supply_database(&self) -> PathBuf {
        self.resolve(&self.paths.supply_database)
    }

    pub fn demand_dir(&self) -> PathBuf {
        self.resolve(&self.paths.demand_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.paths.output_dir)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let hr = &self.heat_rejection;
        if hr.tolerance_kwh.is_nan() || hr.tolerance_kwh < 0.0 {
            errors.push(ConfigError {
                field: "heat_rejection.tolerance_kwh".into(),
                message: "must be >= 0".into(),
            });
        }
        if hr.cooling_tower_systems.iter().any(|c| c.trim().is_empty()) {
            errors.push(ConfigError {
                field: "heat_rejection.cooling_tower_systems".into(),
                message: "codes must not be blank".into(),
            });
        }

        let d = &self.demand;
        if d.total_columns.is_empty() {
            errors.push(ConfigError {
                field: "demand.total_columns".into(),
                message: "must name at least one column".into(),
            });
        }
        for (field, value) in [
            ("demand.date_column", &d.date_column),
            ("demand.sensible_column", &d.sensible_column),
            ("demand.latent_column", &d.latent_column),
        ] {
            if value.trim().is_empty() {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must not be blank".into(),
                });
            }
        }
        if d.total_columns.iter().any(|c| c.trim().is_empty()) {
            errors.push(ConfigError {
                field: "demand.total_columns".into(),
                message: "column names must not be blank".into(),
            });
        }
        if d.sensible_column == d.latent_column {
            errors.push(ConfigError {
                field: "demand.latent_column".into(),
                message: "must differ from demand.sensible_column".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let cfg = RunConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[paths]
scenario = "/data/scenario"
group_file = "inputs/groups/custom.csv"
output_dir = "/tmp/heat"

[heat_rejection]
cooling_tower_systems = ["CT1", "CT2"]
workers = 4
tolerance_kwh = 0.001

[demand]
date_column = "Date"
total_columns = ["Q_reject_kWh"]
sensible_column = "sens"
latent_column = "lat"
"#;
        let cfg = RunConfig::from_toml_str(toml).expect("valid TOML should parse");
        assert_eq!(cfg.heat_rejection.workers, 4);
        assert_eq!(
            cfg.group_file(),
            PathBuf::from("/data/scenario/inputs/groups/custom.csv")
        );
        // absolute paths are not re-rooted
        assert_eq!(cfg.output_dir(), PathBuf::from("/tmp/heat"));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[heat_rejection]
workers = 2
bogus_field = true
"#;
        assert!(RunConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[heat_rejection]
workers = 2
"#;
        let cfg = RunConfig::from_toml_str(toml).expect("partial TOML should parse");
        assert_eq!(cfg.heat_rejection.workers, 2);
        assert_eq!(cfg.demand.date_column, "DATE");
        assert_eq!(cfg.heat_rejection.cooling_tower_systems.len(), 2);
    }

    #[test]
    fn validation_catches_empty_total_columns() {
        let mut cfg = RunConfig::default();
        cfg.demand.total_columns.clear();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "demand.total_columns"));
    }

    #[test]
    fn validation_catches_negative_tolerance() {
        let mut cfg = RunConfig::default();
        cfg.heat_rejection.tolerance_kwh = -1.0;
        let errors = cfg.validate();
        assert!(errors
            .iter()
            .any(|e| e.field == "heat_rejection.tolerance_kwh"));
    }

    #[test]
    fn validation_catches_identical_component_columns() {
        let mut cfg = RunConfig::default();
        cfg.demand.latent_column = cfg.demand.sensible_column.clone();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "demand.latent_column"));
    }
}
