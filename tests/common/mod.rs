//! Shared scenario fixtures for integration tests.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use heat_rejection::config::RunConfig;
use tempfile::TempDir;

/// District chiller shared by B1 and B2.
pub const DISTRICT_CODE: &str = "SUPPLY_COOLING_AS5";
/// Building-scale wet cooling tower used by B3.
pub const TOWER_CODE: &str = "SUPPLY_COOLING_AS1";
/// Hours in every fixture series.
pub const HOURS: usize = 24;

/// A throwaway scenario directory laid out with the default paths.
pub struct Scenario {
    dir: TempDir,
}

impl Scenario {
    /// Empty scenario with only the supply database written.
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("create temp scenario");
        let scenario = Self { dir };
        scenario.write(
            "inputs/technology/assemblies/SUPPLY_COOLING.csv",
            &format!(
                "description,code,scale\n\
                 district chiller,{DISTRICT_CODE},DISTRICT\n\
                 wet tower,{TOWER_CODE},BUILDING\n\
                 dry chiller,SUPPLY_COOLING_AS2,BUILDING\n"
            ),
        );
        scenario
    }

    /// B1 and B2 on a shared district system, B3 on its own wet tower.
    ///
    /// B1 and B2 reject `h + 1` and `2 * (h + 1)` kWh in hour `h`; B3 rejects
    /// `10 * (h + 1)` kWh split 70/30 into sensible and latent.
    pub fn district_and_tower() -> Self {
        let scenario = Self::empty();
        scenario.write(
            "inputs/building-properties/supply_systems.csv",
            &format!(
                "Name,type_cs,type_hs\n\
                 B1,{DISTRICT_CODE},SUPPLY_HEATING_AS1\n\
                 B2,{DISTRICT_CODE},SUPPLY_HEATING_AS1\n\
                 B3,{TOWER_CODE},SUPPLY_HEATING_AS1\n"
            ),
        );
        scenario.write_demand("B1", &ramp(HOURS, 1.0), None);
        scenario.write_demand("B2", &ramp(HOURS, 2.0), None);
        let b3 = ramp(HOURS, 10.0);
        let sens: Vec<f64> = b3.iter().map(|t| 0.7 * t).collect();
        let lat: Vec<f64> = b3.iter().zip(&sens).map(|(t, s)| t - s).collect();
        scenario.write_demand("B3", &b3, Some((sens.as_slice(), lat.as_slice())));
        scenario
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Default configuration rooted at this scenario.
    pub fn config(&self) -> RunConfig {
        let mut cfg = RunConfig::default();
        cfg.paths.scenario = self.root().to_path_buf();
        cfg
    }

    /// Writes `contents` to a scenario-relative path, creating parents.
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(path, contents).expect("write fixture");
    }

    /// Writes a building's demand results, one row per value of `total`.
    ///
    /// The total is placed in `Qcs_kWh`; the other total columns are zero.
    pub fn write_demand(&self, building: &str, total: &[f64], components: Option<(&[f64], &[f64])>) {
        let mut csv = String::from("DATE,DC_cs_kWh,E_cs_kWh,Qcs_kWh");
        if components.is_some() {
            csv.push_str(",Q_reject_sens_kWh,Q_reject_lat_kWh");
        }
        csv.push('\n');
        for (h, t) in total.iter().enumerate() {
            let _ = write!(csv, "2005-01-01 {h:02}:00:00+08:00,0,0,{t}");
            if let Some((sens, lat)) = components {
                let _ = write!(csv, ",{},{}", sens[h], lat[h]);
            }
            csv.push('\n');
        }
        self.write(&format!("outputs/data/demand/{building}.csv"), &csv);
    }

    pub fn output(&self, group: &str) -> PathBuf {
        self.root()
            .join("outputs/data/heat_rejection")
            .join(format!("{group}.csv"))
    }

    pub fn group_file(&self) -> PathBuf {
        self.root().join("inputs/groups/groups.csv")
    }
}

/// `scale * (h + 1)` for each hour.
pub fn ramp(hours: usize, scale: f64) -> Vec<f64> {
    (0..hours).map(|h| scale * (h as f64 + 1.0)).collect()
}

/// One parsed output row: (date, sensible, latent, total).
pub type OutputRow = (String, f64, f64, f64);

/// Reads a group output file back.
pub fn read_output(path: &Path) -> Vec<OutputRow> {
    let mut rdr = csv::Reader::from_path(path).expect("open output");
    let headers = rdr.headers().expect("output header").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["Date", "Q_reject_sens_kWh", "Q_reject_lat_kWh", "Q_reject_kWh"]
    );
    rdr.records()
        .map(|r| {
            let r = r.expect("output row");
            let num = |i: usize| r[i].parse::<f64>().expect("numeric cell");
            (r[0].to_string(), num(1), num(2), num(3))
        })
        .collect()
}
