#![deny(warnings)]

//! YAML configuration for building a robot: designation, sensors, processor,
//! starting resources and the upgrade catalog.

use robot_core::{validate_processor, Processor, ResourceKind};
use robot_sensors::{build_sensor, SensorKind, SensorRegistry, SensorSpecs, DEFAULT_NOISE_SEED};
use robot_upgrades::{basic_catalog, Robot, UpgradeCatalog, UpgradeCategory, UpgradeSpec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// One installed sensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub kind: SensorKind,
    #[serde(flatten)]
    pub specs: SensorSpecs,
}

/// One catalog upgrade with its category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeEntry {
    pub category: UpgradeCategory,
    #[serde(flatten)]
    pub spec: UpgradeSpec,
}

/// Robot configuration. Every field is optional in YAML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub designation: String,
    /// Seed for the sensor noise stream.
    pub rng_seed: u64,
    /// Initial power level in [0, 100].
    pub power_percent: f32,
    pub processor: Processor,
    pub sensors: Vec<SensorEntry>,
    /// Starting balances.
    pub resources: BTreeMap<ResourceKind, u64>,
    /// Register the built-in upgrades before `upgrades`.
    pub include_basic_upgrades: bool,
    pub upgrades: Vec<UpgradeEntry>,
}

fn sensor(kind: SensorKind, range: f64, precision: f64, power_consumption: f64) -> SensorEntry {
    SensorEntry {
        kind,
        specs: SensorSpecs {
            range,
            precision,
            power_consumption,
        },
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            designation: "SEED-01".to_string(),
            rng_seed: DEFAULT_NOISE_SEED,
            power_percent: 87.0,
            processor: Processor::default(),
            sensors: vec![
                sensor(SensorKind::Temperature, 10.0, 0.9, 0.5),
                sensor(SensorKind::Pressure, 5.0, 0.8, 0.3),
                sensor(SensorKind::WindSpeed, 20.0, 0.7, 0.4),
                sensor(SensorKind::Radiation, 2.0, 0.95, 0.2),
            ],
            resources: BTreeMap::new(),
            include_basic_upgrades: true,
            upgrades: vec![],
        }
    }
}

impl RobotConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: RobotConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let cfg = Self::from_yaml_str(&text)?;
        info!(path = %path.as_ref().display(), designation = %cfg.designation, "loaded robot config");
        Ok(cfg)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Replace the noise seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.designation.trim().is_empty() {
            return Err(ConfigError::Invalid("designation must not be empty".into()));
        }
        robot_core::validate_power_percent(self.power_percent)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        validate_processor(&self.processor).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let mut kinds = BTreeSet::new();
        for entry in &self.sensors {
            if !kinds.insert(entry.kind) {
                return Err(ConfigError::Invalid(format!(
                    "sensor {} listed more than once",
                    entry.kind
                )));
            }
            robot_sensors::validate_specs(&entry.specs)
                .map_err(|e| ConfigError::Invalid(format!("sensor {}: {e}", entry.kind)))?;
        }
        Ok(())
    }

    fn catalog(&self) -> Result<UpgradeCatalog, ConfigError> {
        let mut catalog = if self.include_basic_upgrades {
            basic_catalog()
        } else {
            UpgradeCatalog::new()
        };
        for entry in &self.upgrades {
            catalog
                .register(entry.category, entry.spec.clone())
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(catalog)
    }

    /// Construct the robot described by this config.
    pub fn build_robot(&self) -> Result<Robot, ConfigError> {
        self.validate()?;
        let mut sensors = SensorRegistry::with_seed(self.rng_seed);
        for entry in &self.sensors {
            let s = build_sensor(entry.kind, entry.specs.clone())
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            sensors.register(s);
        }
        let mut robot = Robot::new(
            self.designation.clone(),
            sensors,
            self.processor.clone(),
            self.catalog()?,
        );
        robot
            .set_power_percent(self.power_percent)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        for (&kind, &amount) in &self.resources {
            robot.grant(kind, amount);
        }
        info!(
            designation = robot.designation(),
            sensors = robot.sensors().len(),
            upgrades = robot.catalog().len(),
            "robot built"
        );
        Ok(robot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"
designation: SEED-07
rng_seed: 7
power_percent: 50
processor: { instructions_per_second: 2000, memory_kb: 64 }
sensors:
  - { kind: TEMPERATURE, range: 10.0, precision: 0.9, power_consumption: 0.5 }
  - { kind: PRESSURE, range: 4.0, precision: 1.0, power_consumption: 0.1 }
resources: { METAL: 10, SILICON: 5 }
include_basic_upgrades: false
upgrades:
  - category: SENSOR_RANGE
    id: long-range-1
    name: Long Range Barometer
    requirements: { COPPER: 3 }
    effect: { type: scale_sensor_range, sensor: PRESSURE, factor: 2.0 }
"#;

    #[test]
    fn default_config_builds_seed_01() {
        let robot = RobotConfig::default().build_robot().unwrap();
        assert_eq!(robot.designation(), "SEED-01");
        assert_eq!(robot.sensors().len(), 4);
        assert_eq!(robot.catalog().len(), 3);
        assert_eq!(robot.power_percent(), 87.0);
    }

    #[test]
    fn sample_yaml_parses_and_builds() {
        let cfg = RobotConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(cfg.designation, "SEED-07");
        assert_eq!(cfg.sensors.len(), 2);
        assert_eq!(cfg.upgrades[0].spec.description, "");
        let mut robot = cfg.build_robot().unwrap();
        assert_eq!(robot.catalog().len(), 1);
        assert_eq!(robot.ledger().balance(ResourceKind::Metal), 10);
        assert_eq!(robot.processor().instructions_per_second, 2000);
        robot.grant(ResourceKind::Copper, 3);
        robot.apply("long-range-1").unwrap();
        let range = robot.sensors().get(SensorKind::Pressure).unwrap().range();
        assert_eq!(range, 8.0);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let cfg = RobotConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, RobotConfig::default());
    }

    #[test]
    fn out_of_range_precision_is_invalid() {
        let text = "sensors:\n  - { kind: RADIATION, range: 1.0, precision: 1.5, power_consumption: 0.1 }\n";
        let err = RobotConfig::from_yaml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn duplicate_sensor_kind_is_invalid() {
        let mut cfg = RobotConfig::default();
        cfg.sensors.push(sensor(SensorKind::Temperature, 1.0, 0.5, 0.1));
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn upgrade_id_clashing_with_builtin_is_invalid() {
        let mut cfg = RobotConfig::default();
        let (category, spec) = basic_catalog()
            .find("basic-proc-1")
            .map(|(c, s)| (c, s.clone()))
            .unwrap();
        cfg.upgrades.push(UpgradeEntry { category, spec });
        let err = cfg.build_robot().unwrap_err();
        assert!(err.to_string().contains("duplicate upgrade id"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = RobotConfig::from_yaml_str("sensors: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn yaml_roundtrip_preserves_config() {
        let cfg = RobotConfig::from_yaml_str(SAMPLE).unwrap();
        let text = cfg.to_yaml_string().unwrap();
        let back = RobotConfig::from_yaml_str(&text).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let dir = std::env::temp_dir().join(format!("robot-config-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("robot.yaml");
        fs::write(&path, SAMPLE).unwrap();
        let cfg = RobotConfig::load(&path).unwrap();
        assert_eq!(cfg.rng_seed, 7);
        let missing: PathBuf = dir.join("absent.yaml");
        assert!(matches!(RobotConfig::load(missing), Err(ConfigError::Io(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
