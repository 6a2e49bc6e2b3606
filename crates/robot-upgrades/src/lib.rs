#![deny(warnings)]

//! Resource-gated upgrades for the Seed robot.
//!
//! This crate provides:
//! - Upgrade specifications with data-described effects on sensors or the processor
//! - A catalog grouping specifications by category, with globally unique ids
//! - The `Robot` entity owning ledger, sensors, processor and catalog
//! - `SharedRobot`, a handle that serialises every operation behind one lock

use robot_core::{
    scale_u64, validate_power_percent, LedgerError, ParseTagError, Position, Processor,
    Requirements, ResourceKind, ResourceLedger, ValidationError,
};
use robot_sensors::{
    Environment, SensorError, SensorKind, SensorReading, SensorRegistry, SensorUpgrade,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{info, warn};

/// Groups of related upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeCategory {
    SensorRange,
    SensorPrecision,
    Processor,
}

impl UpgradeCategory {
    pub const ALL: [UpgradeCategory; 3] = [
        UpgradeCategory::SensorRange,
        UpgradeCategory::SensorPrecision,
        UpgradeCategory::Processor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UpgradeCategory::SensorRange => "SENSOR_RANGE",
            UpgradeCategory::SensorPrecision => "SENSOR_PRECISION",
            UpgradeCategory::Processor => "PROCESSOR",
        }
    }
}

impl fmt::Display for UpgradeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpgradeCategory {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        UpgradeCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParseTagError {
                what: "upgrade category",
                value: s.to_string(),
            })
    }
}

/// Errors produced by the upgrade catalog and the robot.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum UpgradeError {
    #[error("unknown upgrade: {0}")]
    UnknownUpgrade(String),
    #[error("duplicate upgrade id: {0}")]
    DuplicateUpgradeId(String),
    #[error("invalid upgrade spec: {0}")]
    InvalidSpec(String),
    #[error(transparent)]
    InsufficientResources(#[from] LedgerError),
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// What an upgrade does to the robot once paid for.
///
/// Each variant is a pure function of its parameters and the target parts;
/// `apply` either fully succeeds or leaves the target untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// range <- range * factor
    ScaleSensorRange { sensor: SensorKind, factor: f64 },
    SetSensorPrecision { sensor: SensorKind, precision: f64 },
    /// precision <- min(1, precision + delta)
    ImproveSensorPrecision { sensor: SensorKind, delta: f64 },
    /// ips <- ips * factor
    ScaleProcessorIps { factor: f64 },
}

impl UpgradeEffect {
    /// Reject parameters that could never apply successfully.
    pub fn validate(&self) -> Result<(), UpgradeError> {
        match *self {
            UpgradeEffect::ScaleSensorRange { factor, .. }
            | UpgradeEffect::ScaleProcessorIps { factor } => {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(UpgradeError::InvalidSpec(format!(
                        "scale factor {factor} must be finite and > 0"
                    )));
                }
            }
            UpgradeEffect::SetSensorPrecision { precision, .. } => {
                if !(0.0..=1.0).contains(&precision) {
                    return Err(UpgradeError::InvalidSpec(format!(
                        "precision {precision} must be within [0,1]"
                    )));
                }
            }
            UpgradeEffect::ImproveSensorPrecision { delta, .. } => {
                if !delta.is_finite() || delta <= 0.0 {
                    return Err(UpgradeError::InvalidSpec(format!(
                        "precision delta {delta} must be finite and > 0"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn apply(
        &self,
        sensors: &mut SensorRegistry,
        processor: &mut Processor,
    ) -> Result<(), UpgradeError> {
        match *self {
            UpgradeEffect::ScaleSensorRange { sensor, factor } => {
                let target = sensors
                    .get_mut(sensor)
                    .ok_or(SensorError::SensorNotFound(sensor))?;
                let range = target.range() * factor;
                target.upgrade(&SensorUpgrade::range(range))?;
            }
            UpgradeEffect::SetSensorPrecision { sensor, precision } => {
                sensors.upgrade_sensor(sensor, None, Some(precision))?;
            }
            UpgradeEffect::ImproveSensorPrecision { sensor, delta } => {
                let target = sensors
                    .get_mut(sensor)
                    .ok_or(SensorError::SensorNotFound(sensor))?;
                let precision = (target.precision() + delta).min(1.0);
                target.upgrade(&SensorUpgrade::precision(precision))?;
            }
            UpgradeEffect::ScaleProcessorIps { factor } => {
                let ips = scale_u64(processor.instructions_per_second, factor)?;
                processor.upgrade(ips)?;
            }
        }
        Ok(())
    }
}

/// A purchasable upgrade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSpec {
    /// Globally unique id, e.g. "basic-range-1".
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Resources consumed on application; every amount > 0.
    pub requirements: Requirements,
    pub effect: UpgradeEffect,
}

/// Validate an upgrade specification before it enters a catalog.
pub fn validate_spec(spec: &UpgradeSpec) -> Result<(), UpgradeError> {
    if spec.id.trim().is_empty() {
        return Err(UpgradeError::InvalidSpec("upgrade id must not be empty".into()));
    }
    if let Some((kind, _)) = spec.requirements.iter().find(|(_, &amount)| amount == 0) {
        return Err(UpgradeError::InvalidSpec(format!(
            "{}: requirement for {kind} must be > 0",
            spec.id
        )));
    }
    spec.effect.validate()
}

/// Upgrade specifications grouped by category.
#[derive(Clone, Debug, Default)]
pub struct UpgradeCatalog {
    by_category: BTreeMap<UpgradeCategory, Vec<UpgradeSpec>>,
    index: HashMap<String, UpgradeCategory>,
}

impl UpgradeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `spec` under `category`. Ids are unique across all categories;
    /// a duplicate is rejected and the first registration is kept.
    pub fn register(
        &mut self,
        category: UpgradeCategory,
        spec: UpgradeSpec,
    ) -> Result<(), UpgradeError> {
        validate_spec(&spec)?;
        if self.index.contains_key(&spec.id) {
            return Err(UpgradeError::DuplicateUpgradeId(spec.id));
        }
        self.index.insert(spec.id.clone(), category);
        self.by_category.entry(category).or_default().push(spec);
        Ok(())
    }

    /// Categories holding at least one specification.
    pub fn list_categories(&self) -> BTreeSet<UpgradeCategory> {
        self.by_category
            .iter()
            .filter(|(_, specs)| !specs.is_empty())
            .map(|(&c, _)| c)
            .collect()
    }

    /// Specifications under `category` in registration order.
    pub fn list_specs(&self, category: UpgradeCategory) -> &[UpgradeSpec] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find(&self, id: &str) -> Option<(UpgradeCategory, &UpgradeSpec)> {
        let category = *self.index.get(id)?;
        self.list_specs(category)
            .iter()
            .find(|s| s.id == id)
            .map(|s| (category, s))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Every specification, category by category.
    pub fn iter(&self) -> impl Iterator<Item = (UpgradeCategory, &UpgradeSpec)> + '_ {
        self.by_category
            .iter()
            .flat_map(|(&c, specs)| specs.iter().map(move |s| (c, s)))
    }
}

fn requirements(pairs: &[(ResourceKind, u64)]) -> Requirements {
    pairs.iter().copied().collect()
}

/// The upgrades available to a freshly built robot.
pub fn basic_catalog() -> UpgradeCatalog {
    let mut catalog = UpgradeCatalog::new();
    let entries = [
        (
            UpgradeCategory::SensorRange,
            UpgradeSpec {
                id: "basic-range-1".into(),
                name: "Basic Range Extension".into(),
                description: "Extends sensor range by 50%".into(),
                requirements: requirements(&[(ResourceKind::Metal, 10), (ResourceKind::Silicon, 5)]),
                effect: UpgradeEffect::ScaleSensorRange {
                    sensor: SensorKind::Temperature,
                    factor: 1.5,
                },
            },
        ),
        (
            UpgradeCategory::SensorPrecision,
            UpgradeSpec {
                id: "basic-precision-1".into(),
                name: "Thermal Calibration".into(),
                description: "Improves temperature sensor precision by 0.05".into(),
                requirements: requirements(&[(ResourceKind::Silicon, 5), (ResourceKind::Copper, 5)]),
                effect: UpgradeEffect::ImproveSensorPrecision {
                    sensor: SensorKind::Temperature,
                    delta: 0.05,
                },
            },
        ),
        (
            UpgradeCategory::Processor,
            UpgradeSpec {
                id: "basic-proc-1".into(),
                name: "Processing Unit v1.1".into(),
                description: "Increases instructions per second by 100%".into(),
                requirements: requirements(&[(ResourceKind::Silicon, 15), (ResourceKind::Copper, 10)]),
                effect: UpgradeEffect::ScaleProcessorIps { factor: 2.0 },
            },
        ),
    ];
    for (category, spec) in entries {
        // Built-in specs are valid and have distinct ids.
        if let Err(e) = catalog.register(category, spec) {
            warn!(error = %e, "skipping built-in upgrade");
        }
    }
    catalog
}

/// Outcome of a successful upgrade application.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppliedUpgrade {
    pub id: String,
    pub name: String,
    pub category: UpgradeCategory,
    pub spent: Requirements,
}

/// The robot: exclusive owner of its ledger, sensors, processor and catalog.
#[derive(Debug)]
pub struct Robot {
    designation: String,
    power_percent: f32,
    ledger: ResourceLedger,
    sensors: SensorRegistry,
    processor: Processor,
    catalog: UpgradeCatalog,
}

impl Robot {
    pub fn new(
        designation: impl Into<String>,
        sensors: SensorRegistry,
        processor: Processor,
        catalog: UpgradeCatalog,
    ) -> Self {
        Self {
            designation: designation.into(),
            power_percent: 100.0,
            ledger: ResourceLedger::new(),
            sensors,
            processor,
            catalog,
        }
    }

    pub fn designation(&self) -> &str {
        &self.designation
    }

    pub fn power_percent(&self) -> f32 {
        self.power_percent
    }

    pub fn set_power_percent(&mut self, pct: f32) -> Result<(), UpgradeError> {
        validate_power_percent(pct)?;
        self.power_percent = pct;
        Ok(())
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn sensors(&self) -> &SensorRegistry {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut SensorRegistry {
        &mut self.sensors
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn catalog(&self) -> &UpgradeCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut UpgradeCatalog {
        &mut self.catalog
    }

    /// Resource feed from the economy layer.
    pub fn grant(&mut self, kind: ResourceKind, amount: u64) {
        self.ledger.add(kind, amount);
    }

    pub fn read_sensor(
        &mut self,
        kind: SensorKind,
        position: Position,
        env: &dyn Environment,
    ) -> Result<SensorReading, SensorError> {
        self.sensors.read(kind, position, env)
    }

    /// Whether the ledger currently covers upgrade `id`.
    pub fn can_apply(&self, id: &str) -> Result<bool, UpgradeError> {
        let (_, spec) = self
            .catalog
            .find(id)
            .ok_or_else(|| UpgradeError::UnknownUpgrade(id.to_string()))?;
        Ok(self.ledger.can_afford(&spec.requirements))
    }

    /// Pay for and apply upgrade `id`.
    ///
    /// Unaffordable upgrades change nothing. If the effect fails after the
    /// debit, the debit is refunded before the effect's error is returned.
    pub fn apply(&mut self, id: &str) -> Result<AppliedUpgrade, UpgradeError> {
        let (category, spec) = self
            .catalog
            .find(id)
            .ok_or_else(|| UpgradeError::UnknownUpgrade(id.to_string()))?;
        self.ledger.debit(&spec.requirements)?;
        if let Err(err) = spec.effect.apply(&mut self.sensors, &mut self.processor) {
            self.ledger.credit(&spec.requirements);
            warn!(upgrade = id, error = %err, "upgrade effect failed, resources refunded");
            return Err(err);
        }
        info!(upgrade = id, %category, "upgrade applied");
        Ok(AppliedUpgrade {
            id: spec.id.clone(),
            name: spec.name.clone(),
            category,
            spent: spec.requirements.clone(),
        })
    }
}

/// Thread-safe robot handle.
///
/// Each method holds the lock for the whole operation, so an affordability
/// check and the debit that follows it can never interleave with another
/// caller.
#[derive(Clone, Debug)]
pub struct SharedRobot {
    inner: Arc<Mutex<Robot>>,
}

impl SharedRobot {
    pub fn new(robot: Robot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(robot)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Robot> {
        // Robot state is consistent between operations, so a poisoned lock is safe to reuse.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the robot.
    pub fn with<R>(&self, f: impl FnOnce(&mut Robot) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn apply(&self, id: &str) -> Result<AppliedUpgrade, UpgradeError> {
        self.lock().apply(id)
    }

    pub fn can_apply(&self, id: &str) -> Result<bool, UpgradeError> {
        self.lock().can_apply(id)
    }

    pub fn grant(&self, kind: ResourceKind, amount: u64) {
        self.lock().grant(kind, amount);
    }

    pub fn balance(&self, kind: ResourceKind) -> u64 {
        self.lock().ledger().balance(kind)
    }
}
