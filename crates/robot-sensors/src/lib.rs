#![deny(warnings)]

//! Sensors for the Seed robot: the `Sensor` capability trait, one concrete
//! variant per sensor kind, the precision-driven noise model, and the
//! registry that owns the active sensor instances.

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use robot_core::{EnvironmentalFactor, ParseTagError, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Seed used when no explicit seed is configured.
pub const DEFAULT_NOISE_SEED: u64 = 42;

/// Kinds of sensing capability. Each kind senses exactly one factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorKind {
    Temperature,
    Pressure,
    WindSpeed,
    Radiation,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Temperature,
        SensorKind::Pressure,
        SensorKind::WindSpeed,
        SensorKind::Radiation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SensorKind::Temperature => "TEMPERATURE",
            SensorKind::Pressure => "PRESSURE",
            SensorKind::WindSpeed => "WIND_SPEED",
            SensorKind::Radiation => "RADIATION",
        }
    }

    /// Display label used by the readout panel.
    pub fn label(self) -> &'static str {
        match self {
            SensorKind::Temperature => "TEMPERATURE",
            SensorKind::Pressure => "ATMOSPHERIC PRESSURE",
            SensorKind::WindSpeed => "WIND SPEED",
            SensorKind::Radiation => "RADIATION LEVEL",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SensorKind::Temperature => "°C",
            SensorKind::Pressure => "mbar",
            SensorKind::WindSpeed => "m/s",
            SensorKind::Radiation => "mSv/h",
        }
    }

    /// Decimal places shown when a reading is formatted.
    pub fn display_decimals(self) -> usize {
        match self {
            SensorKind::Radiation => 2,
            _ => 1,
        }
    }

    pub fn factor(self) -> EnvironmentalFactor {
        match self {
            SensorKind::Temperature => EnvironmentalFactor::Temperature,
            SensorKind::Pressure => EnvironmentalFactor::Pressure,
            SensorKind::WindSpeed => EnvironmentalFactor::WindSpeed,
            SensorKind::Radiation => EnvironmentalFactor::Radiation,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("wind") {
            return Ok(SensorKind::WindSpeed);
        }
        SensorKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseTagError {
                what: "sensor kind",
                value: s.to_string(),
            })
    }
}

/// Errors produced by sensors and the sensor registry.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum SensorError {
    #[error("no {0} sensor installed")]
    SensorNotFound(SensorKind),
    #[error("invalid sensor spec: {0}")]
    InvalidSpec(String),
}

/// Physical characteristics of a sensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSpecs {
    /// Sensing range in metres (> 0).
    pub range: f64,
    /// Precision in [0,1]; 1 means noise-free.
    pub precision: f64,
    /// Power draw in watts (>= 0).
    pub power_consumption: f64,
}

/// Validate a full set of sensor specs.
pub fn validate_specs(specs: &SensorSpecs) -> Result<(), SensorError> {
    validate_range(specs.range)?;
    validate_precision(specs.precision)?;
    if !specs.power_consumption.is_finite() || specs.power_consumption < 0.0 {
        return Err(SensorError::InvalidSpec(format!(
            "power consumption {} must be finite and >= 0",
            specs.power_consumption
        )));
    }
    Ok(())
}

fn validate_range(range: f64) -> Result<(), SensorError> {
    if !range.is_finite() || range <= 0.0 {
        return Err(SensorError::InvalidSpec(format!(
            "range {range} must be finite and > 0"
        )));
    }
    Ok(())
}

fn validate_precision(precision: f64) -> Result<(), SensorError> {
    if !(0.0..=1.0).contains(&precision) {
        return Err(SensorError::InvalidSpec(format!(
            "precision {precision} must be within [0,1]"
        )));
    }
    Ok(())
}

/// Field updates for a sensor. `None` leaves the field unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SensorUpgrade {
    pub range: Option<f64>,
    pub precision: Option<f64>,
}

impl SensorUpgrade {
    pub fn range(range: f64) -> Self {
        Self {
            range: Some(range),
            precision: None,
        }
    }

    pub fn precision(precision: f64) -> Self {
        Self {
            range: None,
            precision: Some(precision),
        }
    }

    /// Check every supplied field, then write them. Nothing is written on error.
    pub fn apply_to(&self, specs: &mut SensorSpecs) -> Result<(), SensorError> {
        if let Some(range) = self.range {
            validate_range(range)?;
        }
        if let Some(precision) = self.precision {
            validate_precision(precision)?;
        }
        if let Some(range) = self.range {
            specs.range = range;
        }
        if let Some(precision) = self.precision {
            specs.precision = precision;
        }
        Ok(())
    }
}

/// Source of true environmental values, supplied by the world.
///
/// Implementations may change between calls; sensors never cache them.
pub trait Environment {
    fn factor(&self, factor: EnvironmentalFactor, position: Position) -> f64;
}

impl<F> Environment for F
where
    F: Fn(EnvironmentalFactor, Position) -> f64,
{
    fn factor(&self, factor: EnvironmentalFactor, position: Position) -> f64 {
        self(factor, position)
    }
}

/// Position-independent environment with one value per factor.
///
/// Defaults to the surface conditions shown on the robot's readout at boot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineEnvironment {
    values: BTreeMap<EnvironmentalFactor, f64>,
}

impl Default for BaselineEnvironment {
    fn default() -> Self {
        Self {
            values: BTreeMap::from([
                (EnvironmentalFactor::Temperature, -82.4),
                (EnvironmentalFactor::Pressure, 6.8),
                (EnvironmentalFactor::WindSpeed, 12.3),
                (EnvironmentalFactor::Radiation, 0.64),
            ]),
        }
    }
}

impl BaselineEnvironment {
    pub fn set(&mut self, factor: EnvironmentalFactor, value: f64) {
        self.values.insert(factor, value);
    }

    pub fn get(&self, factor: EnvironmentalFactor) -> f64 {
        self.values.get(&factor).copied().unwrap_or(0.0)
    }
}

impl Environment for BaselineEnvironment {
    fn factor(&self, factor: EnvironmentalFactor, _position: Position) -> f64 {
        self.get(factor)
    }
}

/// Uniform noise in `[-(1-precision), +(1-precision)]`; exactly 0 at precision 1.
pub fn noise(precision: f64, rng: &mut dyn RngCore) -> f64 {
    let spread = 1.0 - precision;
    if spread <= 0.0 {
        return 0.0;
    }
    spread * rng.gen_range(-1.0..=1.0)
}

/// A physical sensing capability.
///
/// New sensing hardware is added as a new implementor, not by extending an
/// existing one.
pub trait Sensor: fmt::Debug + Send + Sync {
    fn kind(&self) -> SensorKind;

    fn specs(&self) -> &SensorSpecs;

    /// Apply field updates; the sensor is unchanged on error.
    fn upgrade(&mut self, upgrade: &SensorUpgrade) -> Result<(), SensorError>;

    fn range(&self) -> f64 {
        self.specs().range
    }

    fn precision(&self) -> f64 {
        self.specs().precision
    }

    fn power_consumption(&self) -> f64 {
        self.specs().power_consumption
    }

    /// True value at `position` plus precision-scaled noise.
    fn measure(&self, position: Position, env: &dyn Environment, rng: &mut dyn RngCore) -> f64 {
        let truth = env.factor(self.kind().factor(), position);
        truth + noise(self.precision(), rng)
    }
}

/// Thermocouple probe.
#[derive(Clone, Debug, PartialEq)]
pub struct TemperatureSensor {
    specs: SensorSpecs,
}

impl TemperatureSensor {
    pub fn new(specs: SensorSpecs) -> Result<Self, SensorError> {
        validate_specs(&specs)?;
        Ok(Self { specs })
    }
}

impl Sensor for TemperatureSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Temperature
    }

    fn specs(&self) -> &SensorSpecs {
        &self.specs
    }

    fn upgrade(&mut self, upgrade: &SensorUpgrade) -> Result<(), SensorError> {
        upgrade.apply_to(&mut self.specs)
    }
}

/// Barometer.
#[derive(Clone, Debug, PartialEq)]
pub struct PressureSensor {
    specs: SensorSpecs,
}

impl PressureSensor {
    pub fn new(specs: SensorSpecs) -> Result<Self, SensorError> {
        validate_specs(&specs)?;
        Ok(Self { specs })
    }
}

impl Sensor for PressureSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Pressure
    }

    fn specs(&self) -> &SensorSpecs {
        &self.specs
    }

    fn upgrade(&mut self, upgrade: &SensorUpgrade) -> Result<(), SensorError> {
        upgrade.apply_to(&mut self.specs)
    }

    fn measure(&self, position: Position, env: &dyn Environment, rng: &mut dyn RngCore) -> f64 {
        let truth = env.factor(EnvironmentalFactor::Pressure, position);
        (truth + noise(self.precision(), rng)).max(0.0)
    }
}

/// Anemometer. Wind speed is a magnitude, so readings never go below zero.
#[derive(Clone, Debug, PartialEq)]
pub struct WindSensor {
    specs: SensorSpecs,
}

impl WindSensor {
    pub fn new(specs: SensorSpecs) -> Result<Self, SensorError> {
        validate_specs(&specs)?;
        Ok(Self { specs })
    }
}

impl Sensor for WindSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::WindSpeed
    }

    fn specs(&self) -> &SensorSpecs {
        &self.specs
    }

    fn upgrade(&mut self, upgrade: &SensorUpgrade) -> Result<(), SensorError> {
        upgrade.apply_to(&mut self.specs)
    }

    fn measure(&self, position: Position, env: &dyn Environment, rng: &mut dyn RngCore) -> f64 {
        let truth = env.factor(EnvironmentalFactor::WindSpeed, position);
        (truth + noise(self.precision(), rng)).max(0.0)
    }
}

/// Dosimeter.
#[derive(Clone, Debug, PartialEq)]
pub struct RadiationSensor {
    specs: SensorSpecs,
}

impl RadiationSensor {
    pub fn new(specs: SensorSpecs) -> Result<Self, SensorError> {
        validate_specs(&specs)?;
        Ok(Self { specs })
    }
}

impl Sensor for RadiationSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Radiation
    }

    fn specs(&self) -> &SensorSpecs {
        &self.specs
    }

    fn upgrade(&mut self, upgrade: &SensorUpgrade) -> Result<(), SensorError> {
        upgrade.apply_to(&mut self.specs)
    }

    fn measure(&self, position: Position, env: &dyn Environment, rng: &mut dyn RngCore) -> f64 {
        let truth = env.factor(EnvironmentalFactor::Radiation, position);
        (truth + noise(self.precision(), rng)).max(0.0)
    }
}

/// Construct the concrete sensor for `kind`.
pub fn build_sensor(kind: SensorKind, specs: SensorSpecs) -> Result<Box<dyn Sensor>, SensorError> {
    Ok(match kind {
        SensorKind::Temperature => Box::new(TemperatureSensor::new(specs)?),
        SensorKind::Pressure => Box::new(PressureSensor::new(specs)?),
        SensorKind::WindSpeed => Box::new(WindSensor::new(specs)?),
        SensorKind::Radiation => Box::new(RadiationSensor::new(specs)?),
    })
}

/// One measurement. Owned by the caller; changing it has no effect on the registry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorReading {
    pub kind: SensorKind,
    pub value: f64,
    pub unit: &'static str,
    /// Wall-clock time of the reading, never earlier than the previous one.
    pub timestamp: DateTime<Utc>,
    /// Strictly increasing per registry.
    pub sequence: u64,
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.*} {}",
            self.kind.display_decimals(),
            self.value,
            self.unit
        )
    }
}

/// Active sensor instances keyed by kind.
pub struct SensorRegistry {
    sensors: BTreeMap<SensorKind, Box<dyn Sensor>>,
    rng: ChaCha8Rng,
    last_timestamp: Option<DateTime<Utc>>,
    sequence: u64,
}

impl fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("sensors", &self.sensors)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::with_seed(DEFAULT_NOISE_SEED)
    }
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose noise stream is reproducible from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            sensors: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            last_timestamp: None,
            sequence: 0,
        }
    }

    /// Insert `sensor`, returning the one it replaced for the same kind.
    pub fn register(&mut self, sensor: Box<dyn Sensor>) -> Option<Box<dyn Sensor>> {
        let kind = sensor.kind();
        debug!(%kind, "registering sensor");
        self.sensors.insert(kind, sensor)
    }

    pub fn get(&self, kind: SensorKind) -> Option<&(dyn Sensor + 'static)> {
        self.sensors.get(&kind).map(|s| &**s)
    }

    pub fn get_mut(&mut self, kind: SensorKind) -> Option<&mut (dyn Sensor + 'static)> {
        self.sensors.get_mut(&kind).map(|s| &mut **s)
    }

    pub fn contains(&self, kind: SensorKind) -> bool {
        self.sensors.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = SensorKind> + '_ {
        self.sensors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn Sensor + 'static)> + '_ {
        self.sensors.values().map(|s| &**s)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Take one reading from the sensor of `kind`.
    pub fn read(
        &mut self,
        kind: SensorKind,
        position: Position,
        env: &dyn Environment,
    ) -> Result<SensorReading, SensorError> {
        let sensor = self
            .sensors
            .get(&kind)
            .ok_or(SensorError::SensorNotFound(kind))?;
        let value = sensor.measure(position, env, &mut self.rng);
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        self.sequence += 1;
        debug!(%kind, value, sequence = self.sequence, "sensor read");
        Ok(SensorReading {
            kind,
            value,
            unit: kind.unit(),
            timestamp,
            sequence: self.sequence,
        })
    }

    /// One reading per registered sensor, in kind order.
    pub fn read_all(&mut self, position: Position, env: &dyn Environment) -> Vec<SensorReading> {
        let kinds: Vec<SensorKind> = self.kinds().collect();
        kinds
            .into_iter()
            .filter_map(|kind| self.read(kind, position, env).ok())
            .collect()
    }

    /// Update range and/or precision of an installed sensor.
    pub fn upgrade_sensor(
        &mut self,
        kind: SensorKind,
        range: Option<f64>,
        precision: Option<f64>,
    ) -> Result<(), SensorError> {
        let sensor = self
            .sensors
            .get_mut(&kind)
            .ok_or(SensorError::SensorNotFound(kind))?;
        sensor.upgrade(&SensorUpgrade { range, precision })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn specs(range: f64, precision: f64) -> SensorSpecs {
        SensorSpecs {
            range,
            precision,
            power_consumption: 0.5,
        }
    }

    fn constant(value: f64) -> impl Fn(EnvironmentalFactor, Position) -> f64 {
        move |_: EnvironmentalFactor, _: Position| value
    }

    fn registry_with(kind: SensorKind, precision: f64, seed: u64) -> SensorRegistry {
        let mut reg = SensorRegistry::with_seed(seed);
        reg.register(build_sensor(kind, specs(10.0, precision)).unwrap());
        reg
    }

    #[test]
    fn perfect_precision_reads_truth() {
        let mut reg = registry_with(SensorKind::Temperature, 1.0, 7);
        let env = constant(-82.4);
        for _ in 0..100 {
            let r = reg
                .read(SensorKind::Temperature, Position::ORIGIN, &env)
                .unwrap();
            assert_eq!(r.value, -82.4);
            assert_eq!(r.unit, "°C");
        }
    }

    #[test]
    fn missing_sensor_is_reported() {
        let mut reg = SensorRegistry::new();
        let env = BaselineEnvironment::default();
        let err = reg
            .read(SensorKind::Pressure, Position::ORIGIN, &env)
            .unwrap_err();
        assert_eq!(err, SensorError::SensorNotFound(SensorKind::Pressure));
        assert_eq!(
            reg.upgrade_sensor(SensorKind::Pressure, Some(2.0), None),
            Err(SensorError::SensorNotFound(SensorKind::Pressure))
        );
    }

    #[test]
    fn register_replaces_same_kind() {
        let mut reg = registry_with(SensorKind::Temperature, 0.9, 1);
        let old = reg.register(build_sensor(SensorKind::Temperature, specs(20.0, 0.5)).unwrap());
        assert_eq!(old.map(|s| s.range()), Some(10.0));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(SensorKind::Temperature).map(|s| s.range()), Some(20.0));
    }

    #[test]
    fn upgrade_changes_only_supplied_fields() {
        let mut reg = registry_with(SensorKind::Temperature, 0.9, 1);
        reg.upgrade_sensor(SensorKind::Temperature, Some(15.0), None)
            .unwrap();
        let s = reg.get(SensorKind::Temperature).unwrap();
        assert_eq!(s.range(), 15.0);
        assert_eq!(s.precision(), 0.9);
        assert_eq!(s.power_consumption(), 0.5);
    }

    #[test]
    fn out_of_range_precision_is_rejected_not_clamped() {
        let mut reg = registry_with(SensorKind::Temperature, 0.9, 1);
        let err = reg
            .upgrade_sensor(SensorKind::Temperature, Some(50.0), Some(1.2))
            .unwrap_err();
        assert!(matches!(err, SensorError::InvalidSpec(_)));
        let s = reg.get(SensorKind::Temperature).unwrap();
        assert_eq!(s.precision(), 0.9);
        assert_eq!(s.range(), 10.0);
        assert!(reg
            .upgrade_sensor(SensorKind::Temperature, None, Some(f64::NAN))
            .is_err());
        assert!(reg
            .upgrade_sensor(SensorKind::Temperature, Some(0.0), None)
            .is_err());
    }

    #[test]
    fn construction_validates_specs() {
        assert!(TemperatureSensor::new(specs(-1.0, 0.5)).is_err());
        assert!(build_sensor(SensorKind::Radiation, specs(1.0, -0.1)).is_err());
        let bad_power = SensorSpecs {
            range: 1.0,
            precision: 0.5,
            power_consumption: -2.0,
        };
        assert!(validate_specs(&bad_power).is_err());
    }

    #[test]
    fn readings_are_ordered() {
        let mut reg = registry_with(SensorKind::WindSpeed, 0.5, 3);
        let env = BaselineEnvironment::default();
        let a = reg.read(SensorKind::WindSpeed, Position::ORIGIN, &env).unwrap();
        let b = reg.read(SensorKind::WindSpeed, Position::ORIGIN, &env).unwrap();
        assert!(b.sequence > a.sequence);
        assert!(b.timestamp >= a.timestamp);
    }

    #[test]
    fn same_seed_same_noise() {
        let env = BaselineEnvironment::default();
        let mut a = registry_with(SensorKind::Temperature, 0.2, 99);
        let mut b = registry_with(SensorKind::Temperature, 0.2, 99);
        for _ in 0..10 {
            let ra = a.read(SensorKind::Temperature, Position::ORIGIN, &env).unwrap();
            let rb = b.read(SensorKind::Temperature, Position::ORIGIN, &env).unwrap();
            assert_eq!(ra.value, rb.value);
        }
    }

    #[test]
    fn environment_is_consulted_each_read() {
        use std::cell::Cell;
        let calls = Cell::new(0u32);
        let env = |_: EnvironmentalFactor, _: Position| {
            calls.set(calls.get() + 1);
            f64::from(calls.get())
        };
        let mut reg = registry_with(SensorKind::Temperature, 1.0, 1);
        let a = reg.read(SensorKind::Temperature, Position::ORIGIN, &env).unwrap();
        let b = reg.read(SensorKind::Temperature, Position::ORIGIN, &env).unwrap();
        assert_eq!(a.value, 1.0);
        assert_eq!(b.value, 2.0);
    }

    #[test]
    fn magnitude_sensors_never_read_negative() {
        let mut reg = registry_with(SensorKind::Radiation, 0.0, 5);
        let env = constant(0.0);
        for _ in 0..200 {
            let r = reg.read(SensorKind::Radiation, Position::ORIGIN, &env).unwrap();
            assert!(r.value >= 0.0);
        }
    }

    #[test]
    fn read_all_covers_every_sensor() {
        let mut reg = SensorRegistry::new();
        for kind in SensorKind::ALL {
            reg.register(build_sensor(kind, specs(5.0, 1.0)).unwrap());
        }
        let env = BaselineEnvironment::default();
        let readings = reg.read_all(Position::ORIGIN, &env);
        let kinds: Vec<SensorKind> = readings.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, SensorKind::ALL.to_vec());
        assert_eq!(readings[0].to_string(), "-82.4 °C");
        assert_eq!(readings[3].to_string(), "0.64 mSv/h");
    }

    #[test]
    fn sensor_kind_parses_aliases() {
        assert_eq!("wind".parse::<SensorKind>(), Ok(SensorKind::WindSpeed));
        assert_eq!("Temperature".parse::<SensorKind>(), Ok(SensorKind::Temperature));
        assert!("sonar".parse::<SensorKind>().is_err());
    }

    #[test]
    fn reading_serializes() {
        let mut reg = registry_with(SensorKind::Pressure, 1.0, 1);
        let r = reg
            .read(SensorKind::Pressure, Position::ORIGIN, &constant(6.8))
            .unwrap();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["kind"], "PRESSURE");
        assert_eq!(v["unit"], "mbar");
    }

    proptest! {
        #[test]
        fn noise_bounded_by_precision(precision in 0.0f64..=1.0, seed in any::<u64>(), truth in -200.0f64..200.0) {
            let mut reg = registry_with(SensorKind::Temperature, precision, seed);
            let env = constant(truth);
            for _ in 0..64 {
                let r = reg.read(SensorKind::Temperature, Position::ORIGIN, &env).unwrap();
                prop_assert!((r.value - truth).abs() <= (1.0 - precision) + 1e-9);
            }
        }
    }
}
