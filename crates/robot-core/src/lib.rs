#![deny(warnings)]

//! Core domain models and invariants for the Seed robot.
//!
//! This crate defines the resource ledger, the processor, and the small value
//! types (positions, environmental factors) shared by the sensor and upgrade
//! crates, with validation helpers to guarantee basic invariants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Kinds of raw resources gathered by the robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    /// Structural metal (iron, aluminium).
    Metal,
    /// Silicon for electronics.
    Silicon,
    /// Copper for wiring.
    Copper,
}

impl ResourceKind {
    /// Every resource kind, in ledger order.
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Metal, ResourceKind::Silicon, ResourceKind::Copper];

    /// Upper-case tag, e.g. "METAL".
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Metal => "METAL",
            ResourceKind::Silicon => "SILICON",
            ResourceKind::Copper => "COPPER",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text does not name a known tag.
#[derive(Debug, Error, PartialEq, Clone)]
#[error("unknown {what}: {value}")]
pub struct ParseTagError {
    /// What was being parsed, e.g. "resource kind".
    pub what: &'static str,
    /// The rejected input.
    pub value: String,
}

impl FromStr for ResourceKind {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTagError {
                what: "resource kind",
                value: s.to_string(),
            })
    }
}

/// Resource amounts keyed by kind, e.g. the cost of an upgrade.
pub type Requirements = BTreeMap<ResourceKind, u64>;

/// Errors produced by the resource ledger.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LedgerError {
    /// A requirement exceeds the stored balance; nothing was debited.
    #[error("insufficient {kind}: have {available}, need {required}")]
    InsufficientResources {
        kind: ResourceKind,
        available: u64,
        required: u64,
    },
}

/// Authoritative store of accumulated resources.
///
/// Balances never go negative: a debit either succeeds for every entry of the
/// requirement map or leaves the ledger untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    balances: BTreeMap<ResourceKind, u64>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase the stored quantity of `kind`. Zero amounts are ignored.
    pub fn add(&mut self, kind: ResourceKind, amount: u64) {
        if amount == 0 {
            debug!(%kind, "ignoring zero resource grant");
            return;
        }
        let entry = self.balances.entry(kind).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Current quantity of `kind`, 0 if never added.
    pub fn balance(&self, kind: ResourceKind) -> u64 {
        self.balances.get(&kind).copied().unwrap_or(0)
    }

    /// True iff every requirement is covered by the current balances.
    pub fn can_afford(&self, requirements: &Requirements) -> bool {
        self.first_shortfall(requirements).is_none()
    }

    /// Subtract every required amount, or fail without touching any balance.
    pub fn debit(&mut self, requirements: &Requirements) -> Result<(), LedgerError> {
        if let Some(err) = self.first_shortfall(requirements) {
            return Err(err);
        }
        for (&kind, &required) in requirements {
            if required == 0 {
                continue;
            }
            // Checked above: balance >= required for every entry.
            if let Some(balance) = self.balances.get_mut(&kind) {
                *balance -= required;
            }
        }
        Ok(())
    }

    /// Add back every amount in `amounts`, e.g. to refund a debit.
    pub fn credit(&mut self, amounts: &Requirements) {
        for (&kind, &amount) in amounts {
            self.add(kind, amount);
        }
    }

    /// All balances that were ever touched, in kind order.
    pub fn balances(&self) -> impl Iterator<Item = (ResourceKind, u64)> + '_ {
        self.balances.iter().map(|(&k, &v)| (k, v))
    }

    fn first_shortfall(&self, requirements: &Requirements) -> Option<LedgerError> {
        requirements.iter().find_map(|(&kind, &required)| {
            let available = self.balance(kind);
            (available < required).then_some(LedgerError::InsufficientResources {
                kind,
                available,
                required,
            })
        })
    }
}

/// A point in robot-local coordinates (metres).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Environmental quantities the world can be queried for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentalFactor {
    Temperature,
    Pressure,
    WindSpeed,
    Radiation,
}

/// The robot's onboard processing unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processor {
    /// Instructions per second (> 0).
    pub instructions_per_second: u64,
    /// Working memory in KiB.
    pub memory_kb: u32,
}

impl Default for Processor {
    fn default() -> Self {
        Self {
            instructions_per_second: 1_000_000,
            memory_kb: 512,
        }
    }
}

impl Processor {
    /// Replace the processor speed. Zero is rejected.
    pub fn upgrade(&mut self, instructions_per_second: u64) -> Result<(), ValidationError> {
        if instructions_per_second == 0 {
            return Err(ValidationError::ZeroProcessorSpeed);
        }
        self.instructions_per_second = instructions_per_second;
        Ok(())
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// Processor speed must be strictly positive.
    #[error("processor speed must be > 0")]
    ZeroProcessorSpeed,
    /// Power level must be within [0, 100].
    #[error("power level {0} is out of range [0, 100]")]
    PowerOutOfRange(f32),
    /// Scaling would overflow the target field.
    #[error("value overflow while scaling")]
    Overflow,
}

/// Validate a processor definition.
pub fn validate_processor(p: &Processor) -> Result<(), ValidationError> {
    if p.instructions_per_second == 0 {
        return Err(ValidationError::ZeroProcessorSpeed);
    }
    Ok(())
}

/// Validate a power level percentage.
pub fn validate_power_percent(pct: f32) -> Result<(), ValidationError> {
    if !pct.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::PowerOutOfRange(pct));
    }
    Ok(())
}

/// Multiply an integer quantity by a positive factor, rounding to nearest.
pub fn scale_u64(value: u64, factor: f64) -> Result<u64, ValidationError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ValidationError::NonFinite);
    }
    let scaled = (value as f64 * factor).round();
    if !scaled.is_finite() || scaled >= u64::MAX as f64 {
        return Err(ValidationError::Overflow);
    }
    Ok(scaled as u64)
}
