//! Functional-unit pool.
//!
//! This module models the typed execution units a core issues into. It provides:
//! 1. **Unit kinds:** Integer ALU, integer multiply/divide, memory read, memory write and float/SIMD.
//! 2. **Reservation:** `try_issue` occupies a unit for `issue_lat + op_lat` ticks and returns the
//!    completion tick, or reports `Busy` with the tick the unit frees.
//! 3. **Sharing:** A pool is addressed by `PoolId`; several cores may hold the same id when the
//!    configuration selects a shared pool.
//!
//! Units of different kinds never share resources, so an occupied float unit
//! does not delay an integer instruction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::{ConfigError, SimError, Tick};
use crate::config::{FuConfig, FuPoolConfig};

/// Functional unit classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FuKind {
    /// Integer add/logic/compare/branch.
    IntAlu,
    /// Integer multiply and divide.
    IntMultDiv,
    /// Load address generation.
    MemRead,
    /// Store address generation.
    MemWrite,
    /// Floating-point and SIMD arithmetic.
    FloatSimd,
}

impl FuKind {
    /// Every unit kind, in pool order.
    pub const ALL: [Self; 5] = [
        Self::IntAlu,
        Self::IntMultDiv,
        Self::MemRead,
        Self::MemWrite,
        Self::FloatSimd,
    ];

    /// Returns the canonical name used in configuration files.
    pub const fn name(self) -> &'static str {
        match self {
            Self::IntAlu => "IntAlu",
            Self::IntMultDiv => "IntMultDiv",
            Self::MemRead => "MemRead",
            Self::MemWrite => "MemWrite",
            Self::FloatSimd => "FloatSimd",
        }
    }
}

impl fmt::Display for FuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FuKind {
    type Err = ConfigError;

    /// Parses a unit name case-insensitively, ignoring `_` and `-`
    /// (`"FloatSimd"`, `"float_simd"` and `"float-simd"` are equivalent).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(&folded))
            .ok_or_else(|| ConfigError::UnknownUnitKind(s.to_string()))
    }
}

/// A single execution unit and its reservation state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionalUnit {
    kind: FuKind,
    issue_lat: u64,
    op_lat: u64,
    busy_until: Tick,
    issued: u64,
    rejected: u64,
}

impl FunctionalUnit {
    /// Creates an idle unit.
    ///
    /// # Arguments
    ///
    /// * `kind` - Unit class.
    /// * `issue_lat` - Ticks between selection and occupying the unit (at least 1).
    /// * `op_lat` - Ticks the unit stays busy performing the operation (at least 1).
    ///
    /// # Returns
    ///
    /// The unit, or `ConfigError::InvalidLatency` for a zero latency.
    pub const fn new(kind: FuKind, issue_lat: u64, op_lat: u64) -> Result<Self, ConfigError> {
        if issue_lat == 0 {
            return Err(ConfigError::InvalidLatency {
                unit: kind,
                field: "issue_lat",
                value: issue_lat,
            });
        }
        if op_lat == 0 {
            return Err(ConfigError::InvalidLatency {
                unit: kind,
                field: "op_lat",
                value: op_lat,
            });
        }
        Ok(Self {
            kind,
            issue_lat,
            op_lat,
            busy_until: 0,
            issued: 0,
            rejected: 0,
        })
    }

    /// Unit class.
    pub const fn kind(&self) -> FuKind {
        self.kind
    }

    /// Issue latency in ticks.
    pub const fn issue_lat(&self) -> u64 {
        self.issue_lat
    }

    /// Operation latency in ticks.
    pub const fn op_lat(&self) -> u64 {
        self.op_lat
    }

    /// First tick at which the unit accepts a new operation.
    pub const fn busy_until(&self) -> Tick {
        self.busy_until
    }

    /// Returns whether the unit is occupied at `tick`.
    pub const fn is_busy(&self, tick: Tick) -> bool {
        self.busy_until > tick
    }

    /// Operations accepted so far.
    pub const fn issued(&self) -> u64 {
        self.issued
    }

    /// Issue attempts rejected as busy so far.
    pub const fn rejected(&self) -> u64 {
        self.rejected
    }
}

/// Result of an issue attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueOutcome {
    /// The unit was reserved; the operation completes at `complete_at`.
    Issued {
        /// Tick the result is available and the unit frees.
        complete_at: Tick,
    },
    /// The unit is occupied until `free_at`; retry then.
    Busy {
        /// Earliest tick a retry can succeed.
        free_at: Tick,
    },
}

/// Index of a pool owned by the coordinator.
///
/// Cores configured with a shared pool all carry `PoolId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub usize);

/// Ordered set of functional units, at most one per kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionalUnitPool {
    units: Vec<FunctionalUnit>,
}

impl FunctionalUnitPool {
    /// Builds a pool from explicit units, kept sorted by kind.
    ///
    /// # Returns
    ///
    /// The pool, or `ConfigError::DuplicateUnitKind` if a kind appears twice.
    pub fn new(mut units: Vec<FunctionalUnit>) -> Result<Self, ConfigError> {
        units.sort_by_key(FunctionalUnit::kind);
        if let Some(pair) = units.windows(2).find(|w| w[0].kind == w[1].kind) {
            return Err(ConfigError::DuplicateUnitKind(pair[0].kind));
        }
        Ok(Self { units })
    }

    /// Builds a pool from configuration.
    pub fn from_config(config: &FuPoolConfig) -> Result<Self, ConfigError> {
        let units = config
            .units
            .iter()
            .map(|FuConfig { kind, issue_lat, op_lat }| {
                FunctionalUnit::new(*kind, *issue_lat, *op_lat)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(units)
    }

    fn index(&self, kind: FuKind) -> Result<usize, SimError> {
        self.units
            .binary_search_by_key(&kind, FunctionalUnit::kind)
            .map_err(|_| SimError::UnknownUnitKind(kind))
    }

    /// Attempts to reserve the unit of `kind` at `tick`.
    ///
    /// # Arguments
    ///
    /// * `kind` - Unit class requested by the instruction.
    /// * `tick` - Current simulation tick.
    ///
    /// # Returns
    ///
    /// `IssueOutcome::Issued` with `tick + issue_lat + op_lat` if the unit was free,
    /// `IssueOutcome::Busy` if it is occupied, or `SimError::UnknownUnitKind` if the
    /// pool has no unit of that kind.
    pub fn try_issue(&mut self, kind: FuKind, tick: Tick) -> Result<IssueOutcome, SimError> {
        let idx = self.index(kind)?;
        let unit = &mut self.units[idx];
        if unit.is_busy(tick) {
            unit.rejected += 1;
            return Ok(IssueOutcome::Busy {
                free_at: unit.busy_until,
            });
        }
        let complete_at = tick + unit.issue_lat + unit.op_lat;
        unit.busy_until = complete_at;
        unit.issued += 1;
        Ok(IssueOutcome::Issued { complete_at })
    }

    /// Returns the unit of `kind`, if present.
    pub fn unit(&self, kind: FuKind) -> Option<&FunctionalUnit> {
        self.index(kind).ok().map(|i| &self.units[i])
    }

    /// Returns whether the pool has a unit of `kind`.
    pub fn contains(&self, kind: FuKind) -> bool {
        self.index(kind).is_ok()
    }

    /// Iterates over the units in kind order.
    pub fn units(&self) -> impl Iterator<Item = &FunctionalUnit> {
        self.units.iter()
    }

    /// Marks every unit idle and clears counters.
    pub fn reset(&mut self) {
        for unit in &mut self.units {
            unit.busy_until = 0;
            unit.issued = 0;
            unit.rejected = 0;
        }
    }
}
