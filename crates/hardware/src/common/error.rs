//! Error taxonomy for configuration, simulation and wire decoding.
//!
//! This module defines every error the simulator can surface. It provides:
//! 1. **Configuration Errors:** Rejected at setup, before any event is scheduled.
//! 2. **Simulation Errors:** Fatal conditions that abort a run (bad memory map, scheduling into the past)
//!    and the back-pressure signal callers recover from by retrying.
//! 3. **Wire Errors:** Failures decoding a `BusTransaction` frame.
//!
//! Functional-unit and bus unavailability are not errors: they are reported as
//! `IssueOutcome::Busy` or recovered inside the core by rescheduling.

use thiserror::Error;

use super::addr::{AddrRange, PhysAddr};
use super::{CoreId, Tick};
use crate::core::units::fu::FuKind;

/// Invalid configuration detected while validating or building the system.
///
/// Always fatal: the coordinator is never constructed from a configuration that
/// produced one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Core count below one or above the supported maximum.
    #[error("num_cpus must be between 1 and {max} (got {got})")]
    InvalidCoreCount {
        /// Requested core count.
        got: usize,
        /// Largest supported core count.
        max: usize,
    },

    /// A functional-unit latency of zero ticks.
    #[error("{unit} {field} must be at least 1 tick (got {value})")]
    InvalidLatency {
        /// Unit the latency belongs to.
        unit: FuKind,
        /// `"issue_lat"` or `"op_lat"`.
        field: &'static str,
        /// Offending value.
        value: u64,
    },

    /// A unit kind name that does not match any `FuKind`, or a kind the
    /// workload needs but the pool was not given.
    #[error("unknown functional unit kind `{0}`")]
    UnknownUnitKind(String),

    /// The same unit kind listed twice in one pool.
    #[error("functional unit {0} appears more than once in the pool")]
    DuplicateUnitKind(FuKind),

    /// Cache size, line size or associativity that cannot form a set-associative array.
    #[error("invalid {cache} geometry: {reason}")]
    InvalidCacheGeometry {
        /// Which cache (`"icache"` or `"dcache"`).
        cache: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// Empty or overflowing physical memory range.
    #[error("invalid memory range: {0}")]
    InvalidMemoryRange(String),

    /// Bus width, capacity or latency that cannot work.
    #[error("invalid bus configuration: {0}")]
    InvalidBus(String),

    /// In-flight window settings that leave the pipeline unable to fetch.
    #[error("invalid pipeline configuration: {0}")]
    InvalidPipeline(String),

    /// A size string such as `"32kB"` that could not be parsed.
    #[error("invalid size `{0}`")]
    InvalidSize(String),

    /// A frequency string such as `"3GHz"` that could not be parsed.
    #[error("invalid frequency `{0}`")]
    InvalidFrequency(String),

    /// A workload descriptor that cannot be resolved into instruction streams.
    #[error("invalid workload `{descriptor}`: {reason}")]
    InvalidWorkload {
        /// The `cmd` string as given.
        descriptor: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Failure reading a configuration or trace file.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// File that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON in a configuration or trace file.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while the simulation is being built or run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration rejected before the simulation started.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Attempt to schedule an event before the current simulation tick.
    #[error("cannot schedule event at tick {tick}: clock is already at {now}")]
    InvalidTick {
        /// Requested tick.
        tick: Tick,
        /// Current clock value.
        now: Tick,
    },

    /// A bus transaction targeted an address outside the controller's range.
    ///
    /// Mirrors a misconfigured physical memory map and aborts the run.
    #[error("core {core} accessed {address}, outside memory range {range}")]
    AddressOutOfRange {
        /// Offending address.
        address: PhysAddr,
        /// Range served by the memory controller.
        range: AddrRange,
        /// Core that issued the transaction.
        core: CoreId,
    },

    /// The bus already holds its configured number of queued transactions.
    #[error("bus queue overflow: {capacity} transactions already queued")]
    QueueOverflow {
        /// Configured bus queue capacity.
        capacity: usize,
    },

    /// A functional unit kind that the pool was not built with.
    #[error("functional unit {0} is not present in the pool")]
    UnknownUnitKind(FuKind),

    /// An event addressed to a core id the system does not have.
    #[error("event for core {core}, but the system has {cores} cores")]
    UnknownCore {
        /// Target core id.
        core: CoreId,
        /// Number of cores in the system.
        cores: usize,
    },
}

impl SimError {
    /// Returns whether the error must terminate the simulation.
    ///
    /// Only `QueueOverflow` is recoverable; callers retry on a later tick.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::QueueOverflow { .. })
    }
}

/// Failure decoding a `BusTransaction` wire frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Buffer shorter than a full frame.
    #[error("frame is {len} bytes, expected {expected}")]
    Truncated {
        /// Bytes available.
        len: usize,
        /// Bytes required.
        expected: usize,
    },

    /// Leading magic does not identify a transaction frame.
    #[error("bad frame magic {0:#010x}")]
    BadMagic(u32),

    /// Unknown access kind tag.
    #[error("unknown access kind tag {0}")]
    BadKind(u8),

    /// Unknown cache port tag.
    #[error("unknown cache port tag {0}")]
    BadPort(u8),
}
