//! Configuration system for the multi-core timing simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (core count, clock, caches, bus, DRAM).
//! 2. **Structures:** Hierarchical config for general, system, functional units, cache, memory and pipeline.
//! 3. **Enums:** Pool sharing, memory controller and replacement policy types.
//! 4. **Parsing:** JSON loading and human-readable size / frequency strings (`"32kB"`, `"3GHz"`).
//!
//! A `Config` is immutable once validated; every component constructor receives
//! a reference to an already-validated value.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::constants::MAX_CORES;
use crate::common::{AddrRange, ConfigError};
use crate::core::units::fu::FuKind;

/// Default configuration constants for the simulator.
///
/// These values define the baseline system when not explicitly overridden in a
/// JSON configuration file or on the command line.
mod defaults {
    use crate::core::units::fu::FuKind;

    /// Number of simulated cores.
    pub const NUM_CPUS: usize = 1;

    /// Core clock in Hz (3 GHz).
    pub const CLOCK_HZ: u64 = 3_000_000_000;

    /// Size of the single physical memory range (2 GiB).
    pub const MEM_SIZE: u64 = 2 * 1024 * 1024 * 1024;

    /// Base address of the physical memory range.
    pub const MEM_BASE: u64 = 0;

    /// System bus width in bytes (8 bytes = 64-bit bus).
    ///
    /// Determines how many beats a cache-line transfer occupies the bus.
    pub const BUS_WIDTH: u64 = 8;

    /// Fixed bus overhead in cycles per transaction.
    pub const BUS_LATENCY: u64 = 4;

    /// Transactions the bus may hold queued across all cores.
    pub const BUS_QUEUE_CAPACITY: usize = 64;

    /// DDR3-1600 tCL/tRCD/tRP (13.75 ns) in 3 GHz core cycles, rounded up.
    pub const T_CAS: u64 = 42;
    /// Row activate latency in core cycles.
    pub const T_RAS: u64 = 42;
    /// Precharge latency in core cycles.
    pub const T_PRE: u64 = 42;

    /// DRAM row buffer size in bytes.
    pub const ROW_BYTES: u64 = 2048;

    /// Fixed latency of the simple controller in cycles.
    pub const SIMPLE_LATENCY: u64 = 100;

    /// L1 cache size in bytes (32 KiB).
    pub const CACHE_SIZE: usize = 32 * 1024;

    /// Cache line size in bytes.
    pub const CACHE_LINE: usize = 64;

    /// L1 associativity.
    pub const CACHE_WAYS: usize = 2;

    /// L1 hit latency in cycles.
    pub const CACHE_LATENCY: u64 = 2;

    /// Instructions a core may hold between fetch and retire.
    pub const MAX_IN_FLIGHT: usize = 4;

    /// `(kind, issue_lat, op_lat)` for the default in-order pool.
    ///
    /// FloatSimd uses 4/4, matching the `--issue-lat` / `--op-lat` defaults.
    pub const FU_LATENCIES: [(FuKind, u64, u64); 5] = [
        (FuKind::IntAlu, 1, 3),
        (FuKind::IntMultDiv, 1, 3),
        (FuKind::MemRead, 1, 1),
        (FuKind::MemWrite, 1, 1),
        (FuKind::FloatSimd, 4, 4),
    ];
}

/// How cores are mapped onto functional-unit pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FuPoolSharing {
    /// One pool shared by every core; units serialise across cores.
    #[default]
    #[serde(alias = "shared")]
    Shared,
    /// Each core owns a private copy of the pool.
    #[serde(alias = "per-core", alias = "per_core")]
    PerCore,
}

/// Memory controller timing models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoryControllerKind {
    /// Fixed-latency controller.
    ///
    /// Every access takes `simple_latency` cycles regardless of address.
    Simple,
    /// DRAM controller with an open-row buffer.
    ///
    /// Models CAS, RAS and precharge latencies with row-buffer hits and conflicts.
    #[default]
    #[serde(alias = "DRAM")]
    Dram,
}

/// Cache replacement policy algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used; ties broken by the lowest line address.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// First In First Out; evicts the line filled earliest.
    #[serde(alias = "Fifo")]
    Fifo,
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use mcsim_core::config::{Config, FuPoolSharing};
///
/// let json = r#"{
///     "general": { "num_cpus": 4, "cmd": "daxpy" },
///     "fu_pool": { "sharing": "PerCore" }
/// }"#;
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.general.num_cpus, 4);
/// assert_eq!(config.fu_pool.sharing, FuPoolSharing::PerCore);
/// assert_eq!(config.cache.l1_d.size_bytes, 32768);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Core count, workload and run control
    #[serde(default)]
    pub general: GeneralConfig,
    /// Clock and bus parameters
    #[serde(default)]
    pub system: SystemConfig,
    /// Functional-unit latencies and sharing
    #[serde(default)]
    pub fu_pool: FuPoolConfig,
    /// Private L1 caches
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
    /// Memory range and controller timing
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Per-core pipeline limits
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Parses a configuration from JSON text; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks every setting that would make the system impossible to build.
    ///
    /// # Returns
    ///
    /// `Ok(())`, or the first `ConfigError` found. Nothing is scheduled and no
    /// component is constructed by this call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.general.num_cpus;
        if n == 0 || n > MAX_CORES {
            return Err(ConfigError::InvalidCoreCount {
                got: n,
                max: MAX_CORES,
            });
        }
        if self.general.cmd.trim().is_empty() {
            return Err(ConfigError::InvalidWorkload {
                descriptor: self.general.cmd.clone(),
                reason: "a workload command is required".to_string(),
            });
        }
        if self.system.clock_hz == 0 {
            return Err(ConfigError::InvalidFrequency("0Hz".to_string()));
        }
        self.fu_pool.validate()?;
        self.cache.l1_i.validate("icache")?;
        self.cache.l1_d.validate("dcache")?;
        if self.cache.l1_i.line_bytes != self.cache.l1_d.line_bytes {
            return Err(ConfigError::InvalidCacheGeometry {
                cache: "icache",
                reason: format!(
                    "line size {} differs from the dcache line size {}; the bus moves one line size",
                    self.cache.l1_i.line_bytes, self.cache.l1_d.line_bytes
                ),
            });
        }
        self.system.validate()?;
        self.memory.validate()?;
        if self.pipeline.max_in_flight == 0 {
            return Err(ConfigError::InvalidPipeline(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// General simulation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Number of cores; each runs exactly one workload thread
    #[serde(default = "GeneralConfig::default_num_cpus")]
    pub num_cpus: usize,

    /// Workload descriptor (`daxpy[:N]`, `fp:N`, `int:N`, `mul:N` or a `.json` trace)
    #[serde(default)]
    pub cmd: String,

    /// Stop after this many ticks even if cores are still running
    #[serde(default)]
    pub max_ticks: Option<u64>,

    /// Install every instruction line into the icaches before timing starts
    #[serde(default)]
    pub warm_icache: bool,

    /// Keep a log of every dispatched event for determinism checks
    #[serde(default)]
    pub record_dispatch: bool,
}

impl GeneralConfig {
    fn default_num_cpus() -> usize {
        defaults::NUM_CPUS
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            num_cpus: defaults::NUM_CPUS,
            cmd: String::new(),
            max_ticks: None,
            warm_icache: false,
            record_dispatch: false,
        }
    }
}

/// Clock domain and memory bus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Core clock in Hz; one tick is one cycle of this clock
    #[serde(default = "SystemConfig::default_clock_hz")]
    pub clock_hz: u64,

    /// Bus width in bytes
    #[serde(default = "SystemConfig::default_bus_width")]
    pub bus_width: u64,

    /// Fixed bus overhead in cycles
    #[serde(default = "SystemConfig::default_bus_latency")]
    pub bus_latency: u64,

    /// Transactions the bus may hold queued across all cores
    #[serde(default = "SystemConfig::default_bus_queue_capacity")]
    pub bus_queue_capacity: usize,
}

impl SystemConfig {
    fn default_clock_hz() -> u64 {
        defaults::CLOCK_HZ
    }

    fn default_bus_width() -> u64 {
        defaults::BUS_WIDTH
    }

    fn default_bus_latency() -> u64 {
        defaults::BUS_LATENCY
    }

    fn default_bus_queue_capacity() -> usize {
        defaults::BUS_QUEUE_CAPACITY
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bus_width == 0 {
            return Err(ConfigError::InvalidBus("bus_width must be non-zero".to_string()));
        }
        if self.bus_queue_capacity == 0 {
            return Err(ConfigError::InvalidBus(
                "bus_queue_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            clock_hz: defaults::CLOCK_HZ,
            bus_width: defaults::BUS_WIDTH,
            bus_latency: defaults::BUS_LATENCY,
            bus_queue_capacity: defaults::BUS_QUEUE_CAPACITY,
        }
    }
}

/// Latencies of one functional unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuConfig {
    /// Unit class
    pub kind: FuKind,
    /// Ticks between selection and occupying the unit
    pub issue_lat: u64,
    /// Ticks the unit stays busy
    pub op_lat: u64,
}

/// Functional-unit pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuPoolConfig {
    /// Shared pool or one private pool per core
    #[serde(default)]
    pub sharing: FuPoolSharing,

    /// One entry per unit kind
    #[serde(default = "FuPoolConfig::default_units")]
    pub units: Vec<FuConfig>,
}

impl FuPoolConfig {
    fn default_units() -> Vec<FuConfig> {
        defaults::FU_LATENCIES
            .iter()
            .map(|&(kind, issue_lat, op_lat)| FuConfig {
                kind,
                issue_lat,
                op_lat,
            })
            .collect()
    }

    /// Overrides the latencies of `kind`, adding the unit if it is missing.
    ///
    /// Used for the `--issue-lat` / `--op-lat` command-line options, which
    /// target the FloatSimd unit.
    pub fn set_latency(&mut self, kind: FuKind, issue_lat: u64, op_lat: u64) {
        if let Some(unit) = self.units.iter_mut().find(|u| u.kind == kind) {
            unit.issue_lat = issue_lat;
            unit.op_lat = op_lat;
        } else {
            self.units.push(FuConfig {
                kind,
                issue_lat,
                op_lat,
            });
        }
    }

    /// Returns the configured entry for `kind`.
    pub fn unit(&self, kind: FuKind) -> Option<&FuConfig> {
        self.units.iter().find(|u| u.kind == kind)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (i, unit) in self.units.iter().enumerate() {
            if self.units[..i].iter().any(|u| u.kind == unit.kind) {
                return Err(ConfigError::DuplicateUnitKind(unit.kind));
            }
            for (field, value) in [("issue_lat", unit.issue_lat), ("op_lat", unit.op_lat)] {
                if value == 0 {
                    return Err(ConfigError::InvalidLatency {
                        unit: unit.kind,
                        field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for FuPoolConfig {
    fn default() -> Self {
        Self {
            sharing: FuPoolSharing::default(),
            units: Self::default_units(),
        }
    }
}

/// Private L1 cache pair for every core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHierarchyConfig {
    /// L1 instruction cache
    #[serde(default)]
    pub l1_i: CacheConfig,
    /// L1 data cache
    #[serde(default)]
    pub l1_d: CacheConfig,
}

/// Configuration of one set-associative cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Capacity in bytes
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,

    /// Line size in bytes (power of two)
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,

    /// Associativity (lines per set)
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Hit latency in cycles
    #[serde(default = "CacheConfig::default_latency")]
    pub latency: u64,

    /// Victim selection policy
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl CacheConfig {
    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    fn default_line() -> usize {
        defaults::CACHE_LINE
    }

    fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }

    fn default_latency() -> u64 {
        defaults::CACHE_LATENCY
    }

    /// Number of sets implied by size, line size and associativity.
    pub const fn num_sets(&self) -> usize {
        self.size_bytes / (self.line_bytes * self.ways)
    }

    /// Checks that the geometry forms a power-of-two set-associative array.
    pub fn validate(&self, cache: &'static str) -> Result<(), ConfigError> {
        let fail = |reason: String| Err(ConfigError::InvalidCacheGeometry { cache, reason });
        if self.line_bytes == 0 || !self.line_bytes.is_power_of_two() {
            return fail(format!("line size {} is not a power of two", self.line_bytes));
        }
        if self.ways == 0 {
            return fail("associativity must be at least 1".to_string());
        }
        if self.size_bytes == 0 || self.size_bytes % (self.line_bytes * self.ways) != 0 {
            return fail(format!(
                "size {} is not a multiple of {} lines of {} bytes",
                self.size_bytes, self.ways, self.line_bytes
            ));
        }
        if !self.num_sets().is_power_of_two() {
            return fail(format!("{} sets is not a power of two", self.num_sets()));
        }
        if self.latency == 0 {
            return fail("hit latency must be at least 1 cycle".to_string());
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::CACHE_SIZE,
            line_bytes: defaults::CACHE_LINE,
            ways: defaults::CACHE_WAYS,
            latency: defaults::CACHE_LATENCY,
            policy: ReplacementPolicy::default(),
        }
    }
}

/// Physical memory range and controller timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// First byte of the range served by the controller
    #[serde(default)]
    pub base: u64,

    /// Size of the range in bytes
    #[serde(default = "MemoryConfig::default_size")]
    pub size: u64,

    /// Timing model
    #[serde(default)]
    pub controller: MemoryControllerKind,

    /// Column access latency in cycles
    #[serde(default = "MemoryConfig::default_t_cas")]
    pub t_cas: u64,

    /// Row activate latency in cycles
    #[serde(default = "MemoryConfig::default_t_ras")]
    pub t_ras: u64,

    /// Precharge latency in cycles
    #[serde(default = "MemoryConfig::default_t_pre")]
    pub t_pre: u64,

    /// Row buffer size in bytes (power of two)
    #[serde(default = "MemoryConfig::default_row_bytes")]
    pub row_bytes: u64,

    /// Latency of the `Simple` controller in cycles
    #[serde(default = "MemoryConfig::default_simple_latency")]
    pub simple_latency: u64,
}

impl MemoryConfig {
    fn default_size() -> u64 {
        defaults::MEM_SIZE
    }

    fn default_t_cas() -> u64 {
        defaults::T_CAS
    }

    fn default_t_ras() -> u64 {
        defaults::T_RAS
    }

    fn default_t_pre() -> u64 {
        defaults::T_PRE
    }

    fn default_row_bytes() -> u64 {
        defaults::ROW_BYTES
    }

    fn default_simple_latency() -> u64 {
        defaults::SIMPLE_LATENCY
    }

    /// DDR3-1600 8x8 timing at `clock_hz`.
    ///
    /// tCL, tRCD and tRP are all 13.75 ns; each is converted to core cycles and
    /// rounded up, so at 3 GHz every parameter is 42 cycles.
    pub fn ddr3_1600_8x8(clock_hz: u64) -> Self {
        const T_NS_X100: u64 = 1375;
        let cycles = (T_NS_X100 * clock_hz).div_ceil(100 * 1_000_000_000);
        Self {
            controller: MemoryControllerKind::Dram,
            t_cas: cycles,
            t_ras: cycles,
            t_pre: cycles,
            row_bytes: 1024 * 8,
            ..Self::default()
        }
    }

    /// The address range served by the controller.
    pub const fn range(&self) -> AddrRange {
        AddrRange::new(self.base, self.size)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::InvalidMemoryRange("size must be non-zero".to_string()));
        }
        if self.base.checked_add(self.size).is_none() {
            return Err(ConfigError::InvalidMemoryRange(format!(
                "base {:#x} + size {:#x} overflows the address space",
                self.base, self.size
            )));
        }
        if self.controller == MemoryControllerKind::Dram && !self.row_bytes.is_power_of_two() {
            return Err(ConfigError::InvalidMemoryRange(format!(
                "row size {} is not a power of two",
                self.row_bytes
            )));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base: defaults::MEM_BASE,
            size: defaults::MEM_SIZE,
            controller: MemoryControllerKind::default(),
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
            row_bytes: defaults::ROW_BYTES,
            simple_latency: defaults::SIMPLE_LATENCY,
        }
    }
}

/// Per-core pipeline limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Instructions a core may hold between fetch and retire
    #[serde(default = "PipelineConfig::default_max_in_flight")]
    pub max_in_flight: usize,
}

impl PipelineConfig {
    fn default_max_in_flight() -> usize {
        defaults::MAX_IN_FLIGHT
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: defaults::MAX_IN_FLIGHT,
        }
    }
}

/// Splits `"32kB"` into `("32", "kB")`.
fn split_number(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    (&s[..end], s[end..].trim())
}

/// Parses a byte size such as `"32kB"`, `"2GB"`, `"64KiB"` or `"4096"`.
///
/// Binary multiples are used for every suffix (`kB` = 1024 bytes).
///
/// # Returns
///
/// The size in bytes, or `ConfigError::InvalidSize`.
pub fn parse_size(s: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidSize(s.to_string());
    let (digits, suffix) = split_number(s.trim());
    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let shift = match suffix.to_ascii_lowercase().as_str() {
        "" | "b" => 0,
        "k" | "kb" | "kib" => 10,
        "m" | "mb" | "mib" => 20,
        "g" | "gb" | "gib" => 30,
        "t" | "tb" | "tib" => 40,
        _ => return Err(invalid()),
    };
    value.checked_mul(1 << shift).ok_or_else(invalid)
}

/// Parses a frequency such as `"3GHz"`, `"1.5GHz"`, `"800MHz"` or `"1000"`.
///
/// # Returns
///
/// The frequency in Hz, or `ConfigError::InvalidFrequency`.
pub fn parse_frequency(s: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidFrequency(s.to_string());
    let (digits, suffix) = split_number(s.trim());
    let scale: u64 = match suffix.to_ascii_lowercase().as_str() {
        "" | "hz" => 1,
        "khz" => 1_000,
        "mhz" => 1_000_000,
        "ghz" => 1_000_000_000,
        _ => return Err(invalid()),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let mut hz = whole.checked_mul(scale).ok_or_else(invalid)?;
    let mut place = scale;
    for c in frac.chars() {
        place /= 10;
        let digit = u64::from(c.to_digit(10).ok_or_else(invalid)?);
        hz = hz.checked_add(digit * place).ok_or_else(invalid)?;
    }
    if hz == 0 {
        return Err(invalid());
    }
    Ok(hz)
}
