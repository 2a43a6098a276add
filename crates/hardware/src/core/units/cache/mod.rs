//! Set-Associative Cache Model.
//!
//! This module implements the private instruction and data caches of a core.
//! It provides:
//! 1. **Lookup:** Hits complete after the configured hit latency; misses are reported to the caller,
//!    which turns them into bus transactions.
//! 2. **Miss merging:** An MSHR table keyed by line address; a second miss to a line with a fill in
//!    flight waits on the existing request instead of issuing another.
//! 3. **Write policy:** Write-allocate, write-back. Dirty victims are queued for the owning core to
//!    drain onto the bus.
//! 4. **Maintenance:** `invalidate`, `flush` and functional warm-up.
//!
//! The caches are private and not kept coherent with each other.

/// Cache replacement policy implementations (LRU, FIFO).
pub mod policies;

use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use self::policies::{FifoPolicy, LruPolicy, ReplacementPolicy};
use crate::common::{AccessType, ConfigError, PhysAddr, Tick};
use crate::config::{CacheConfig, ReplacementPolicy as PolicyType};

/// Coherence-style state of a cache line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineState {
    /// Way holds no data.
    #[default]
    Invalid,
    /// Clean copy of memory.
    Shared,
    /// Dirty; must be written back on eviction.
    Modified,
}

/// Cache line entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// Line-aligned address held by the way.
    pub address: PhysAddr,
    /// Line state.
    pub state: LineState,
    /// Tick of the most recent hit or fill.
    pub last_access_tick: Tick,
    /// Tick the line was installed.
    pub fill_tick: Tick,
}

impl CacheLine {
    /// Returns whether the way holds data.
    pub fn is_valid(&self) -> bool {
        self.state != LineState::Invalid
    }
}

/// Result of a cache lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheAccess {
    /// Line present; data is ready at `ready_at`.
    Hit {
        /// `tick + hit latency`.
        ready_at: Tick,
    },
    /// Line absent; the access completes when the fill for `line` arrives.
    Miss {
        /// Line-aligned miss address.
        line: PhysAddr,
        /// `true` if a fill for this line was already outstanding, so no new
        /// bus request is needed.
        merged: bool,
    },
}

/// Outstanding fill for one line.
#[derive(Clone, Debug)]
struct Mshr {
    waiters: Vec<u64>,
    write: bool,
}

/// Hit, miss and traffic counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found the line.
    pub hits: u64,
    /// Lookups that missed, including merged misses.
    pub misses: u64,
    /// Misses absorbed by an outstanding fill.
    pub merged: u64,
    /// Valid lines displaced by a fill.
    pub evictions: u64,
    /// Dirty lines queued for write-back.
    pub writebacks: u64,
}

/// Set-associative cache with configurable geometry and replacement policy.
#[derive(Debug)]
pub struct CacheModel {
    name: &'static str,
    lines: Vec<CacheLine>,
    num_sets: usize,
    ways: usize,
    line_bytes: u64,
    latency: u64,
    policy: Box<dyn ReplacementPolicy>,
    mshrs: BTreeMap<PhysAddr, Mshr>,
    writebacks: VecDeque<PhysAddr>,
    stats: CacheStats,
}

impl CacheModel {
    /// Creates an empty cache.
    ///
    /// # Arguments
    ///
    /// * `name` - `"icache"` or `"dcache"`, used in errors and traces.
    /// * `config` - Size, line size, associativity, hit latency and policy.
    ///
    /// # Returns
    ///
    /// The cache, or `ConfigError::InvalidCacheGeometry`.
    pub fn new(name: &'static str, config: &CacheConfig) -> Result<Self, ConfigError> {
        config.validate(name)?;
        let num_sets = config.num_sets();
        let policy: Box<dyn ReplacementPolicy> = match config.policy {
            PolicyType::Lru => Box::new(LruPolicy),
            PolicyType::Fifo => Box::new(FifoPolicy),
        };
        Ok(Self {
            name,
            lines: vec![CacheLine::default(); num_sets * config.ways],
            num_sets,
            ways: config.ways,
            line_bytes: config.line_bytes as u64,
            latency: config.latency,
            policy,
            mshrs: BTreeMap::new(),
            writebacks: VecDeque::new(),
            stats: CacheStats::default(),
        })
    }

    /// Cache name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Hit latency in ticks.
    pub const fn latency(&self) -> u64 {
        self.latency
    }

    /// Line size in bytes.
    pub const fn line_bytes(&self) -> u64 {
        self.line_bytes
    }

    /// Counters accumulated so far.
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Aligns `addr` to its line.
    pub const fn line_of(&self, addr: PhysAddr) -> PhysAddr {
        addr.align_down(self.line_bytes)
    }

    fn set_range(&self, line: PhysAddr) -> std::ops::Range<usize> {
        let set = ((line.val() / self.line_bytes) as usize) & (self.num_sets - 1);
        let base = set * self.ways;
        base..base + self.ways
    }

    fn find(&self, line: PhysAddr) -> Option<usize> {
        self.set_range(line)
            .find(|&i| self.lines[i].is_valid() && self.lines[i].address == line)
    }

    /// Returns whether the line holding `addr` is resident.
    pub fn contains(&self, addr: PhysAddr) -> bool {
        self.find(self.line_of(addr)).is_some()
    }

    /// Returns the resident line holding `addr`.
    pub fn line(&self, addr: PhysAddr) -> Option<&CacheLine> {
        self.find(self.line_of(addr)).map(|i| &self.lines[i])
    }

    /// Number of lines with a fill in flight.
    pub fn outstanding(&self) -> usize {
        self.mshrs.len()
    }

    /// Looks up `addr` at `tick`.
    ///
    /// On a hit the line's access tick is refreshed and a write marks it
    /// `Modified`. On a miss `waiter` is recorded against the line and
    /// returned by `fill` once the data arrives.
    ///
    /// # Arguments
    ///
    /// * `addr` - Byte address accessed.
    /// * `kind` - Read or write.
    /// * `tick` - Current tick.
    /// * `waiter` - Caller token (instruction sequence number) to wake on fill.
    pub fn access(&mut self, addr: PhysAddr, kind: AccessType, tick: Tick, waiter: u64) -> CacheAccess {
        let line = self.line_of(addr);
        if let Some(i) = self.find(line) {
            let entry = &mut self.lines[i];
            entry.last_access_tick = tick;
            if kind == AccessType::Write {
                entry.state = LineState::Modified;
            }
            self.stats.hits += 1;
            return CacheAccess::Hit {
                ready_at: tick + self.latency,
            };
        }

        self.stats.misses += 1;
        let write = kind == AccessType::Write;
        if let Some(mshr) = self.mshrs.get_mut(&line) {
            mshr.waiters.push(waiter);
            mshr.write |= write;
            self.stats.merged += 1;
            trace!(cache = self.name, %line, "miss merged into outstanding fill");
            return CacheAccess::Miss { line, merged: true };
        }
        let _ = self.mshrs.insert(
            line,
            Mshr {
                waiters: vec![waiter],
                write,
            },
        );
        trace!(cache = self.name, %line, %kind, "miss");
        CacheAccess::Miss {
            line,
            merged: false,
        }
    }

    /// Installs the line for a completed fill and wakes its waiters.
    ///
    /// # Returns
    ///
    /// The waiter tokens recorded by `access`, in arrival order. Empty if no
    /// fill was outstanding for the line.
    pub fn fill(&mut self, addr: PhysAddr, tick: Tick) -> Vec<u64> {
        let line = self.line_of(addr);
        let Some(mshr) = self.mshrs.remove(&line) else {
            return Vec::new();
        };
        let state = if mshr.write {
            LineState::Modified
        } else {
            LineState::Shared
        };
        self.install(line, state, tick);
        mshr.waiters
    }

    fn install(&mut self, line: PhysAddr, state: LineState, tick: Tick) {
        if let Some(i) = self.find(line) {
            let entry = &mut self.lines[i];
            entry.last_access_tick = tick;
            if state == LineState::Modified {
                entry.state = state;
            }
            return;
        }
        let range = self.set_range(line);
        let way = self.lines[range.clone()]
            .iter()
            .position(|l| !l.is_valid())
            .unwrap_or_else(|| self.policy.get_victim(&self.lines[range.clone()]));
        let idx = range.start + way;
        let victim = self.lines[idx];
        if victim.is_valid() {
            self.stats.evictions += 1;
            if victim.state == LineState::Modified {
                self.stats.writebacks += 1;
                self.writebacks.push_back(victim.address);
            }
            trace!(cache = self.name, victim = %victim.address, %line, "evict");
        }
        self.lines[idx] = CacheLine {
            address: line,
            state,
            last_access_tick: tick,
            fill_tick: tick,
        };
    }

    /// Installs the line holding `addr` without timing or statistics.
    ///
    /// Used to pre-load instruction lines before the run starts.
    pub fn warm(&mut self, addr: PhysAddr) {
        let line = self.line_of(addr);
        if self.find(line).is_none() {
            let before = self.stats;
            self.install(line, LineState::Shared, 0);
            self.stats = before;
        }
    }

    /// Drops the line holding `addr`, queueing a write-back if it was dirty.
    ///
    /// # Returns
    ///
    /// `true` if the line was resident.
    pub fn invalidate(&mut self, addr: PhysAddr) -> bool {
        let line = self.line_of(addr);
        let Some(i) = self.find(line) else {
            return false;
        };
        if self.lines[i].state == LineState::Modified {
            self.stats.writebacks += 1;
            self.writebacks.push_back(line);
        }
        self.lines[i] = CacheLine::default();
        true
    }

    /// Invalidates every line, queueing write-backs for the dirty ones.
    ///
    /// # Returns
    ///
    /// Number of dirty lines queued.
    pub fn flush(&mut self) -> usize {
        let mut dirty = 0;
        for line in &mut self.lines {
            if line.state == LineState::Modified {
                self.writebacks.push_back(line.address);
                dirty += 1;
            }
            *line = CacheLine::default();
        }
        self.stats.writebacks += dirty as u64;
        dirty
    }

    /// Takes the oldest pending write-back.
    pub fn pop_writeback(&mut self) -> Option<PhysAddr> {
        self.writebacks.pop_front()
    }

    /// Number of write-backs waiting for the bus.
    pub fn pending_writebacks(&self) -> usize {
        self.writebacks.len()
    }
}
