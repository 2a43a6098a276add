//! Physical address and address-range types.
//!
//! This module defines the strong types the memory system uses for addresses. It provides:
//! 1. **Type Safety:** `PhysAddr` keeps byte addresses apart from ticks and counters.
//! 2. **Line Alignment:** Helpers for aligning an address down to its cache line.
//! 3. **Ranges:** `AddrRange` describes the single physical range served by the memory controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical byte address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysAddr(pub u64);

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    ///
    /// # Arguments
    ///
    /// * `addr` - The raw 64-bit address value.
    ///
    /// # Returns
    ///
    /// A new `PhysAddr` instance wrapping the provided address.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Aligns the address down to the start of its `line_bytes` sized block.
    ///
    /// `line_bytes` must be a power of two; configuration validation guarantees
    /// this for every cache built from a `Config`.
    #[inline(always)]
    pub const fn align_down(self, line_bytes: u64) -> Self {
        Self(self.0 & !(line_bytes - 1))
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for PhysAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

/// A contiguous physical address range `[base, base + size)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddrRange {
    /// First byte address of the range.
    pub base: u64,
    /// Length of the range in bytes.
    pub size: u64,
}

impl AddrRange {
    /// Creates a range starting at `base` spanning `size` bytes.
    pub const fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    /// Returns the exclusive end address, saturating at `u64::MAX`.
    pub const fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    /// Returns whether `addr` falls inside the range.
    ///
    /// # Arguments
    ///
    /// * `addr` - Physical address to check.
    ///
    /// # Returns
    ///
    /// `true` if `base <= addr < base + size`.
    pub const fn contains(&self, addr: PhysAddr) -> bool {
        addr.0 >= self.base && addr.0 < self.end()
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.base, self.end())
    }
}
