//! Memory Access Types.
//!
//! This module defines the classification of memory accesses used throughout the simulator.
//! These types are used for the following:
//! 1. **Cache State:** Reads install lines `Shared`, writes install or upgrade them to `Modified`.
//! 2. **Bus Traffic:** Tagging every `BusTransaction` with its direction.
//! 3. **Port Routing:** Telling instruction-side and data-side cache traffic apart.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessType {
    /// Data or instruction read.
    ///
    /// Instruction fetches are reads on the instruction port.
    Read,

    /// Data write.
    ///
    /// Issued by store instructions and by dirty-line write-backs.
    Write,
}

impl AccessType {
    /// Returns the wire tag used by the transaction frame encoding.
    pub const fn wire_tag(self) -> u8 {
        match self {
            Self::Read => 0,
            Self::Write => 1,
        }
    }

    /// Decodes a wire tag produced by [`AccessType::wire_tag`].
    pub const fn from_wire_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Read),
            1 => Some(Self::Write),
            _ => None,
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Which private cache of a core a request belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CachePort {
    /// Instruction cache (fetch side).
    Instruction,
    /// Data cache (load/store side).
    Data,
}

impl CachePort {
    /// Returns the wire tag used by the transaction frame encoding.
    pub const fn wire_tag(self) -> u8 {
        match self {
            Self::Instruction => 0,
            Self::Data => 1,
        }
    }

    /// Decodes a wire tag produced by [`CachePort::wire_tag`].
    pub const fn from_wire_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Instruction),
            1 => Some(Self::Data),
            _ => None,
        }
    }
}

impl fmt::Display for CachePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instruction => write!(f, "icache"),
            Self::Data => write!(f, "dcache"),
        }
    }
}
