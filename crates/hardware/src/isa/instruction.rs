//! Timing-level instruction representation.
//!
//! Instructions carry only what the timing model needs: the program counter
//! (for instruction-cache lookups), the operation class that selects a
//! functional unit, and the effective address of memory operations. No
//! architectural state is read or written.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::{AccessType, PhysAddr};
use crate::core::units::fu::FuKind;

/// Operation class of an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    /// Integer add, logic, compare or branch.
    IntAlu,
    /// Integer multiply or divide.
    IntMultDiv,
    /// Floating-point or SIMD arithmetic.
    FloatSimd,
    /// Load from `addr`.
    Load {
        /// Effective byte address.
        addr: PhysAddr,
    },
    /// Store to `addr`.
    Store {
        /// Effective byte address.
        addr: PhysAddr,
    },
}

impl Op {
    /// Functional unit the operation issues to.
    pub const fn unit(self) -> FuKind {
        match self {
            Self::IntAlu => FuKind::IntAlu,
            Self::IntMultDiv => FuKind::IntMultDiv,
            Self::FloatSimd => FuKind::FloatSimd,
            Self::Load { .. } => FuKind::MemRead,
            Self::Store { .. } => FuKind::MemWrite,
        }
    }

    /// Data address and direction for memory operations.
    pub const fn memory_access(self) -> Option<(PhysAddr, AccessType)> {
        match self {
            Self::Load { addr } => Some((addr, AccessType::Read)),
            Self::Store { addr } => Some((addr, AccessType::Write)),
            _ => None,
        }
    }

    /// Returns whether the operation accesses the data cache.
    pub const fn is_memory(self) -> bool {
        matches!(self, Self::Load { .. } | Self::Store { .. })
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntAlu => write!(f, "int_alu"),
            Self::IntMultDiv => write!(f, "int_mult_div"),
            Self::FloatSimd => write!(f, "float_simd"),
            Self::Load { addr } => write!(f, "load {addr}"),
            Self::Store { addr } => write!(f, "store {addr}"),
        }
    }
}

/// One instruction of a workload thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Program counter; selects the instruction-cache line.
    pub pc: PhysAddr,
    /// Operation class.
    pub op: Op,
}

impl Instruction {
    /// Creates an instruction at `pc`.
    pub const fn new(pc: u64, op: Op) -> Self {
        Self {
            pc: PhysAddr::new(pc),
            op,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pc, self.op)
    }
}
