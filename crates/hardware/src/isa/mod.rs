//! Instruction model.
//!
//! The simulator does not decode or execute an instruction set. Workloads are
//! streams of `Instruction` values that carry an operation class and, for
//! loads and stores, an effective address.

/// Instruction and operation-class definitions.
pub mod instruction;

pub use instruction::{Instruction, Op};
