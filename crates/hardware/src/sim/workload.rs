//! Workload resolution.
//!
//! This module turns the `cmd` descriptor into one instruction stream per core. It provides:
//! 1. **DAXPY:** `daxpy[:N]` splits `y[i] = a * x[i] + y[i]` over the cores in contiguous chunks,
//!    the last core taking the remainder. Any program name starting with `daxpy`
//!    (for example `./daxpy_multi`) selects it.
//! 2. **Synthetic streams:** `fp:N`, `int:N` and `mul:N` give every core N independent
//!    float, integer ALU or integer multiply/divide instructions with no data accesses.
//! 3. **Traces:** A `.json` file `{"threads": [[{"pc": .., "op": ..}, ..], ..]}`. A single
//!    thread is replicated on every core; otherwise there must be one thread per core.

use serde::Deserialize;
use std::path::Path;

use crate::common::ConfigError;
use crate::common::constants::{ELEMENT_BYTES, INSTRUCTION_BYTES};
use crate::isa::{Instruction, Op};

/// Vector length when `daxpy` is given without one.
pub const DEFAULT_DAXPY_LEN: usize = 10240;

/// First program counter of generated code.
pub const CODE_BASE: u64 = 0x0001_0000;

/// Base address of generated data arrays.
pub const DATA_BASE: u64 = 0x0010_0000;

/// Array alignment; keeps `x` and `y` on distinct pages.
const ARRAY_ALIGN: u64 = 4096;

/// Resolved instruction streams, one per core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    /// Descriptor the streams were built from.
    pub descriptor: String,
    /// `threads[i]` runs on core `i`.
    pub threads: Vec<Vec<Instruction>>,
}

#[derive(Deserialize)]
struct TraceFile {
    threads: Vec<Vec<Instruction>>,
}

impl Workload {
    /// Resolves `cmd` for `num_cpus` cores.
    ///
    /// # Returns
    ///
    /// One stream per core, or `ConfigError::InvalidWorkload` if the descriptor
    /// is unknown or malformed.
    pub fn resolve(cmd: &str, num_cpus: usize) -> Result<Self, ConfigError> {
        let cmd = cmd.trim();
        let invalid = |reason: String| ConfigError::InvalidWorkload {
            descriptor: cmd.to_string(),
            reason,
        };
        if num_cpus == 0 {
            return Err(invalid("at least one core is required".to_string()));
        }
        if Path::new(cmd)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            return Self::from_trace_file(cmd, num_cpus);
        }

        let (name, arg) = match cmd.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (cmd, None),
        };
        let count = |default: Option<usize>| -> Result<usize, ConfigError> {
            match (arg, default) {
                (Some(a), _) => a
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("`{a}` is not an instruction count"))),
                (None, Some(d)) => Ok(d),
                (None, None) => Err(invalid(format!("`{name}` needs a count, e.g. `{name}:100`"))),
            }
        };
        let program = name.rsplit('/').next().unwrap_or(name);

        let threads = match program {
            "fp" => uniform(Op::FloatSimd, count(None)?, num_cpus),
            "int" => uniform(Op::IntAlu, count(None)?, num_cpus),
            "mul" => uniform(Op::IntMultDiv, count(None)?, num_cpus),
            p if p.starts_with("daxpy") => daxpy(count(Some(DEFAULT_DAXPY_LEN))?, num_cpus),
            _ => return Err(invalid("unknown workload".to_string())),
        };
        Ok(Self {
            descriptor: cmd.to_string(),
            threads,
        })
    }

    /// Loads a JSON trace file.
    pub fn from_trace_file(path: &str, num_cpus: usize) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let trace: TraceFile = serde_json::from_str(&text)?;
        let threads = match trace.threads.len() {
            1 => vec![trace.threads[0].clone(); num_cpus],
            n if n == num_cpus => trace.threads,
            n => {
                return Err(ConfigError::InvalidWorkload {
                    descriptor: path.to_string(),
                    reason: format!("trace has {n} threads but {num_cpus} cores are configured"),
                });
            }
        };
        Ok(Self {
            descriptor: path.to_string(),
            threads,
        })
    }

    /// Total instructions across all threads.
    pub fn len(&self) -> usize {
        self.threads.iter().map(Vec::len).sum()
    }

    /// Returns whether every thread is empty.
    pub fn is_empty(&self) -> bool {
        self.threads.iter().all(Vec::is_empty)
    }
}

/// `n` copies of `op` per core, at consecutive program counters.
fn uniform(op: Op, n: usize, num_cpus: usize) -> Vec<Vec<Instruction>> {
    let thread: Vec<Instruction> = (0..n as u64)
        .map(|i| Instruction::new(CODE_BASE + i * INSTRUCTION_BYTES, op))
        .collect();
    vec![thread; num_cpus]
}

/// Per-core DAXPY streams over a vector of `n` elements.
///
/// Every element runs the same seven-instruction loop body: load `x[i]`,
/// load `y[i]`, multiply, add, store `y[i]`, increment, compare-and-branch.
fn daxpy(n: usize, num_cpus: usize) -> Vec<Vec<Instruction>> {
    let x_base = DATA_BASE;
    let y_base = x_base + (n as u64 * ELEMENT_BYTES).next_multiple_of(ARRAY_ALIGN);
    let chunk = n / num_cpus;
    let pc = |slot: u64| CODE_BASE + slot * INSTRUCTION_BYTES;

    (0..num_cpus)
        .map(|core| {
            let start = core * chunk;
            let end = if core + 1 == num_cpus { n } else { start + chunk };
            (start..end)
                .flat_map(|i| {
                    let off = i as u64 * ELEMENT_BYTES;
                    [
                        Instruction::new(pc(0), Op::Load { addr: (x_base + off).into() }),
                        Instruction::new(pc(1), Op::Load { addr: (y_base + off).into() }),
                        Instruction::new(pc(2), Op::FloatSimd),
                        Instruction::new(pc(3), Op::FloatSimd),
                        Instruction::new(pc(4), Op::Store { addr: (y_base + off).into() }),
                        Instruction::new(pc(5), Op::IntAlu),
                        Instruction::new(pc(6), Op::IntAlu),
                    ]
                })
                .collect()
        })
        .collect()
}
