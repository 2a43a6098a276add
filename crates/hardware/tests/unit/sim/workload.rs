//! # Workload Tests
//!
//! Resolution of `cmd` descriptors into per-core instruction streams.

use std::io::Write;

use mcsim_core::common::ConfigError;
use mcsim_core::isa::{Instruction, Op};
use mcsim_core::sim::workload::{CODE_BASE, DATA_BASE, Workload};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("fp:3", Op::FloatSimd)]
#[case("int:3", Op::IntAlu)]
#[case("mul:3", Op::IntMultDiv)]
fn synthetic_streams(#[case] cmd: &str, #[case] op: Op) {
    let w = Workload::resolve(cmd, 2).unwrap();
    assert_eq!(w.threads.len(), 2);
    assert_eq!(w.threads[0], w.threads[1]);
    assert_eq!(
        w.threads[0],
        vec![
            Instruction::new(CODE_BASE, op),
            Instruction::new(CODE_BASE + 4, op),
            Instruction::new(CODE_BASE + 8, op),
        ]
    );
}

#[test]
fn daxpy_element_body() {
    let w = Workload::resolve("daxpy:4", 1).unwrap();
    let t = &w.threads[0];
    assert_eq!(t.len(), 4 * 7);
    let ops: Vec<_> = t[..7].iter().map(|i| i.op).collect();
    let x0 = DATA_BASE;
    let y0 = DATA_BASE + 4096;
    assert_eq!(
        ops,
        vec![
            Op::Load { addr: x0.into() },
            Op::Load { addr: y0.into() },
            Op::FloatSimd,
            Op::FloatSimd,
            Op::Store { addr: y0.into() },
            Op::IntAlu,
            Op::IntAlu,
        ]
    );
    // Second element moves to the next 8-byte slot and reuses the loop's PCs.
    assert_eq!(t[7].op, Op::Load { addr: (x0 + 8).into() });
    assert_eq!(t[7].pc, t[0].pc);
}

#[test]
fn daxpy_splits_contiguously() {
    let w = Workload::resolve("daxpy:10", 4).unwrap();
    let lens: Vec<_> = w.threads.iter().map(|t| t.len() / 7).collect();
    assert_eq!(lens, vec![2, 2, 2, 4]);
    let first_x = |t: &Vec<Instruction>| match t[0].op {
        Op::Load { addr } => addr.val(),
        _ => unreachable!(),
    };
    assert_eq!(first_x(&w.threads[1]), DATA_BASE + 2 * 8);
    assert_eq!(first_x(&w.threads[3]), DATA_BASE + 6 * 8);
}

#[test]
fn program_path_selects_daxpy() {
    let w = Workload::resolve("tests/test-progs/daxpy/bin/x86/linux/daxpy_multi", 2).unwrap();
    assert_eq!(w.len(), 10240 * 7);
}

#[rstest]
#[case("hello")]
#[case("fp")]
#[case("fp:-1")]
#[case("daxpy:lots")]
fn bad_descriptors(#[case] cmd: &str) {
    assert!(matches!(
        Workload::resolve(cmd, 1),
        Err(ConfigError::InvalidWorkload { .. })
    ));
}

#[test]
fn trace_file_single_thread_replicates() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{ "threads": [[
            {{ "pc": 4096, "op": "IntAlu" }},
            {{ "pc": 4100, "op": {{ "Load": {{ "addr": 65536 }} }} }}
        ]] }}"#
    )
    .unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let w = Workload::resolve(&path, 3).unwrap();
    assert_eq!(w.threads.len(), 3);
    assert_eq!(w.threads[2][1].op, Op::Load { addr: 65536.into() });
}

#[test]
fn trace_thread_count_must_match() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{ "threads": [[], []] }}"#).unwrap();
    let path = file.path().to_str().unwrap().to_string();
    assert!(Workload::resolve(&path, 3).is_err());
    assert_eq!(Workload::resolve(&path, 2).unwrap().len(), 0);
}
