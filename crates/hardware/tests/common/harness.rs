//! # Test Harness
//!
//! Builds small systems and runs them to completion so scenario tests can
//! assert on the exit report without repeating setup.

use mcsim_core::config::{Config, FuPoolSharing};
use mcsim_core::core::units::fu::FuKind;
use mcsim_core::sim::{ExitReport, SystemCoordinator};

/// Default configuration with `num_cpus` cores running `cmd`.
pub fn config(num_cpus: usize, cmd: &str) -> Config {
    let mut config = Config::default();
    config.general.num_cpus = num_cpus;
    config.general.cmd = cmd.to_string();
    config
}

/// Like [`config`], with FloatSimd latencies and pool sharing set, and the
/// icaches warmed so instruction fetch never reaches the bus.
pub fn fp_config(num_cpus: usize, cmd: &str, issue_lat: u64, op_lat: u64, sharing: FuPoolSharing) -> Config {
    let mut config = config(num_cpus, cmd);
    config.fu_pool.set_latency(FuKind::FloatSimd, issue_lat, op_lat);
    config.fu_pool.sharing = sharing;
    config.general.warm_icache = true;
    config
}

/// Builds and runs `config`, panicking on any error.
pub fn run(config: &Config) -> (SystemCoordinator, ExitReport) {
    let mut system = SystemCoordinator::new(config).expect("system builds");
    let report = system.run().expect("run completes");
    (system, report)
}
