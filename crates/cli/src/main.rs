//! Multi-core timing simulator CLI.
//!
//! This binary builds a system from defaults, an optional JSON config file and
//! command-line overrides, then runs it to completion. It performs:
//! 1. **Configuration:** `--config` file first, individual flags override it.
//! 2. **Run:** Builds the `SystemCoordinator` and runs the event loop.
//! 3. **Report:** Prints the exit line and the statistics dump.

use std::process;

use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use mcsim_core::SystemCoordinator;
use mcsim_core::config::{Config, FuPoolSharing, parse_frequency, parse_size};
use mcsim_core::core::units::fu::FuKind;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PoolMode {
    Shared,
    PerCore,
}

impl From<PoolMode> for FuPoolSharing {
    fn from(mode: PoolMode) -> Self {
        match mode {
            PoolMode::Shared => Self::Shared,
            PoolMode::PerCore => Self::PerCore,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "mcsim",
    author,
    version,
    about = "Deterministic cycle-level multi-core timing simulator",
    long_about = "Runs a workload on N in-order cores sharing a memory bus and DRAM controller.\n\nExamples:\n  mcsim --cmd daxpy --num-cpus 4\n  mcsim --cmd fp:100 --op-lat 4 --issue-lat 4\n  mcsim --config system.json --fu-pool per-core"
)]
struct Cli {
    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    config: Option<String>,

    /// Number of cores.
    #[arg(long)]
    num_cpus: Option<usize>,

    /// FloatSimd operation latency in cycles.
    #[arg(long)]
    op_lat: Option<u64>,

    /// FloatSimd issue latency in cycles.
    #[arg(long)]
    issue_lat: Option<u64>,

    /// Workload descriptor: `daxpy[:N]`, `fp:N`, `int:N`, `mul:N` or a `.json` trace.
    #[arg(long)]
    cmd: Option<String>,

    /// L1 cache size for both caches (e.g. `32kB`).
    #[arg(long)]
    cache_size: Option<String>,

    /// L1 associativity for both caches.
    #[arg(long)]
    cache_assoc: Option<usize>,

    /// Physical memory size (e.g. `2GB`).
    #[arg(long)]
    mem_size: Option<String>,

    /// Core clock (e.g. `3GHz`).
    #[arg(long)]
    clock: Option<String>,

    /// Functional-unit pool sharing.
    #[arg(long, value_enum)]
    fu_pool: Option<PoolMode>,

    /// Stop after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Install the workload's instruction lines before timing starts.
    #[arg(long)]
    warm_icache: bool,

    /// Log filter when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    dump_config: bool,
}

/// Initialises the tracing subscriber; `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Layers the command-line overrides on top of the file or default configuration.
fn build_config(cli: &Cli) -> Result<Config, String> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };

    if let Some(n) = cli.num_cpus {
        config.general.num_cpus = n;
    }
    if let Some(cmd) = &cli.cmd {
        config.general.cmd.clone_from(cmd);
    }
    if cli.op_lat.is_some() || cli.issue_lat.is_some() {
        let (issue, op) = config
            .fu_pool
            .unit(FuKind::FloatSimd)
            .map_or((1, 1), |u| (u.issue_lat, u.op_lat));
        config.fu_pool.set_latency(
            FuKind::FloatSimd,
            cli.issue_lat.unwrap_or(issue),
            cli.op_lat.unwrap_or(op),
        );
    }
    if let Some(size) = &cli.cache_size {
        let bytes = parse_size(size).map_err(|e| e.to_string())? as usize;
        config.cache.l1_i.size_bytes = bytes;
        config.cache.l1_d.size_bytes = bytes;
    }
    if let Some(ways) = cli.cache_assoc {
        config.cache.l1_i.ways = ways;
        config.cache.l1_d.ways = ways;
    }
    if let Some(size) = &cli.mem_size {
        config.memory.size = parse_size(size).map_err(|e| e.to_string())?;
    }
    if let Some(clock) = &cli.clock {
        config.system.clock_hz = parse_frequency(clock).map_err(|e| e.to_string())?;
    }
    if let Some(mode) = cli.fu_pool {
        config.fu_pool.sharing = mode.into();
    }
    if cli.max_ticks.is_some() {
        config.general.max_ticks = cli.max_ticks;
    }
    if cli.warm_icache {
        config.general.warm_icache = true;
    }
    Ok(config)
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = build_config(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(2);
    });

    if cli.dump_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let mut system = SystemCoordinator::new(&config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(2);
    });

    println!("**** REAL SIMULATION ****");
    match system.run() {
        Ok(report) => {
            println!("Exiting @ tick {} because {}", report.tick, report.cause);
            report.print();
        }
        Err(e) => {
            error!(tick = system.now(), "fatal: {e}");
            eprintln!("\n[!] FATAL @ tick {}: {e}", system.now());
            process::exit(1);
        }
    }
}
