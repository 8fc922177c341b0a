use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use procbench_core::{
    config::{BenchConfig, Isolation, Overrides},
    harness::Harness,
    report::{RunRecord, write_json},
    spawn::spawner_for,
    strategy::standard_strategies,
    workload::{DEFAULT_READ_SIZE, DEFAULT_SOURCE, WORKER_SUBCOMMAND, WorkloadSpec},
};
use tracing::{debug, info};

pub use procbench_core::workload::WorkloadKind;
pub use trace::maybe_init_tracing;

mod trace;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Time sequential vs multi-process runs of a fixed workload",
    long_about = None,
    after_help = "Set PROCBENCH_TRACE=1 (or a tracing filter) for diagnostics on stderr."
)]
pub struct CliArgs {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML or YAML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Cycles per workload unit
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// Bytes per read (io workload only)
    #[arg(long, value_name = "BYTES")]
    read_size: Option<usize>,

    /// Randomness source to read from (io workload only)
    #[arg(long, value_name = "PATH")]
    source: Option<PathBuf>,

    /// Run concurrent workers as processes or threads
    #[arg(long, value_enum)]
    isolation: Option<IsolationArg>,

    /// Also write a JSON report of the run to this path
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WorkloadArg {
    Io,
    Cpu,
}

impl From<WorkloadArg> for WorkloadKind {
    fn from(value: WorkloadArg) -> Self {
        match value {
            WorkloadArg::Io => WorkloadKind::Io,
            WorkloadArg::Cpu => WorkloadKind::Cpu,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum IsolationArg {
    Process,
    Thread,
}

impl From<IsolationArg> for Isolation {
    fn from(value: IsolationArg) -> Self {
        match value {
            IsolationArg::Process => Isolation::Process,
            IsolationArg::Thread => Isolation::Thread,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a single workload unit and exit. Spawned by the harness itself.
    #[command(name = WORKER_SUBCOMMAND, hide = true)]
    Worker {
        #[arg(long, value_enum)]
        workload: WorkloadArg,
        #[arg(long)]
        cycles: u64,
        #[arg(long, default_value_t = DEFAULT_READ_SIZE)]
        read_size: usize,
        #[arg(long, default_value = DEFAULT_SOURCE)]
        source: PathBuf,
    },
}

/// Entry point shared by the `compare-*` binaries.
pub fn run(kind: WorkloadKind) -> anyhow::Result<()> {
    maybe_init_tracing()?;
    let args = CliArgs::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(kind, args, &mut out)
}

/// Run the three standard strategies for `kind`, writing one timing line per
/// strategy to `out` as soon as it finishes.
pub fn execute(kind: WorkloadKind, args: CliArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let CliArgs {
        command,
        config,
        cycles,
        read_size,
        source,
        isolation,
        json,
    } = args;

    if let Some(Commands::Worker {
        workload,
        cycles,
        read_size,
        source,
    }) = command
    {
        return run_worker(workload.into(), cycles, read_size, source);
    }

    let mut bench = match &config {
        Some(path) => BenchConfig::load(path)?,
        None => BenchConfig::default(),
    };
    let overrides = Overrides {
        cycles,
        read_size,
        source,
        isolation: isolation.map(Isolation::from),
    };
    bench.apply(kind, &overrides)?;
    bench.validate()?;

    let job = bench.workload(kind);
    let strategies = standard_strategies();
    info!(
        workload = %kind,
        isolation = %bench.isolation,
        "{}",
        job.banner(strategies[0].plan().total_invocations())
    );

    let harness = Harness::new(job, spawner_for(bench.isolation)?);
    let samples = harness.run_all(strategies, |sample| {
        writeln!(out, "{}", sample)?;
        out.flush()?;
        Ok(())
    })?;

    if let Some(path) = json {
        let record = RunRecord::capture(harness.job(), harness.isolation(), samples);
        write_json(&path, &record)?;
        info!(path = %path.display(), "json report written");
    }
    Ok(())
}

fn run_worker(kind: WorkloadKind, cycles: u64, read_size: usize, source: PathBuf) -> anyhow::Result<()> {
    let job = match kind {
        WorkloadKind::Io => WorkloadSpec::Io {
            cycles,
            read_size,
            source,
        },
        WorkloadKind::Cpu => WorkloadSpec::Cpu { cycles },
    };
    debug!(pid = std::process::id(), ?job, "worker started");
    job.run().with_context(|| format!("{} worker {} failed", kind, std::process::id()))
}
