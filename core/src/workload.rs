//! Workload units timed by the harness.
//!
//! A unit is a fixed number of repetitions of either a bounded read from a
//! randomness source or a handful of floating-point operations. Cycle counts
//! are always passed in by the caller.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::hint::black_box;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Hidden subcommand a worker process is re-executed with.
pub const WORKER_SUBCOMMAND: &str = "worker";

pub const DEFAULT_IO_CYCLES: u64 = 1_000;
pub const DEFAULT_CPU_CYCLES: u64 = 1_000_000;
pub const DEFAULT_READ_SIZE: usize = 4 * 65_535;
pub const DEFAULT_SOURCE: &str = "/dev/urandom";
/// Largest buffer a single read may ask for (64 MiB).
pub const MAX_READ_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    Io,
    Cpu,
}

impl WorkloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadKind::Io => "io",
            WorkloadKind::Cpu => "cpu",
        }
    }

    /// Phrase used in the start-of-run banner.
    pub fn description(self) -> &'static str {
        match self {
            WorkloadKind::Io => "io-bound",
            WorkloadKind::Cpu => "cpu-only",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invocation of a workload unit, complete enough to be replayed in
/// another process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "workload", rename_all = "lowercase")]
pub enum WorkloadSpec {
    Io {
        cycles: u64,
        read_size: usize,
        source: PathBuf,
    },
    Cpu {
        cycles: u64,
    },
}

impl WorkloadSpec {
    pub fn io(cycles: u64) -> Self {
        WorkloadSpec::Io {
            cycles,
            read_size: DEFAULT_READ_SIZE,
            source: PathBuf::from(DEFAULT_SOURCE),
        }
    }

    pub fn cpu(cycles: u64) -> Self {
        WorkloadSpec::Cpu { cycles }
    }

    pub fn kind(&self) -> WorkloadKind {
        match self {
            WorkloadSpec::Io { .. } => WorkloadKind::Io,
            WorkloadSpec::Cpu { .. } => WorkloadKind::Cpu,
        }
    }

    pub fn cycles(&self) -> u64 {
        match self {
            WorkloadSpec::Io { cycles, .. } | WorkloadSpec::Cpu { cycles } => *cycles,
        }
    }

    /// Start-of-run banner. The io count covers every invocation, the cpu
    /// count is per unit.
    pub fn banner(&self, invocations: usize) -> String {
        let cycles = match self {
            WorkloadSpec::Io { cycles, .. } => cycles.saturating_mul(invocations as u64),
            WorkloadSpec::Cpu { cycles } => *cycles,
        };
        format!("Starting {} cycles of {} processing", cycles, self.kind().description())
    }

    /// Run the unit in the calling thread.
    pub fn run(&self) -> Result<()> {
        match self {
            WorkloadSpec::Io {
                cycles,
                read_size,
                source,
            } => io_bound(source, *cycles, *read_size),
            WorkloadSpec::Cpu { cycles } => {
                cpu_bound(*cycles);
                Ok(())
            }
        }
    }

    /// Arguments that make a re-executed binary run exactly this unit.
    pub fn to_worker_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            WORKER_SUBCOMMAND.into(),
            "--workload".into(),
            self.kind().as_str().into(),
            "--cycles".into(),
            self.cycles().to_string().into(),
        ];
        if let WorkloadSpec::Io { read_size, source, .. } = self {
            args.push("--read-size".into());
            args.push(read_size.to_string().into());
            args.push("--source".into());
            args.push(source.as_os_str().to_owned());
        }
        args
    }
}

/// Read `read_size` bytes from `source` `cycles` times, discarding them.
///
/// Nothing is opened when `cycles` is zero. A short read at end of file is
/// accepted, so a regular file can stand in for the device. `read_size`
/// above [`MAX_READ_SIZE`] is refused before anything is allocated.
pub fn io_bound(source: &Path, cycles: u64, read_size: usize) -> Result<()> {
    if read_size > MAX_READ_SIZE {
        bail!("read size {} exceeds the {} byte limit", read_size, MAX_READ_SIZE);
    }
    if cycles == 0 {
        return Ok(());
    }

    let mut file =
        File::open(source).with_context(|| format!("open randomness source {}", source.display()))?;
    let mut buf = vec![0u8; read_size];
    let mut total = 0u64;
    for _ in 0..cycles {
        let n = fill(&mut file, &mut buf).with_context(|| format!("read randomness source {}", source.display()))?;
        total += n as u64;
    }
    black_box(&buf);

    debug!(source = %source.display(), cycles, bytes = total, "io workload finished");
    Ok(())
}

fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub fn cpu_bound(cycles: u64) {
    cpu_bound_with(cycles, |_| {});
}

/// Same loop as [`cpu_bound`], calling `tick` once per iteration.
pub fn cpu_bound_with(cycles: u64, mut tick: impl FnMut(u64)) {
    for x in 0..cycles {
        // black_box keeps the division inside the loop
        let half = black_box(cycles as f64) / 2.0;
        black_box(x as f64 > half);
        black_box(half + 1.0);
        black_box(half - 2.0);
        black_box(half * 2.0);
        tick(x);
    }
}
