//! Worker creation and joining.
//!
//! A [`Spawner`] starts one workload-unit invocation somewhere other than the
//! calling thread and hands back a [`WorkerHandle`] to block on. Nothing but
//! the job description crosses into the worker, and nothing but its exit
//! status comes back.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::debug;

use crate::config::Isolation;
use crate::workload::WorkloadSpec;

/// Runs a workload unit in-process. Swappable so tests can observe the work.
pub type UnitFn = Arc<dyn Fn(&WorkloadSpec) -> Result<()> + Send + Sync>;

pub fn default_unit() -> UnitFn {
    Arc::new(|job: &WorkloadSpec| job.run())
}

/// How a worker finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    Success,
    Failed(String),
}

impl WorkerExit {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerExit::Success)
    }
}

pub trait WorkerHandle: Send {
    /// Short human-readable name, e.g. `pid 4242`.
    fn describe(&self) -> String;

    /// Block until the worker has exited. An `Err` means waiting itself
    /// failed, not the worker.
    fn join(self: Box<Self>) -> Result<WorkerExit>;
}

pub trait Spawner: Send + Sync {
    fn isolation(&self) -> Isolation;

    /// Start a worker running `job`. Returns once the worker exists, not
    /// once it has finished.
    fn spawn(&self, job: &WorkloadSpec) -> Result<Box<dyn WorkerHandle>>;
}

/// Build the spawner for an isolation mode. Process workers re-execute the
/// current binary.
pub fn spawner_for(isolation: Isolation) -> Result<Box<dyn Spawner>> {
    Ok(match isolation {
        Isolation::Process => Box::new(ProcessSpawner::current_exe()?),
        Isolation::Thread => Box::new(ThreadSpawner::new()),
    })
}

/// Starts each worker as a fresh OS process of `program`, invoked with the
/// hidden worker subcommand.
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    program: PathBuf,
}

impl ProcessSpawner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn current_exe() -> Result<Self> {
        let program = std::env::current_exe().context("locate current executable for worker processes")?;
        Ok(Self::new(program))
    }
}

impl Spawner for ProcessSpawner {
    fn isolation(&self) -> Isolation {
        Isolation::Process
    }

    fn spawn(&self, job: &WorkloadSpec) -> Result<Box<dyn WorkerHandle>> {
        let child = Command::new(&self.program)
            .args(job.to_worker_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("spawn worker process {}", self.program.display()))?;
        debug!(pid = child.id(), "worker process started");
        Ok(Box::new(ProcessWorker { child }))
    }
}

struct ProcessWorker {
    child: Child,
}

impl WorkerHandle for ProcessWorker {
    fn describe(&self) -> String {
        format!("pid {}", self.child.id())
    }

    fn join(mut self: Box<Self>) -> Result<WorkerExit> {
        let pid = self.child.id();
        let status = self
            .child
            .wait()
            .with_context(|| format!("wait for worker process {}", pid))?;
        debug!(pid, %status, "worker process exited");
        if status.success() {
            Ok(WorkerExit::Success)
        } else {
            Ok(WorkerExit::Failed(format!("exited with {}", status)))
        }
    }
}

/// Starts each worker on a dedicated OS thread inside the harness process.
pub struct ThreadSpawner {
    unit: UnitFn,
    next_id: AtomicUsize,
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadSpawner {
    pub fn new() -> Self {
        Self::with_unit(default_unit())
    }

    pub fn with_unit(unit: UnitFn) -> Self {
        Self {
            unit,
            next_id: AtomicUsize::new(1),
        }
    }
}

impl Spawner for ThreadSpawner {
    fn isolation(&self) -> Isolation {
        Isolation::Thread
    }

    fn spawn(&self, job: &WorkloadSpec) -> Result<Box<dyn WorkerHandle>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = format!("procbench-worker-{}", id);
        let unit = Arc::clone(&self.unit);
        let job = job.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || unit(&job))
            .with_context(|| format!("spawn worker thread {}", name))?;
        debug!(worker = %name, "worker thread started");
        Ok(Box::new(ThreadWorker { name, handle }))
    }
}

struct ThreadWorker {
    name: String,
    handle: JoinHandle<Result<()>>,
}

impl WorkerHandle for ThreadWorker {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn join(self: Box<Self>) -> Result<WorkerExit> {
        let exit = match self.handle.join() {
            Ok(Ok(())) => WorkerExit::Success,
            Ok(Err(err)) => WorkerExit::Failed(format!("{:#}", err)),
            Err(_) => WorkerExit::Failed("worker thread panicked".to_string()),
        };
        debug!(worker = %self.name, success = exit.is_success(), "worker thread exited");
        Ok(exit)
    }
}
