//! Execution strategies: how the four workload-unit invocations are laid out.

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::spawn::{Spawner, WorkerExit, WorkerHandle};
use crate::workload::WorkloadSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Call the unit `invocations` times in the harness, one after another.
    InProcess { invocations: usize },
    /// Each entry is a wave of that many concurrent workers. A wave is fully
    /// joined before the next one is created.
    Waves(Vec<usize>),
}

impl Plan {
    pub fn total_invocations(&self) -> usize {
        match self {
            Plan::InProcess { invocations } => *invocations,
            Plan::Waves(sizes) => sizes.iter().sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    label: String,
    plan: Plan,
}

impl Strategy {
    pub fn new(label: impl Into<String>, plan: Plan) -> Self {
        Self {
            label: label.into(),
            plan,
        }
    }

    pub fn sequential(invocations: usize) -> Self {
        Self::new("Sequential", Plan::InProcess { invocations })
    }

    pub fn parallel(workers: usize) -> Self {
        Self::new(format!("{} procs Parallel", workers), Plan::Waves(vec![workers]))
    }

    pub fn repeated_waves(workers: usize, waves: usize) -> Self {
        let times = match waves {
            1 => "once".to_string(),
            2 => "twice".to_string(),
            n => format!("{} times", n),
        };
        Self::new(
            format!("{} procs Parallel {}", workers, times),
            Plan::Waves(vec![workers; waves]),
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }
}

static STANDARD_STRATEGIES: Lazy<Vec<Strategy>> = Lazy::new(|| {
    vec![
        Strategy::sequential(4),
        Strategy::parallel(4),
        Strategy::repeated_waves(2, 2),
    ]
});

/// Sequential, 4 procs Parallel, 2 procs Parallel twice, in that order.
pub fn standard_strategies() -> &'static [Strategy] {
    &STANDARD_STRATEGIES
}

/// Start `size` workers running `job`, then join every one of them.
///
/// Returns how many workers did not exit successfully. A worker failure is
/// not an error; failing to start or wait for a worker is. Every started
/// worker is joined before any error is returned, and the first one wins.
pub fn run_wave(spawner: &dyn Spawner, job: &WorkloadSpec, size: usize) -> Result<usize> {
    let mut handles: Vec<Box<dyn WorkerHandle>> = Vec::with_capacity(size);
    for _ in 0..size {
        match spawner.spawn(job) {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                let started = handles.len();
                let _ = join_all(handles);
                warn!(started, error = %format!("{:#}", err), "worker failed to start, wave abandoned");
                return Err(err);
            }
        }
    }

    let (failed, first_error) = join_all(handles);
    match first_error {
        Some(err) => Err(err),
        None => Ok(failed),
    }
}

/// Join every handle, counting unsuccessful exits. Wait errors are logged
/// and the first is handed back.
fn join_all(handles: Vec<Box<dyn WorkerHandle>>) -> (usize, Option<anyhow::Error>) {
    let mut failed = 0;
    let mut first_error = None;
    for handle in handles {
        let worker = handle.describe();
        match handle.join() {
            Ok(WorkerExit::Success) => debug!(%worker, "worker joined"),
            Ok(WorkerExit::Failed(reason)) => {
                warn!(%worker, %reason, "worker did not finish successfully");
                failed += 1;
            }
            Err(err) => {
                warn!(%worker, error = %format!("{:#}", err), "could not wait for worker");
                first_error.get_or_insert(err);
            }
        }
    }
    (failed, first_error)
}
