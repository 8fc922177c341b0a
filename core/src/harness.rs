use anyhow::Result;
use tracing::{info, info_span};

use crate::config::Isolation;
use crate::spawn::{Spawner, UnitFn, default_unit};
use crate::strategy::{Plan, Strategy, run_wave};
use crate::timing::{Sample, time_it};
use crate::workload::WorkloadSpec;

/// Runs strategies for a single workload and times each one.
pub struct Harness {
    job: WorkloadSpec,
    spawner: Box<dyn Spawner>,
    unit: UnitFn,
}

impl Harness {
    pub fn new(job: WorkloadSpec, spawner: Box<dyn Spawner>) -> Self {
        Self {
            job,
            spawner,
            unit: default_unit(),
        }
    }

    /// Replace what in-process invocations run. Workers are unaffected.
    pub fn with_unit(mut self, unit: UnitFn) -> Self {
        self.unit = unit;
        self
    }

    pub fn job(&self) -> &WorkloadSpec {
        &self.job
    }

    pub fn isolation(&self) -> Isolation {
        self.spawner.isolation()
    }

    pub fn run_strategy(&self, strategy: &Strategy) -> Result<Sample> {
        let span = info_span!("strategy", label = strategy.label());
        let _enter = span.enter();

        let mut failed = 0;
        let sample = time_it(strategy.label(), || {
            match strategy.plan() {
                Plan::InProcess { invocations } => {
                    for _ in 0..*invocations {
                        (self.unit)(&self.job)?;
                    }
                }
                Plan::Waves(sizes) => {
                    for (wave, &size) in sizes.iter().enumerate() {
                        let _wave = info_span!("wave", index = wave, size).entered();
                        failed += run_wave(self.spawner.as_ref(), &self.job, size)?;
                    }
                }
            }
            Ok(())
        })?
        .with_failed_workers(failed);

        info!(
            elapsed_secs = sample.elapsed().as_secs_f64(),
            failed_workers = failed,
            "strategy finished"
        );
        Ok(sample)
    }

    /// Run `strategies` strictly one after another, handing each sample to
    /// `on_sample` as soon as it is taken.
    pub fn run_all<F>(&self, strategies: &[Strategy], mut on_sample: F) -> Result<Vec<Sample>>
    where
        F: FnMut(&Sample) -> Result<()>,
    {
        let mut samples = Vec::with_capacity(strategies.len());
        for strategy in strategies {
            let sample = self.run_strategy(strategy)?;
            on_sample(&sample)?;
            samples.push(sample);
        }
        Ok(samples)
    }
}
