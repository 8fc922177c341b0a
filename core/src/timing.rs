use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Elapsed wall-clock time for one labelled action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    label: String,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    elapsed: Duration,
    failed_workers: usize,
}

impl Sample {
    pub fn new(label: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            label: label.into(),
            elapsed,
            failed_workers: 0,
        }
    }

    pub fn with_failed_workers(mut self, failed: usize) -> Self {
        self.failed_workers = failed;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn failed_workers(&self) -> usize {
        self.failed_workers
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_line(&self.label, self.elapsed))
    }
}

fn serialize_secs<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// `"  <label> - run time: <secs> seconds"` with two decimals.
pub fn format_line(label: &str, elapsed: Duration) -> String {
    format!("  {} - run time: {:.2} seconds", label, elapsed.as_secs_f64())
}

/// Time `action` from just before it starts until it has fully returned.
///
/// Errors from the action are passed through untouched and no sample is
/// produced.
pub fn time_it<F>(label: impl Into<String>, action: F) -> Result<Sample>
where
    F: FnOnce() -> Result<()>,
{
    let start = Instant::now();
    action()?;
    let elapsed = start.elapsed();
    Ok(Sample::new(label, elapsed))
}
