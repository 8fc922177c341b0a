use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::Isolation;
use crate::timing::Sample;
use crate::workload::WorkloadSpec;

/// JSON snapshot of one comparison run.
#[derive(Debug, Serialize)]
pub struct RunRecord {
    pub generated_at: String,
    #[serde(flatten)]
    pub job: WorkloadSpec,
    pub isolation: Isolation,
    pub strategies: Vec<Sample>,
}

impl RunRecord {
    pub fn new(job: &WorkloadSpec, isolation: Isolation, samples: Vec<Sample>, timestamp: DateTime<Utc>) -> Self {
        Self {
            generated_at: timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            job: job.clone(),
            isolation,
            strategies: samples,
        }
    }

    pub fn capture(job: &WorkloadSpec, isolation: Isolation, samples: Vec<Sample>) -> Self {
        Self::new(job, isolation, samples, Utc::now())
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && !parent.exists()
    {
        fs::create_dir_all(parent).with_context(|| format!("create report directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).with_context(|| format!("write {}", path.display()))?;
    writer.flush().with_context(|| format!("flush {}", path.display()))
}
