//! Run configuration.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock comparison: 1000 reads of 262140 bytes from `/dev/urandom`, or one
//! million arithmetic cycles, run in worker processes.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::workload::{DEFAULT_CPU_CYCLES, DEFAULT_IO_CYCLES, DEFAULT_READ_SIZE, DEFAULT_SOURCE, MAX_READ_SIZE, WorkloadKind,
    WorkloadSpec};

/// How concurrent workers are isolated from the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Isolation {
    #[default]
    Process,
    Thread,
}

impl Isolation {
    pub fn as_str(self) -> &'static str {
        match self {
            Isolation::Process => "process",
            Isolation::Thread => "thread",
        }
    }
}

impl fmt::Display for Isolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoSettings {
    pub cycles: u64,
    pub read_size: usize,
    pub source: PathBuf,
}

impl Default for IoSettings {
    fn default() -> Self {
        Self {
            cycles: DEFAULT_IO_CYCLES,
            read_size: DEFAULT_READ_SIZE,
            source: PathBuf::from(DEFAULT_SOURCE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuSettings {
    pub cycles: u64,
}

impl Default for CpuSettings {
    fn default() -> Self {
        Self {
            cycles: DEFAULT_CPU_CYCLES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub isolation: Isolation,
    pub io: IoSettings,
    pub cpu: CpuSettings,
}

/// Command-line values layered over a loaded [`BenchConfig`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cycles: Option<u64>,
    pub read_size: Option<usize>,
    pub source: Option<PathBuf>,
    pub isolation: Option<Isolation>,
}

impl BenchConfig {
    /// Load a config file; `.yaml`/`.yml` is parsed as YAML, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        let config = if is_yaml {
            Self::from_yaml_str(&data)
        } else {
            Self::from_toml_str(&data)
        };
        config.with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_toml_str(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn from_yaml_str(data: &str) -> Result<Self> {
        // serde_yaml reads an empty document as null, not an empty map
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    /// Apply overrides for the workload being run. `read_size` and `source`
    /// only mean something for the io workload.
    pub fn apply(&mut self, kind: WorkloadKind, overrides: &Overrides) -> Result<()> {
        if kind == WorkloadKind::Cpu && (overrides.read_size.is_some() || overrides.source.is_some()) {
            bail!("--read-size and --source only apply to the io workload");
        }
        if let Some(isolation) = overrides.isolation {
            self.isolation = isolation;
        }
        match kind {
            WorkloadKind::Io => {
                if let Some(cycles) = overrides.cycles {
                    self.io.cycles = cycles;
                }
                if let Some(read_size) = overrides.read_size {
                    self.io.read_size = read_size;
                }
                if let Some(source) = &overrides.source {
                    self.io.source = source.clone();
                }
            }
            WorkloadKind::Cpu => {
                if let Some(cycles) = overrides.cycles {
                    self.cpu.cycles = cycles;
                }
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.io.read_size == 0 {
            bail!("io.read_size must be greater than zero");
        }
        if self.io.read_size > MAX_READ_SIZE {
            bail!("io.read_size must be at most {} bytes, got {}", MAX_READ_SIZE, self.io.read_size);
        }
        if self.io.source.as_os_str().is_empty() {
            bail!("io.source must not be empty");
        }
        Ok(())
    }

    pub fn workload(&self, kind: WorkloadKind) -> WorkloadSpec {
        match kind {
            WorkloadKind::Io => WorkloadSpec::Io {
                cycles: self.io.cycles,
                read_size: self.io.read_size,
                source: self.io.source.clone(),
            },
            WorkloadKind::Cpu => WorkloadSpec::Cpu {
                cycles: self.cpu.cycles,
            },
        }
    }
}
