//! Compare single process vs multiple processes for a cpu-bound workload.
//!
//! Typical result:
//!
//! ```text
//!   Sequential - run time: 9.24 seconds
//!   4 procs Parallel - run time: 2.59 seconds
//!   2 procs Parallel twice - run time: 4.76 seconds
//! ```

use procbench_cli::WorkloadKind;

fn main() -> anyhow::Result<()> {
    procbench_cli::run(WorkloadKind::Cpu)
}
