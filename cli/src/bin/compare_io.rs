//! Compare single process vs multiple processes for an io-bound workload.
//!
//! Typical result:
//!
//! ```text
//!   Sequential - run time: 39.74 seconds
//!   4 procs Parallel - run time: 17.68 seconds
//!   2 procs Parallel twice - run time: 20.68 seconds
//! ```

use procbench_cli::WorkloadKind;

fn main() -> anyhow::Result<()> {
    procbench_cli::run(WorkloadKind::Io)
}
