//! Timing harness comparing sequential and multi-worker execution of
//! io-bound and cpu-bound workload units.
//!
//! The binaries in `procbench-cli` wire these pieces together; benches and
//! tests use them directly with small cycle counts.

pub mod config;
pub mod harness;
pub mod report;
pub mod spawn;
pub mod strategy;
pub mod timing;
pub mod workload;

#[cfg(test)]
mod config_test;
