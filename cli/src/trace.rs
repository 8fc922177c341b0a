//! Stderr diagnostics, off unless `PROCBENCH_TRACE` asks for them.
//!
//! `PROCBENCH_TRACE` is either a switch (`1`/`true`/`on`, or `0`/`false`/`off`)
//! or a filter directive. The filter in effect is, in order: the directive
//! given in `PROCBENCH_TRACE`, then `RUST_LOG`, then [`DEFAULT_TRACE_FILTER`].
//! Stdout is never written to, so the timing lines stay clean.

use anyhow::{Context, Result};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub(crate) const TRACE_ENV: &str = "PROCBENCH_TRACE";
const DEFAULT_TRACE_FILTER: &str = "procbench_core=info,procbench_cli=info";

static SUBSCRIBER: Once = Once::new();

/// What the `PROCBENCH_TRACE` value asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TraceRequest {
    Off,
    /// Switched on without a directive of its own.
    On,
    Directive(String),
}

impl TraceRequest {
    pub(crate) fn from_env_value(raw: Option<&str>) -> Self {
        let value = match raw.map(str::trim) {
            None | Some("") => return TraceRequest::Off,
            Some(value) => value,
        };
        match value.to_ascii_lowercase().as_str() {
            "0" | "false" | "off" => TraceRequest::Off,
            "1" | "true" | "on" => TraceRequest::On,
            _ => TraceRequest::Directive(value.to_string()),
        }
    }
}

/// Pick the filter for an enabled request. `None` when tracing is off.
/// A directive that does not parse is an error naming where it came from.
pub(crate) fn resolve_filter(request: &TraceRequest, rust_log: Option<&str>) -> Result<Option<EnvFilter>> {
    let (source, directive) = match request {
        TraceRequest::Off => return Ok(None),
        TraceRequest::Directive(directive) => (TRACE_ENV, directive.as_str()),
        TraceRequest::On => match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
            Some(directive) => ("RUST_LOG", directive),
            None => ("default filter", DEFAULT_TRACE_FILTER),
        },
    };
    let filter = EnvFilter::try_new(directive).with_context(|| format!("invalid {} directive '{}'", source, directive))?;
    Ok(Some(filter))
}

/// Install the stderr subscriber once per process. Workers inherit the
/// environment, so they log with the same filter as the harness.
pub fn maybe_init_tracing() -> Result<()> {
    let raw = std::env::var(TRACE_ENV).ok();
    let request = TraceRequest::from_env_value(raw.as_deref());
    let rust_log = std::env::var("RUST_LOG").ok();

    if let Some(filter) = resolve_filter(&request, rust_log.as_deref())? {
        SUBSCRIBER.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .try_init();
        });
    }
    Ok(())
}
