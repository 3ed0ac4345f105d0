//! Logging and metric helpers for the mq-client connection core.
//!
//! Libraries only emit `tracing` events and `metrics` counters; binaries call [`install`] once at
//! startup to route them.

use anyhow::Result;

mod config;
mod counters;
mod tracing_init;

pub use config::TelemetryConfig;
pub use counters::{
    ACQUIRE_TOTAL, CLEANUP_FAILURES_TOTAL, PROVIDER_LOAD_TOTAL, record_acquire,
    record_cleanup_failure, record_provider_load,
};
pub use tracing_init::init_telemetry;

/// Installs the shared subscriber configured from `RUST_LOG` and `LOG_FORMAT`.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(service_name))
}
