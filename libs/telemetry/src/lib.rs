//! Logging and metric helpers shared by payhook services.
//! Wraps `tracing-subscriber` setup and `metrics` counters behind a small API
//! so every service boots its observability the same way.

mod config;
mod context;
mod counters;
mod tracing_init;

pub use config::{LogFormat, TelemetryConfig};
pub use context::TelemetryLabels;
pub use counters::{record_counter, with_common_fields};
pub use tracing_init::init_telemetry;

/// Installs the shared subscriber for `service_name`, configured from the environment.
pub fn install(service_name: &str, service_version: &str) -> anyhow::Result<()> {
    init_telemetry(TelemetryConfig::from_env(service_name, service_version))
}
