//! Telemetry sinks
//!
//! Components:
//! - `sink`: the [`Sink`] trait every backend implements.
//! - `registry`: the static name → constructor table used at startup.
//! - `file_sink`: JSON-lines file writer.
//! - `syslog_sink`: RFC 3164 datagrams to a syslog collector.
//! - `bus_sink`: newline-delimited JSON publisher for an event bus.

use serde::de::DeserializeOwned;

use crate::configuration::types::SinkSettings;
use crate::error_handling::types::SinkError;

pub mod bus_sink;
pub mod file_sink;
pub mod registry;
pub mod sink;
pub mod syslog_sink;

pub use bus_sink::BusSink;
pub use file_sink::FileSink;
pub use registry::{SinkFactory, SinkRegistry};
pub use sink::Sink;
pub use syslog_sink::SyslogSink;

/// Deserializes a sink's section into its typed settings. Unknown keys,
/// such as `enabled`, are ignored.
pub(crate) fn parse_settings<T: DeserializeOwned>(
    sink: &str,
    settings: &SinkSettings,
) -> Result<T, SinkError> {
    toml::Value::Table(settings.clone())
        .try_into::<T>()
        .map_err(|e| SinkError::InvalidSettings(format!("{}: {}", sink, e)))
}
