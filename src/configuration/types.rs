use serde::Deserialize;
use std::time::Duration;

/// Raw key/value settings of one `log_<name>` section, handed to the sink factory.
pub type SinkSettings = toml::Table;

pub const DEFAULT_PUBLIC_IP_ENDPOINT: &str = "https://api.ipify.org";

/// Settings of the `[monitor]` section.
///
/// Every field has a default, so the section can be omitted entirely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Delay between two ticks of the poll loop.
    pub poll_interval_ms: u64,
    /// Ask the external address-discovery endpoint for the deployment address.
    pub fetch_public_ip: bool,
    /// Static deployment address. Takes precedence over `fetch_public_ip`.
    pub public_ip: Option<String>,
    pub public_ip_endpoint: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            fetch_public_ip: false,
            public_ip: None,
            public_ip_endpoint: DEFAULT_PUBLIC_IP_ENDPOINT.to_string(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
        }
    }
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// A sink that configuration switched on.
#[derive(Debug, Clone, PartialEq)]
pub struct EnabledSink {
    /// Lower-cased `<name>` part of the section name.
    pub name: String,
    pub settings: SinkSettings,
}

/// Enabled sinks in configuration order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnabledSinkSet {
    sinks: Vec<EnabledSink>,
}

impl EnabledSinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `sink` unless a sink with the same name is already present.
    /// Returns whether it was added.
    pub fn insert(&mut self, sink: EnabledSink) -> bool {
        if self.contains(&sink.name) {
            return false;
        }
        self.sinks.push(sink);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sinks.iter().any(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnabledSink> {
        self.sinks.iter()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<'a> IntoIterator for &'a EnabledSinkSet {
    type Item = &'a EnabledSink;
    type IntoIter = std::slice::Iter<'a, EnabledSink>;

    fn into_iter(self) -> Self::IntoIter {
        self.sinks.iter()
    }
}
