use super::gate::ConfigGate;
use super::types::MonitorSettings;
use crate::error_handling::types::ConfigError;
use std::path::Path;

/// Name of the section holding [`MonitorSettings`].
pub const MONITOR_SECTION: &str = "monitor";

/// Application configuration loaded from a TOML file.
///
/// # Fields Overview
///
/// - `monitor`: poll loop and enrichment settings, read from `[monitor]`
/// - `gate`: the whole document, consulted by the monitor at startup to find
///   the enabled `log_<name>` sections
///
/// # Examples
///
/// ```
/// use hive::configuration::config::Config;
///
/// let config = Config::from_str(r#"
///     [monitor]
///     poll_interval_ms = 500
///
///     [log_syslog]
///     enabled = true
/// "#).unwrap();
/// assert_eq!(config.monitor.poll_interval_ms, 500);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub monitor: MonitorSettings,
    pub gate: ConfigGate,
}

impl Config {
    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    /// Returns [`ConfigError::IoError`] when the file cannot be read,
    /// [`ConfigError::TomlError`] when it is not valid TOML and
    /// [`ConfigError::InvalidSection`] when `[monitor]` has badly typed values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let gate = ConfigGate::from_str(content)?;
        let monitor = match gate.document().get(MONITOR_SECTION) {
            Some(value) => value.clone().try_into::<MonitorSettings>().map_err(|e| {
                ConfigError::InvalidSection(format!("[{}]: {}", MONITOR_SECTION, e))
            })?,
            None => MonitorSettings::default(),
        };
        Ok(Self { monitor, gate })
    }

    /// Applies command-line overrides on top of the file values.
    pub fn with_overrides(mut self, fetch_public_ip: bool, poll_interval_ms: Option<u64>) -> Self {
        if fetch_public_ip {
            self.monitor.fetch_public_ip = true;
        }
        if let Some(ms) = poll_interval_ms {
            self.monitor.poll_interval_ms = ms;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::Reporter;
    use std::io::Write;

    #[test]
    fn test_defaults_without_monitor_section() {
        let config = Config::from_str("[log_bus]\nenabled = true\n").unwrap();

        assert_eq!(config.monitor, MonitorSettings::default());
        assert_eq!(config.gate.enabled_sinks(&Reporter::default()).names(), vec!["bus"]);
    }

    #[test]
    fn test_monitor_section_overrides_defaults() {
        let config = Config::from_str(
            r#"
            [monitor]
            poll_interval_ms = 250
            fetch_public_ip = true
            public_ip_endpoint = "http://127.0.0.1:9/"
        "#,
        )
        .unwrap();

        assert_eq!(config.monitor.poll_interval_ms, 250);
        assert!(config.monitor.fetch_public_ip);
        assert_eq!(config.monitor.public_ip_endpoint, "http://127.0.0.1:9/");
        assert_eq!(config.monitor.read_timeout_ms, 5000);
    }

    #[test]
    fn test_badly_typed_monitor_section() {
        let err = Config::from_str("[monitor]\npoll_interval_ms = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSection(_)));
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_overrides(true, Some(20));
        assert!(config.monitor.fetch_public_ip);
        assert_eq!(config.monitor.poll_interval_ms, 20);

        let untouched = Config::default().with_overrides(false, None);
        assert_eq!(untouched.monitor, MonitorSettings::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[monitor]\npublic_ip = \"198.51.100.7\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.monitor.public_ip.as_deref(), Some("198.51.100.7"));
    }
}
