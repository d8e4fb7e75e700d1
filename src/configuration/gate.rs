//! Decides which sinks are enabled.
//!
//! The configuration is a TOML document whose top-level tables are sections.
//! Sections named `<kind>_<name>` with `kind == "log"` and a true `enabled`
//! flag turn the sink `<name>` on. Anything else is ignored.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::types::{EnabledSink, EnabledSinkSet};
use crate::error_handling::types::ConfigError;
use crate::reporting::Reporter;

/// Section kind consulted for sink configuration.
pub const SINK_KIND: &str = "log";

static SECTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<kind>[A-Za-z0-9-]+)_(?P<name>[A-Za-z0-9-]+)$")
        .expect("section name pattern is a valid regex")
});

#[derive(Debug, Clone, Default)]
pub struct ConfigGate {
    document: toml::Table,
}

impl ConfigGate {
    pub fn from_table(document: toml::Table) -> Self {
        Self { document }
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let document = toml::from_str::<toml::Table>(content)
            .map_err(|e| ConfigError::TomlError(e.to_string()))?;
        Ok(Self::from_table(document))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn document(&self) -> &toml::Table {
        &self.document
    }

    /// Collects the enabled sinks in document order.
    ///
    /// Malformed or incomplete sections are skipped and only reported at debug level.
    pub fn enabled_sinks(&self, reporter: &Reporter) -> EnabledSinkSet {
        let mut enabled = EnabledSinkSet::new();

        for (section, value) in &self.document {
            let Some((kind, name)) = split_section_name(section) else {
                reporter.debug(format_args!(
                    "Skipping section [{}]: not a <kind>_<name> section",
                    section
                ));
                continue;
            };
            if kind != SINK_KIND {
                continue;
            }
            let Some(settings) = value.as_table() else {
                reporter.debug(format_args!("Skipping [{}]: not a table", section));
                continue;
            };
            match settings.get("enabled").map(parse_flag) {
                Some(Some(true)) => {
                    let added = enabled.insert(EnabledSink {
                        name: name.to_ascii_lowercase(),
                        settings: settings.clone(),
                    });
                    if !added {
                        reporter.debug(format_args!(
                            "Sink {} listed more than once, keeping the first section",
                            name
                        ));
                    }
                }
                Some(Some(false)) => {}
                Some(None) => reporter.debug(format_args!(
                    "Skipping [{}]: `enabled` is not a boolean",
                    section
                )),
                None => reporter.debug(format_args!(
                    "Skipping [{}]: no `enabled` flag",
                    section
                )),
            }
        }

        enabled
    }
}

/// Splits `log_bus` into `("log", "bus")`. Names with zero or several
/// underscores do not decompose.
pub fn split_section_name(section: &str) -> Option<(&str, &str)> {
    let captures = SECTION_NAME.captures(section)?;
    let kind = captures.name("kind")?.as_str();
    let name = captures.name("name")?.as_str();
    Some((kind, name))
}

/// Accepts TOML booleans and the usual INI spellings of a boolean.
fn parse_flag(value: &toml::Value) -> Option<bool> {
    match value {
        toml::Value::Boolean(b) => Some(*b),
        toml::Value::Integer(1) => Some(true),
        toml::Value::Integer(0) => Some(false),
        toml::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Some(true),
            "0" | "no" | "false" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
