//! Static registration table mapping sink names to constructors.

use super::bus_sink::BusSink;
use super::file_sink::FileSink;
use super::sink::Sink;
use super::syslog_sink::SyslogSink;
use crate::configuration::types::{EnabledSinkSet, SinkSettings};
use crate::error_handling::types::SinkError;
use crate::reporting::Reporter;

pub type SinkFactory =
    Box<dyn Fn(&SinkSettings) -> Result<Box<dyn Sink>, SinkError> + Send + Sync>;

/// Known sink implementations, keyed by lower-cased name.
#[derive(Default)]
pub struct SinkRegistry {
    factories: Vec<(String, SinkFactory)>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the sinks shipped in this crate: `file`, `syslog` and `bus`.
    pub fn with_builtin_sinks() -> Self {
        let mut registry = Self::new();
        registry
            .register(FileSink::NAME, |settings| {
                Ok(Box::new(FileSink::from_settings(settings)?) as Box<dyn Sink>)
            })
            .register(SyslogSink::NAME, |settings| {
                Ok(Box::new(SyslogSink::from_settings(settings)?) as Box<dyn Sink>)
            })
            .register(BusSink::NAME, |settings| {
                Ok(Box::new(BusSink::from_settings(settings)?) as Box<dyn Sink>)
            });
        registry
    }

    /// Registers `factory` under `name`, replacing any factory with the same
    /// canonical name.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&SinkSettings) -> Result<Box<dyn Sink>, SinkError> + Send + Sync + 'static,
    {
        let name = name.to_ascii_lowercase();
        let factory: SinkFactory = Box::new(factory);
        match self.factories.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((name, factory)),
        }
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factory(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn factory(&self, name: &str) -> Option<&SinkFactory> {
        self.factories
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, f)| f)
    }

    /// Builds one sink per enabled name, in the order of `enabled`.
    ///
    /// Unknown names and failing constructors are reported and skipped.
    pub fn instantiate(&self, enabled: &EnabledSinkSet, reporter: &Reporter) -> Vec<Box<dyn Sink>> {
        let mut sinks = Vec::with_capacity(enabled.len());
        for sink in enabled {
            let Some(factory) = self.factory(&sink.name) else {
                reporter.warn(format_args!(
                    "Sink {} is enabled but no implementation is registered, skipping",
                    sink.name
                ));
                continue;
            };
            match factory(&sink.settings) {
                Ok(instance) => {
                    reporter.debug(format_args!("{} sink started", sink.name));
                    sinks.push(instance);
                }
                Err(e) => reporter.error(format_args!(
                    "Unable to start {} sink: {}, skipping",
                    sink.name, e
                )),
            }
        }
        sinks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::gate::ConfigGate;
    use crate::configuration::types::EnabledSink;
    use crate::reporting::testing::MemoryLogger;
    use crate::session_management::session::Session;
    use async_trait::async_trait;
    use log::Level;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NamedSink(String);

    #[async_trait]
    impl Sink for NamedSink {
        fn name(&self) -> &str {
            &self.0
        }

        async fn record(&mut self, _session: &Session) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn named(
        name: &'static str,
    ) -> impl Fn(&SinkSettings) -> Result<Box<dyn Sink>, SinkError> + Send + Sync + 'static {
        move |_| Ok(Box::new(NamedSink(name.to_string())) as Box<dyn Sink>)
    }

    fn enabled(names: &[&str]) -> EnabledSinkSet {
        let mut set = EnabledSinkSet::new();
        for name in names {
            set.insert(EnabledSink {
                name: name.to_string(),
                settings: SinkSettings::new(),
            });
        }
        set
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut registry = SinkRegistry::new();
        registry.register("HpFeed", named("hpfeed"));

        assert!(registry.is_registered("hpfeed"));
        assert!(registry.is_registered("HPFEED"));
        assert_eq!(registry.names(), vec!["hpfeed"]);
    }

    #[test]
    fn test_register_same_name_replaces() {
        let mut registry = SinkRegistry::new();
        registry.register("x", named("first")).register("X", named("second"));

        let sinks = registry.instantiate(&enabled(&["x"]), &Reporter::default());

        assert_eq!(registry.names().len(), 1);
        assert_eq!(sinks[0].name(), "second");
    }

    #[test]
    fn test_instantiates_in_enabled_order() {
        let mut registry = SinkRegistry::new();
        registry.register("x", named("x")).register("y", named("y"));

        let sinks = registry.instantiate(&enabled(&["y", "x"]), &Reporter::default());
        let names: Vec<&str> = sinks.iter().map(|s| s.name()).collect();

        assert_eq!(names, vec!["y", "x"]);
    }

    #[test]
    fn test_unknown_sink_is_warned_and_skipped() {
        let logger = Arc::new(MemoryLogger::default());
        let mut registry = SinkRegistry::new();
        registry.register("x", named("x"));

        let sinks = registry.instantiate(&enabled(&["x", "ghost"]), &logger.reporter("hive::sinks"));

        assert_eq!(sinks.len(), 1);
        let warnings = logger.messages_at(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ghost"));
    }

    #[test]
    fn test_failing_factory_is_skipped() {
        let logger = Arc::new(MemoryLogger::default());
        let mut registry = SinkRegistry::new();
        registry
            .register("broken", |_| Err(SinkError::InvalidSettings("no port".to_string())))
            .register("x", named("x"));

        let sinks = registry.instantiate(&enabled(&["broken", "x"]), &logger.reporter("hive::sinks"));

        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].name(), "x");
        assert!(logger.messages_at(Level::Error)[0].contains("no port"));
    }

    #[test]
    fn test_each_enabled_sink_built_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let mut registry = SinkRegistry::new();
        registry.register("x", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NamedSink("x".to_string())) as Box<dyn Sink>)
        });

        registry.instantiate(&enabled(&["x"]), &Reporter::default());

        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_builtin_registry_with_mixed_configuration() {
        let gate = ConfigGate::from_str(
            r#"
            [log_bus]
            enabled = true
            host = "127.0.0.1"
            port = 10000

            [log_syslog]
            enabled = false

            [log_unknown]
            enabled = true
        "#,
        )
        .unwrap();
        let logger = Arc::new(MemoryLogger::default());
        let reporter = logger.reporter("hive::sinks");

        let sinks = SinkRegistry::with_builtin_sinks()
            .instantiate(&gate.enabled_sinks(&reporter), &reporter);

        let names: Vec<&str> = sinks.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["bus"]);
        assert!(logger.messages_at(Level::Warn)[0].contains("unknown"));
    }
}
