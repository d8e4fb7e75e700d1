//! Injected logging handle.
//!
//! Components never call the global `log` macros directly. They receive a
//! [`Reporter`], which pairs a [`log::Log`] implementation with a target
//! string. In production the reporter forwards to whatever logger `main`
//! installed (`env_logger`); tests hand in a capturing logger and assert on
//! what was reported.

use log::{Level, Log, Metadata, Record};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Forwards to the process-wide logger installed through the `log` facade.
struct GlobalLogger;

impl Log for GlobalLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            log::logger().log(record);
        }
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

/// A cloneable logging handle scoped to one component.
#[derive(Clone)]
pub struct Reporter {
    logger: Arc<dyn Log>,
    target: Cow<'static, str>,
}

impl Reporter {
    /// Reporter backed by the global `log` logger.
    pub fn global(target: impl Into<Cow<'static, str>>) -> Self {
        Self {
            logger: Arc::new(GlobalLogger),
            target: target.into(),
        }
    }

    /// Reporter backed by an explicit logger.
    pub fn new(logger: Arc<dyn Log>, target: impl Into<Cow<'static, str>>) -> Self {
        Self {
            logger,
            target: target.into(),
        }
    }

    /// Same logger, different target. Used to hand sub-components their own scope.
    pub fn scoped(&self, target: impl Into<Cow<'static, str>>) -> Self {
        Self {
            logger: Arc::clone(&self.logger),
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder()
            .level(level)
            .target(self.target.as_ref())
            .build();
        if !self.logger.enabled(&metadata) {
            return;
        }
        self.logger
            .log(&Record::builder().metadata(metadata).args(args).build());
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter::global("hive")
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("target", &self.target)
            .finish()
    }
}
