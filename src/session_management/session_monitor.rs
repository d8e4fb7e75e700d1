use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, OnceCell};
use uuid::Uuid;

use super::collection::SessionCollection;
use super::session::Session;
use crate::configuration::gate::ConfigGate;
use crate::configuration::types::MonitorSettings;
use crate::error_handling::types::MonitorError;
use crate::network::public_address::PublicAddressResolver;
use crate::reporting::Reporter;
use crate::sinks::registry::SinkRegistry;
use crate::sinks::sink::Sink;

/// The structure dispatching finished sessions to the telemetry sinks.
///
/// Capability listeners insert sessions into the shared [`SessionCollection`].
/// Once a session's connection has ended, the monitor stamps the deployment
/// address on it, hands it to every live sink in configuration order and
/// removes it from the collection.
///
/// # Fields Overview
///
/// - `sessions`: the collection shared with capability listeners
/// - `gate`: configuration consulted at `start()` for the enabled sinks
/// - `registry`: constructors for every known sink
/// - `settings`: poll interval and enrichment settings
/// - `deployment_address`: resolved at most once, on the first `start()`
/// - `enabled`: cleared by `stop()`, re-armed when a run ends
/// - `running`: set for the duration of one `start()`
pub struct SessionMonitor {
    sessions: SessionCollection,
    gate: ConfigGate,
    registry: SinkRegistry,
    settings: MonitorSettings,
    deployment_address: OnceCell<Option<String>>,
    enabled: AtomicBool,
    running: AtomicBool,
    wakeup: Notify,
    reporter: Reporter,
}

impl SessionMonitor {
    pub fn new(
        sessions: SessionCollection,
        gate: ConfigGate,
        registry: SinkRegistry,
        settings: MonitorSettings,
        reporter: Reporter,
    ) -> Self {
        reporter.debug(format_args!("SessionMonitor created"));
        Self {
            sessions,
            gate,
            registry,
            settings,
            deployment_address: OnceCell::new(),
            enabled: AtomicBool::new(true),
            running: AtomicBool::new(false),
            wakeup: Notify::new(),
            reporter,
        }
    }

    pub fn sessions(&self) -> &SessionCollection {
        &self.sessions
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs the poll loop until [`stop`](Self::stop) is called.
    ///
    /// Calling `start` while a run is in progress returns immediately. A
    /// `stop` issued before the loop is entered ends that run before its
    /// first tick.
    ///
    /// Dropping the returned future mid-run leaves the monitor ready for the
    /// next `start`, but the sinks are dropped without their shutdown hook.
    ///
    /// # Errors
    /// Returns [`MonitorError::Collection`] when the session collection can no
    /// longer be trusted. Sinks are still shut down in that case.
    pub async fn start(&self) -> Result<(), MonitorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            self.reporter
                .warn(format_args!("SessionMonitor is already running"));
            return Ok(());
        }
        let mut guard = RunGuard {
            monitor: self,
            finished: false,
        };

        let enabled = self.gate.enabled_sinks(&self.reporter);
        let mut sinks = self.registry.instantiate(&enabled, &self.reporter);
        self.reporter.info(format_args!(
            "SessionMonitor started with {} sink(s): [{}]",
            sinks.len(),
            sinks.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
        ));
        let deployment_address = self.deployment_address().await;

        let result = loop {
            if !self.enabled.load(Ordering::SeqCst) {
                break Ok(());
            }
            if let Err(e) = self.tick(&mut sinks, deployment_address.as_deref()).await {
                self.reporter
                    .error(format_args!("SessionMonitor stopping: {}", e));
                break Err(e);
            }
            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval()) => {}
                _ = self.wakeup.notified() => {}
            }
        };

        self.shutdown_sinks(&mut sinks).await;
        guard.finished = true;
        drop(guard);
        self.reporter.info(format_args!("SessionMonitor stopped"));
        result
    }

    /// Asks the loop to exit. Takes effect at the top of the next tick, or
    /// before the first one when no run has reached its loop yet.
    pub fn stop(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.wakeup.notify_waiters();
    }

    /// One pass over the collection. Returns how many sessions were dispatched.
    pub async fn tick(
        &self,
        sinks: &mut [Box<dyn Sink>],
        deployment_address: Option<&str>,
    ) -> Result<usize, MonitorError> {
        let mut dispatched = 0;
        for id in self.sessions.snapshot_ids()? {
            let Some(session) = self.sessions.claim_ended(&id, deployment_address)? else {
                continue;
            };
            self.dispatch(sinks, &session).await;
            self.sessions.remove(&id)?;
            self.reporter.debug(format_args!(
                "Removed {} connection from {}. ({})",
                session.protocol, session.attacker_addr, id
            ));
            dispatched += 1;
        }
        Ok(dispatched)
    }

    async fn dispatch(&self, sinks: &mut [Box<dyn Sink>], session: &Session) {
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.record(session).await {
                self.report_sink_failure(sink.name(), session.id(), &e);
            }
        }
    }

    fn report_sink_failure(&self, sink: &str, id: Uuid, error: &dyn std::error::Error) {
        self.reporter.error(format_args!(
            "{} sink failed to record session {}: {}",
            sink, id, error
        ));
    }

    async fn shutdown_sinks(&self, sinks: &mut [Box<dyn Sink>]) {
        for sink in sinks.iter_mut() {
            match sink.shutdown().await {
                Ok(()) => self
                    .reporter
                    .debug(format_args!("{} sink stopped", sink.name())),
                Err(e) => self.reporter.error(format_args!(
                    "{} sink failed to shut down: {}",
                    sink.name(),
                    e
                )),
            }
        }
    }

    /// The configured static address, or the fetched one when enrichment is
    /// requested. Computed once per monitor.
    pub async fn deployment_address(&self) -> Option<String> {
        self.deployment_address
            .get_or_init(|| async {
                if let Some(address) = &self.settings.public_ip {
                    return Some(address.clone());
                }
                if !self.settings.fetch_public_ip {
                    return None;
                }
                match PublicAddressResolver::from_settings(
                    &self.settings,
                    self.reporter.scoped("hive::network"),
                ) {
                    Ok(resolver) => resolver.resolve().await,
                    Err(e) => {
                        self.reporter
                            .warn(format_args!("Could not fetch public ip: {}", e));
                        None
                    }
                }
            })
            .await
            .clone()
    }
}

// Ends one run: re-arms `enabled` and clears `running`, also when the
// `start()` future is dropped before completing.
struct RunGuard<'a> {
    monitor: &'a SessionMonitor,
    finished: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.monitor.reporter.warn(format_args!(
                "SessionMonitor cancelled, sinks dropped without shutdown"
            ));
        }
        self.monitor.enabled.store(true, Ordering::SeqCst);
        self.monitor.running.store(false, Ordering::SeqCst);
    }
}
