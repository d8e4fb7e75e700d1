use std::future::Future;
use std::sync::Arc;

use crate::configuration::config::Config;
use crate::error_handling::types::*;
use crate::reporting::Reporter;
use crate::session_management::{SessionCollection, SessionMonitor};
use crate::sinks::SinkRegistry;

/// Owns the session collection and the monitor for one process.
pub struct Controller {
    pub config: Config,
    sessions: SessionCollection,
    monitor: Arc<SessionMonitor>,
    reporter: Reporter,
}

impl Controller {
    pub fn new(config: Config) -> Self {
        Self::with_registry(
            config,
            SinkRegistry::with_builtin_sinks(),
            Reporter::global("hive::controller"),
        )
    }

    /// The monitor logs through `reporter` under the `hive::monitor` target.
    pub fn with_registry(config: Config, registry: SinkRegistry, reporter: Reporter) -> Self {
        reporter.info(format_args!("Creating controller"));
        let sessions = SessionCollection::new();
        let monitor = Arc::new(SessionMonitor::new(
            sessions.clone(),
            config.gate.clone(),
            registry,
            config.monitor.clone(),
            reporter.scoped("hive::monitor"),
        ));
        Self {
            config,
            sessions,
            monitor,
            reporter,
        }
    }

    /// Handle for capability listeners to register their sessions.
    pub fn sessions(&self) -> SessionCollection {
        self.sessions.clone()
    }

    /// Runs until Ctrl-C.
    pub async fn run(&mut self) -> Result<(), ControllerError> {
        self.run_until(async {
            tokio::signal::ctrl_c()
                .await
                .map_err(ControllerError::SignalError)
        })
        .await
    }

    /// Runs the monitor until `shutdown` completes, then stops it and waits
    /// for the pending sink shutdowns.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), ControllerError>
    where
        F: Future<Output = Result<(), ControllerError>>,
    {
        let monitor = Arc::clone(&self.monitor);
        let mut task = tokio::spawn(async move { monitor.start().await });

        let signal = tokio::select! {
            joined = &mut task => {
                // the monitor only exits on its own after a fatal error
                return match joined {
                    Ok(result) => result.map_err(ControllerError::from),
                    Err(e) => Err(ControllerError::TaskFailed(e.to_string())),
                };
            }
            signal = shutdown => signal,
        };

        self.reporter
            .info(format_args!("Shutting down the session monitor"));
        self.monitor.stop();
        let joined = task.await;
        if let Err(e) = &signal {
            self.reporter
                .error(format_args!("Error while waiting for shutdown: {}", e));
        }
        match joined {
            Ok(result) => result.map_err(ControllerError::from)?,
            Err(e) => return Err(ControllerError::TaskFailed(e.to_string())),
        }
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_management::Session;
    use crate::sinks::Sink;
    use crate::error_handling::types::SinkError;
    use crate::reporting::testing::MemoryLogger;
    use log::Level;
    use std::time::Duration;
    use async_trait::async_trait;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    struct CollectingSink(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Sink for CollectingSink {
        fn name(&self) -> &str {
            "collect"
        }

        async fn record(&mut self, session: &Session) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(session.protocol.clone());
            Ok(())
        }

        async fn shutdown(&mut self) -> Result<(), SinkError> {
            self.0.lock().unwrap().push("shutdown".to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_until_dispatches_then_shuts_down() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&seen);
        let mut registry = SinkRegistry::new();
        registry.register("collect", move |_| {
            Ok(Box::new(CollectingSink(Arc::clone(&collected))) as Box<dyn Sink>)
        });
        let config =
            Config::from_str("[monitor]\npoll_interval_ms = 10\n\n[log_collect]\nenabled = true\n")
                .unwrap();
        let mut controller = Controller::with_registry(config, registry, Reporter::default());

        let sessions = controller.sessions();
        let session = Session::new("http", SocketAddr::from(([192, 0, 2, 50], 5050)), 80);
        session.connection().end();
        sessions.insert(session).unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let watcher = tokio::spawn(async move {
            while !sessions.is_empty().unwrap() {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            let _ = tx.send(());
        });

        controller
            .run_until(async {
                let _ = rx.await;
                Ok(())
            })
            .await
            .unwrap();
        watcher.await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["http".to_string(), "shutdown".to_string()]
        );
    }

    #[test]
    fn test_new_uses_builtin_sinks() {
        let controller = Controller::new(Config::default());
        assert!(controller.sessions().is_empty().unwrap());
        assert_eq!(controller.config.monitor.poll_interval_ms, 1000);
    }

    #[tokio::test]
    async fn test_run_until_returns_when_shutdown_is_already_ready() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&seen);
        let mut registry = SinkRegistry::new();
        registry.register("collect", move |_| {
            Ok(Box::new(CollectingSink(Arc::clone(&collected))) as Box<dyn Sink>)
        });
        let config = Config::from_str("[log_collect]\nenabled = true\n").unwrap();
        let logger = Arc::new(MemoryLogger::default());
        let mut controller =
            Controller::with_registry(config, registry, logger.reporter("hive::controller"));

        tokio::time::timeout(Duration::from_secs(2), controller.run_until(async { Ok(()) }))
            .await
            .expect("run_until did not return")
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["shutdown".to_string()]);
        let records = logger.records();
        assert!(records.iter().any(|(level, target, message)| *level == Level::Info
            && target == "hive::controller"
            && message == "Shutting down the session monitor"));
        assert!(records
            .iter()
            .any(|(_, target, message)| target == "hive::monitor"
                && message == "SessionMonitor stopped"));
    }
}
