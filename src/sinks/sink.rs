//! Sink Trait
//!
//! A sink receives every completed session and records it to some backend.
//! Sinks own their delivery guarantees; the monitor only reports failures.

use async_trait::async_trait;

use crate::error_handling::types::SinkError;
use crate::session_management::session::Session;

#[async_trait]
pub trait Sink: Send {
    /// Canonical name, used in logs.
    fn name(&self) -> &str;

    /// Records one completed session.
    async fn record(&mut self, session: &Session) -> Result<(), SinkError>;

    /// Called once when the monitor stops. Sinks without resources to
    /// release keep the default.
    async fn shutdown(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
