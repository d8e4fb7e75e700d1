use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::parse_settings;
use super::sink::Sink;
use crate::configuration::types::SinkSettings;
use crate::error_handling::types::SinkError;
use crate::session_management::session::Session;

#[derive(Debug, Clone, Deserialize)]
struct BusSinkSettings {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_channel")]
    channel: String,
    #[serde(default = "default_ident")]
    ident: String,
    #[serde(default = "default_connect_timeout_ms")]
    connect_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    10000
}

fn default_channel() -> String {
    "hive.events".to_string()
}

fn default_ident() -> String {
    "hive".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

/// Frame published for each session: one JSON object per line.
#[derive(Serialize)]
struct Envelope<'a> {
    ident: &'a str,
    channel: &'a str,
    payload: &'a Session,
}

/// Publishes sessions to an event-bus broker over TCP.
///
/// The connection is opened on the first record. A failed write drops it and
/// the next record reconnects.
pub struct BusSink {
    settings: BusSinkSettings,
    stream: Option<TcpStream>,
}

impl BusSink {
    pub const NAME: &'static str = "bus";

    pub fn from_settings(settings: &SinkSettings) -> Result<Self, SinkError> {
        let settings: BusSinkSettings = parse_settings(Self::NAME, settings)?;
        Ok(Self {
            settings,
            stream: None,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn connect(&self) -> Result<TcpStream, SinkError> {
        let address = (self.settings.host.as_str(), self.settings.port);
        let timeout = Duration::from_millis(self.settings.connect_timeout_ms);
        match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(SinkError::ConnectionFailed(format!(
                "{}:{}: {}",
                self.settings.host, self.settings.port, e
            ))),
            Err(_) => Err(SinkError::ConnectionFailed(format!(
                "{}:{}: timed out after {:?}",
                self.settings.host, self.settings.port, timeout
            ))),
        }
    }
}

#[async_trait]
impl Sink for BusSink {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn record(&mut self, session: &Session) -> Result<(), SinkError> {
        let mut frame = serde_json::to_vec(&Envelope {
            ident: &self.settings.ident,
            channel: &self.settings.channel,
            payload: session,
        })?;
        frame.push(b'\n');

        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };
        stream.write_all(&frame).await?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), SinkError> {
        if let Some(mut stream) = self.stream.take() {
            stream.flush().await?;
            stream.shutdown().await?;
        }
        Ok(())
    }
}
