use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::{lookup_host, UdpSocket};

use super::parse_settings;
use super::sink::Sink;
use crate::configuration::types::SinkSettings;
use crate::error_handling::types::SinkError;
use crate::session_management::session::Session;

const SEVERITY_NOTICE: u8 = 5;
const MAX_FACILITY: u8 = 23;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SyslogSinkSettings {
    host: String,
    port: u16,
    facility: u8,
    hostname: String,
}

impl Default for SyslogSinkSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 514,
            facility: 1,
            hostname: "hive".to_string(),
        }
    }
}

/// Sends one RFC 3164 datagram per session to a syslog collector.
///
/// The UDP socket is bound on the first record, so building the sink never
/// touches the network.
pub struct SyslogSink {
    settings: SyslogSinkSettings,
    socket: Option<UdpSocket>,
}

impl SyslogSink {
    pub const NAME: &'static str = "syslog";

    pub fn from_settings(settings: &SinkSettings) -> Result<Self, SinkError> {
        let settings: SyslogSinkSettings = parse_settings(Self::NAME, settings)?;
        if settings.facility > MAX_FACILITY {
            return Err(SinkError::InvalidSettings(format!(
                "syslog: facility {} is out of range 0-{}",
                settings.facility, MAX_FACILITY
            )));
        }
        Ok(Self {
            settings,
            socket: None,
        })
    }

    async fn connect(&self) -> Result<UdpSocket, SinkError> {
        let target: SocketAddr = lookup_host((self.settings.host.as_str(), self.settings.port))
            .await?
            .next()
            .ok_or_else(|| {
                SinkError::ConnectionFailed(format!("{} did not resolve", self.settings.host))
            })?;
        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;
        Ok(socket)
    }

    fn format(&self, session: &Session) -> String {
        let priority = self.settings.facility * 8 + SEVERITY_NOTICE;
        let credentials: Vec<String> = session
            .login_attempts
            .iter()
            .map(|a| format!("{}/{}", a.username, a.password))
            .collect();
        format!(
            "<{}>{} {} hive: {} session {} from {} against {}:{}, login attempts: [{}]",
            priority,
            Utc::now().format("%b %e %H:%M:%S"),
            self.settings.hostname,
            session.protocol,
            session.id(),
            session.attacker_addr,
            session.honey_ip.as_deref().unwrap_or("-"),
            session.honey_port,
            credentials.join(", ")
        )
    }
}

#[async_trait]
impl Sink for SyslogSink {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn record(&mut self, session: &Session) -> Result<(), SinkError> {
        if self.socket.is_none() {
            self.socket = Some(self.connect().await?);
        }
        let message = self.format(session);
        if let Some(socket) = &self.socket {
            socket.send(message.as_bytes()).await?;
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), SinkError> {
        self.socket = None;
        Ok(())
    }
}
