use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Connection state shared between a [`Session`] and the capability serving it.
///
/// The capability keeps a clone and calls [`ConnectionState::end`] once the
/// attacker disconnects; the monitor only ever reads it.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    connected: Arc<AtomicBool>,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn end(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// One credential pair offered by the attacker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginAttempt {
    pub timestamp: DateTime<Utc>,
    /// Authentication scheme, e.g. `plaintext` or `basic`.
    pub kind: String,
    pub username: String,
    pub password: String,
}

/// A decoy connection, as recorded by sinks.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    id: Uuid,
    pub protocol: String,
    pub attacker_addr: SocketAddr,
    pub honey_port: u16,
    /// Public address of the deployment, filled in by the monitor before dispatch.
    pub honey_ip: Option<String>,
    pub started_at: DateTime<Utc>,
    pub login_attempts: Vec<LoginAttempt>,
    #[serde(skip)]
    connection: ConnectionState,
}

impl Session {
    pub fn new(protocol: impl Into<String>, attacker_addr: SocketAddr, honey_port: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            protocol: protocol.into(),
            attacker_addr,
            honey_port,
            honey_ip: None,
            started_at: Utc::now(),
            login_attempts: Vec::new(),
            connection: ConnectionState::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Handle the capability keeps to report the end of the connection.
    pub fn connection(&self) -> ConnectionState {
        self.connection.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn add_login_attempt(
        &mut self,
        kind: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) {
        self.login_attempts.push(LoginAttempt {
            timestamp: Utc::now(),
            kind: kind.into(),
            username: username.into(),
            password: password.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn attacker() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 45)), 51234)
    }

    #[test]
    fn test_new_session() {
        let session = Session::new("http", attacker(), 80);

        assert_eq!(session.protocol, "http");
        assert_eq!(session.honey_port, 80);
        assert!(session.honey_ip.is_none());
        assert!(session.login_attempts.is_empty());
        assert!(session.is_connected());
        assert_ne!(session.id(), Session::new("http", attacker(), 80).id());
    }

    #[test]
    fn test_connection_state_is_shared_with_clones() {
        let session = Session::new("ssh", attacker(), 22);
        let snapshot = session.clone();
        let handle = session.connection();

        handle.end();

        assert!(!session.is_connected());
        assert!(!snapshot.is_connected());
    }

    #[test]
    fn test_serializes_without_connection_state() {
        let mut session = Session::new("http", attacker(), 8080);
        session.add_login_attempt("basic", "admin", "hunter2");

        let json = serde_json::to_value(&session).unwrap();

        assert_eq!(json["id"], session.id().to_string());
        assert_eq!(json["attacker_addr"], "203.0.113.45:51234");
        assert_eq!(json["honey_ip"], serde_json::Value::Null);
        assert_eq!(json["login_attempts"][0]["username"], "admin");
        assert!(json.get("connection").is_none());
    }
}
