use std::fmt;
use uuid::Uuid;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidSection(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidSection(e) => write!(f, "Invalid section: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum SessionError {
    DuplicateId(Uuid),
    CollectionPoisoned,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::DuplicateId(id) => write!(f, "Session {} is already tracked", id),
            SessionError::CollectionPoisoned => write!(f, "Session collection lock is poisoned"),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug)]
pub enum SinkError {
    IoError(std::io::Error),
    InvalidSettings(String),
    SerializationFailed(String),
    ConnectionFailed(String),
    /// For sinks that refuse a session they received intact, such as a
    /// remote collector answering with an error. The builtin sinks never
    /// return it.
    Rejected(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::IoError(e) => write!(f, "Sink IO error: {}", e),
            SinkError::InvalidSettings(e) => write!(f, "Invalid sink settings: {}", e),
            SinkError::SerializationFailed(e) => write!(f, "Session serialization failed: {}", e),
            SinkError::ConnectionFailed(e) => write!(f, "Sink connection failed: {}", e),
            SinkError::Rejected(e) => write!(f, "Sink rejected the session: {}", e),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::IoError(err)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::SerializationFailed(err.to_string())
    }
}

#[derive(Debug)]
pub enum ResolverError {
    ClientBuildFailed(String),
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverError::ClientBuildFailed(e) => write!(f, "HTTP client build failed: {}", e),
        }
    }
}

impl std::error::Error for ResolverError {}

#[derive(Debug)]
pub enum MonitorError {
    Collection(SessionError),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Collection(e) => write!(f, "Session collection error: {}", e),
        }
    }
}

impl std::error::Error for MonitorError {}

impl From<SessionError> for MonitorError {
    fn from(err: SessionError) -> Self {
        MonitorError::Collection(err)
    }
}

#[derive(Debug)]
pub enum ControllerError {
    MonitorError(MonitorError),
    SignalError(std::io::Error),
    TaskFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::MonitorError(e) => write!(f, "Monitor error: {}", e),
            ControllerError::SignalError(e) => write!(f, "Signal handling error: {}", e),
            ControllerError::TaskFailed(e) => write!(f, "Monitor task failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<MonitorError> for ControllerError {
    fn from(err: MonitorError) -> Self {
        ControllerError::MonitorError(err)
    }
}
