use async_trait::async_trait;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::parse_settings;
use super::sink::Sink;
use crate::configuration::types::SinkSettings;
use crate::error_handling::types::SinkError;
use crate::session_management::session::Session;

#[derive(Debug, Deserialize)]
struct FileSinkSettings {
    path: PathBuf,
}

/// Appends one JSON document per session to a file.
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    pub const NAME: &'static str = "file";

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn from_settings(settings: &SinkSettings) -> Result<Self, SinkError> {
        let settings: FileSinkSettings = parse_settings(Self::NAME, settings)?;
        Self::open(settings.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn record(&mut self, session: &Session) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(session)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), SinkError> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    #[tokio::test]
    async fn test_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sessions.json");
        let mut settings = SinkSettings::new();
        settings.insert("enabled".to_string(), toml::Value::Boolean(true));
        settings.insert(
            "path".to_string(),
            toml::Value::String(path.to_string_lossy().into_owned()),
        );
        let mut sink = FileSink::from_settings(&settings).unwrap();

        let first = Session::new("http", SocketAddr::from(([192, 0, 2, 1], 1111)), 80);
        let second = Session::new("ssh", SocketAddr::from(([192, 0, 2, 2], 2222)), 22);
        sink.record(&first).await.unwrap();
        sink.record(&second).await.unwrap();
        sink.shutdown().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], first.id().to_string());
        assert_eq!(lines[1]["protocol"], "ssh");
    }

    #[test]
    fn test_missing_path_is_invalid() {
        let err = FileSink::from_settings(&SinkSettings::new()).err().unwrap();
        assert!(matches!(err, SinkError::InvalidSettings(_)));
    }
}
