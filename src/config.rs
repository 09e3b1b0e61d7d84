//! Endpoint configuration for the engine adapters.
//!
//! Each adapter consumes a connection endpoint (URL, node address, or file
//! path) from here; the harness core does not know transport details beyond
//! "one live session per run". Loaded from a JSON file, with sensible
//! localhost defaults when no file is given.

use crate::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// SQLite database file. Defaults to a scratch directory owned by the
    /// current run.
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,

    /// DuckDB database file. Defaults to a scratch directory owned by the
    /// current run.
    #[serde(default)]
    pub duckdb_path: Option<PathBuf>,

    #[serde(default = "default_mysql_url")]
    pub mysql_url: String,

    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,

    #[serde(default = "default_cassandra_node")]
    pub cassandra_node: String,
}

fn default_mysql_url() -> String {
    "mysql://root@localhost:3306/energytest".to_string()
}

fn default_mongodb_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_cassandra_node() -> String {
    "127.0.0.1:9042".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            sqlite_path: None,
            duckdb_path: None,
            mysql_url: default_mysql_url(),
            mongodb_uri: default_mongodb_uri(),
            cassandra_node: default_cassandra_node(),
        }
    }
}

impl EndpointConfig {
    /// Load endpoints from a JSON file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| HarnessError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let cfg = EndpointConfig::default();
        assert!(cfg.mysql_url.contains("localhost"));
        assert!(cfg.mongodb_uri.starts_with("mongodb://"));
        assert!(cfg.sqlite_path.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("endpoints.json");
        fs::write(&path, r#"{"mysql_url": "mysql://bench@db:3306/bench"}"#).unwrap();

        let cfg = EndpointConfig::from_file(&path).unwrap();
        assert_eq!(cfg.mysql_url, "mysql://bench@db:3306/bench");
        assert_eq!(cfg.cassandra_node, "127.0.0.1:9042");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("endpoints.json");
        fs::write(&path, "not json").unwrap();

        match EndpointConfig::from_file(&path) {
            Err(HarnessError::Config(_)) => {}
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }
}
