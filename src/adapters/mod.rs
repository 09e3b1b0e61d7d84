//! Engine adapter modules and the adapter registry.

pub mod sqlite_adapter;

#[cfg(feature = "duckdb-bench")]
pub mod duckdb_adapter;

#[cfg(feature = "mysql-bench")]
pub mod mysql_adapter;

#[cfg(feature = "mongodb-bench")]
pub mod mongo_adapter;

#[cfg(feature = "cassandra-bench")]
pub mod cassandra_adapter;

use crate::config::EndpointConfig;
use crate::{Capabilities, EngineAdapter, HarnessError, HarnessResult};
use std::path::Path;

/// Engine names this build can construct, in registry order.
pub fn available() -> Vec<&'static str> {
    capability_matrix().into_iter().map(|(name, _)| name).collect()
}

/// Static capability metadata for every compiled-in engine.
pub fn capability_matrix() -> Vec<(&'static str, Capabilities)> {
    let mut engines = vec![("sqlite", sqlite_adapter::CAPABILITIES)];
    #[cfg(feature = "duckdb-bench")]
    engines.push(("duckdb", duckdb_adapter::CAPABILITIES));
    #[cfg(feature = "mysql-bench")]
    engines.push(("mysql", mysql_adapter::CAPABILITIES));
    #[cfg(feature = "mongodb-bench")]
    engines.push(("mongodb", mongo_adapter::CAPABILITIES));
    #[cfg(feature = "cassandra-bench")]
    engines.push(("cassandra", cassandra_adapter::CAPABILITIES));
    engines
}

/// Construct the adapter for `engine`, opening its backend session.
///
/// Embedded engines place their database file in `scratch` unless the
/// endpoint config names an explicit path.
pub fn open(
    engine: &str,
    endpoints: &EndpointConfig,
    scratch: &Path,
) -> HarnessResult<Box<dyn EngineAdapter>> {
    match engine {
        "sqlite" => {
            let path = endpoints
                .sqlite_path
                .clone()
                .unwrap_or_else(|| scratch.join("bench.sqlite3"));
            Ok(Box::new(sqlite_adapter::SqliteAdapter::open(&path)?))
        }
        #[cfg(feature = "duckdb-bench")]
        "duckdb" => {
            let path = endpoints
                .duckdb_path
                .clone()
                .unwrap_or_else(|| scratch.join("bench.duckdb"));
            Ok(Box::new(duckdb_adapter::DuckDbAdapter::open(&path)?))
        }
        #[cfg(feature = "mysql-bench")]
        "mysql" => Ok(Box::new(mysql_adapter::MysqlAdapter::open(
            &endpoints.mysql_url,
        )?)),
        #[cfg(feature = "mongodb-bench")]
        "mongodb" => Ok(Box::new(mongo_adapter::MongoAdapter::open(
            &endpoints.mongodb_uri,
        )?)),
        #[cfg(feature = "cassandra-bench")]
        "cassandra" => Ok(Box::new(cassandra_adapter::CassandraAdapter::open(
            &endpoints.cassandra_node,
        )?)),
        other => Err(HarnessError::Unsupported(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_is_always_registered() {
        assert!(available().contains(&"sqlite"));
    }

    #[test]
    fn unknown_engine_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        match open("oracle", &EndpointConfig::default(), dir.path()) {
            Err(HarnessError::Unsupported(name)) => assert_eq!(name, "oracle"),
            other => panic!("expected unsupported, got {:?}", other.map(|_| ())),
        }
    }
}
