//! Database connectivity probes.
//!
//! Each probe opens a brand-new connection, pings once and tears the
//! connection down again. There is no pooling, no retry and no timeout beyond
//! what the driver applies by default.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::env::Environment;

pub mod mongo;
pub mod mysql;
pub mod postgres;

pub use mongo::MongoProbe;
pub use mysql::{MysqlProbe, MysqlTarget};
pub use postgres::PostgresProbe;

/// Connection string for every probe.
pub const DATABASE_URL: &str = "DATABASE_URL";
/// PEM bundle used as the trust root for the Mongo probe.
pub const CA_CERT: &str = "CA_CERT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Mongo,
    Mysql,
    Postgres,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Mongo => write!(f, "mongo"),
            ProbeKind::Mysql => write!(f, "mysql"),
            ProbeKind::Postgres => write!(f, "postgres"),
        }
    }
}

impl ProbeKind {
    /// Build the probe for this kind from the current environment.
    ///
    /// Variables are read once, here; an empty value counts as missing.
    pub fn request(self, env: &dyn Environment) -> Result<Box<dyn Probe>, ProbeError> {
        let var = |name: &'static str| {
            env.get(name)
                .filter(|v| !v.is_empty())
                .ok_or(ProbeError::MissingEnv(name))
        };

        match self {
            ProbeKind::Mongo => {
                let ca_cert = var(CA_CERT)?;
                let url = var(DATABASE_URL)?;
                Ok(Box::new(MongoProbe::new(url, ca_cert)))
            }
            ProbeKind::Mysql => Ok(Box::new(MysqlProbe::new(var(DATABASE_URL)?))),
            ProbeKind::Postgres => Ok(Box::new(PostgresProbe::new(var(DATABASE_URL)?))),
        }
    }
}

/// Where a probe failed. Driver messages are carried verbatim.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0} is not set")]
    MissingEnv(&'static str),

    #[error("no valid certificates in CA_CERT")]
    InvalidCaCert,

    #[error("invalid DATABASE_URL: {0}")]
    InvalidUrl(String),

    #[error("client creation failed: {0}")]
    ClientCreation(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("ping failed: {0}")]
    Ping(String),
}

impl ProbeError {
    /// The underlying driver message, where there is one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ProbeError::ClientCreation(msg)
            | ProbeError::Connect(msg)
            | ProbeError::Ping(msg)
            | ProbeError::InvalidUrl(msg) => Some(msg.as_str()),
            ProbeError::MissingEnv(_) | ProbeError::InvalidCaCert => None,
        }
    }
}

/// A single-shot connect-and-ping against an external data store.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    /// Connect, ping once, disconnect.
    async fn connect(&self) -> Result<(), ProbeError>;
}

/// Outcome of one probe run, as reported by the CLI.
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub kind: ProbeKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: f64,
}

/// Build and run the probe for `kind` against `env`.
pub async fn run(kind: ProbeKind, env: &dyn Environment) -> ProbeReport {
    let start = std::time::Instant::now();
    let result = match kind.request(env) {
        Ok(probe) => probe.connect().await,
        Err(e) => Err(e),
    };

    ProbeReport {
        kind,
        success: result.is_ok(),
        error: result.err().map(|e| e.to_string()),
        duration_ms: start.elapsed().as_secs_f64() * 1000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvironment;

    #[test]
    fn test_mongo_checks_ca_cert_before_url() {
        let env = MapEnvironment::new();
        let err = ProbeKind::Mongo.request(&env).err().unwrap();
        assert!(matches!(err, ProbeError::MissingEnv(CA_CERT)));

        let env = MapEnvironment::new().with(CA_CERT, "pem");
        let err = ProbeKind::Mongo.request(&env).err().unwrap();
        assert!(matches!(err, ProbeError::MissingEnv(DATABASE_URL)));
    }

    #[test]
    fn test_empty_database_url_counts_as_missing() {
        let env = MapEnvironment::new().with(DATABASE_URL, "");
        for kind in [ProbeKind::Mysql, ProbeKind::Postgres] {
            let err = kind.request(&env).err().unwrap();
            assert!(matches!(err, ProbeError::MissingEnv(DATABASE_URL)));
        }
    }

    #[test]
    fn test_request_builds_matching_probe() {
        let env = MapEnvironment::new().with(DATABASE_URL, "postgres://localhost/db");
        let probe = ProbeKind::Postgres.request(&env).unwrap();
        assert_eq!(probe.kind(), ProbeKind::Postgres);
    }

    #[tokio::test]
    async fn test_run_reports_missing_env() {
        let report = run(ProbeKind::Mysql, &MapEnvironment::new()).await;

        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("DATABASE_URL is not set"));
    }
}
