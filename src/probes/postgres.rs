//! PostgreSQL connectivity probe.
//!
//! The connection string is used as given: either a `postgres://` URL or the
//! libpq keyword/value form (`host=db user=app dbname=orders`).

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection;
use tracing::debug;

use super::{Probe, ProbeError, ProbeKind};

pub struct PostgresProbe {
    url: String,
}

impl PostgresProbe {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Build connect options from a URL or a keyword/value string.
///
/// Keyword/value values cannot contain whitespace; quoting is not supported.
pub fn connect_options(raw: &str) -> Result<PgConnectOptions, ProbeError> {
    let config_error = |msg: String| ProbeError::Connect(format!("error with configuration: {msg}"));

    if raw.contains("://") {
        return PgConnectOptions::from_str(raw).map_err(|e| ProbeError::Connect(e.to_string()));
    }

    let mut options = PgConnectOptions::new();
    let mut pairs = 0;

    for pair in raw.split_whitespace() {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| config_error(format!("missing \"=\" after {pair:?}")))?;

        options = match key {
            "host" => options.host(value),
            "port" => {
                let port = value
                    .parse()
                    .map_err(|_| config_error(format!("invalid port {value:?}")))?;
                options.port(port)
            }
            "user" => options.username(value),
            "password" => options.password(value),
            "dbname" => options.database(value),
            "sslmode" => {
                let mode = PgSslMode::from_str(value)
                    .map_err(|e| config_error(e.to_string()))?;
                options.ssl_mode(mode)
            }
            "application_name" => options.application_name(value),
            other => {
                debug!(key = other, "ignoring unsupported Postgres connection parameter");
                options
            }
        };
        pairs += 1;
    }

    if pairs == 0 {
        return Err(config_error("empty connection string".to_string()));
    }
    Ok(options)
}

#[async_trait::async_trait]
impl Probe for PostgresProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Postgres
    }

    async fn connect(&self) -> Result<(), ProbeError> {
        let options = connect_options(&self.url)?;

        let mut conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        let pinged = conn
            .ping()
            .await
            .map_err(|e| ProbeError::Ping(e.to_string()));

        if let Err(e) = conn.close().await {
            debug!(error = %e, "Postgres close failed");
        }

        pinged
    }
}
