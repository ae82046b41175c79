//! envprobe -- diagnostic HTTP server for introspecting a running container.
//!
//! Reports hostname, runtime and build-time environment variables, and
//! smoke-tests connectivity to MongoDB, MySQL and PostgreSQL.
//!
//! No endpoint is authenticated and `/` dumps the whole environment,
//! secrets included. Do not expose it beyond a trusted network.

pub mod api;
pub mod build_vars;
pub mod config;
pub mod env;
pub mod probes;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::build_vars::BuildVariableTable;
use crate::config::{BuildVarsPolicy, ServerConfig};
use crate::env::OsEnvironment;

/// Load the build vars table, honouring the configured failure policy.
pub fn load_build_vars(config: &ServerConfig) -> Result<BuildVariableTable> {
    let path = &config.build_vars.path;

    match BuildVariableTable::load(path) {
        Ok(table) => Ok(table),
        Err(e) => match config.build_vars.policy {
            BuildVarsPolicy::Warn => {
                tracing::warn!(error = %e, "continuing with empty build vars table");
                Ok(BuildVariableTable::empty())
            }
            BuildVarsPolicy::Fatal => Err(e).context("build vars are required at startup"),
        },
    }
}

/// Start the diagnostic server and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> Result<()> {
    // 1. Build-time variables
    let build_vars = load_build_vars(&config)?;
    tracing::info!(count = build_vars.len(), "build vars loaded");

    // 2. Router
    let state = api::state::AppState::new(&config, build_vars, Arc::new(OsEnvironment));
    let app = api::router(state);

    // 3. Listener
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("==> Server listening at {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_build_vars_warn_policy_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.build_vars.path = dir.path().join("build-time-envs");

        let table = load_build_vars(&config).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_build_vars_fatal_policy_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.build_vars.path = dir.path().join("build-time-envs");
        config.build_vars.policy = BuildVarsPolicy::Fatal;

        assert!(load_build_vars(&config).is_err());
    }
}
