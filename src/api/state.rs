use std::path::PathBuf;
use std::sync::Arc;

use crate::build_vars::BuildVariableTable;
use crate::config::{MongoMissingEnvStatus, ServerConfig};
use crate::env::Environment;

/// Read-only state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub build_vars: Arc<BuildVariableTable>,
    /// Source file of `build_vars`; `/` dumps it verbatim on every request.
    pub build_vars_path: Arc<PathBuf>,
    pub env: Arc<dyn Environment>,
    pub mongo_missing_env: MongoMissingEnvStatus,
    pub upload_limit_bytes: usize,
}

impl AppState {
    pub fn new(
        config: &ServerConfig,
        build_vars: BuildVariableTable,
        env: Arc<dyn Environment>,
    ) -> Self {
        Self {
            build_vars: Arc::new(build_vars),
            build_vars_path: Arc::new(config.build_vars.path.clone()),
            env,
            mongo_missing_env: config.probes.mongo_missing_env,
            upload_limit_bytes: config.server.upload_limit_bytes,
        }
    }
}
