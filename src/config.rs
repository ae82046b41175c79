//! TOML configuration for the envprobe server.
//!
//! Layered: compiled-in defaults, optionally overridden by a TOML file (named
//! by `--config` or the `ENVPROBE_CONFIG` environment variable), then by
//! command-line flags in `main`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::build_vars;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "ENVPROBE_CONFIG";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the server process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ListenConfig,
    #[serde(default)]
    pub build_vars: BuildVarsConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load from `path` if given, else from `ENVPROBE_CONFIG` if set, else defaults.
    ///
    /// A file that is named explicitly but cannot be loaded is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            if !env_path.is_empty() {
                return Self::load(Path::new(&env_path));
            }
        }

        debug!("no config file given, using compiled-in defaults");
        Ok(Self::default())
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    /// Body cap for `POST /upload`.
    pub upload_limit_bytes: usize,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            upload_limit_bytes: 10 << 20,
        }
    }
}

impl ListenConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// Build vars
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildVarsConfig {
    pub path: PathBuf,
    pub policy: BuildVarsPolicy,
}

impl Default for BuildVarsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(build_vars::DEFAULT_PATH),
            policy: BuildVarsPolicy::default(),
        }
    }
}

/// What to do when the build vars file cannot be loaded at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BuildVarsPolicy {
    /// Log the error and serve an empty table.
    #[default]
    Warn,
    /// Refuse to start.
    Fatal,
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub mongo_missing_env: MongoMissingEnvStatus,
}

/// Status code for `/mongo` when `CA_CERT` or `DATABASE_URL` is unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MongoMissingEnvStatus {
    /// 200 with an explanatory body.
    #[default]
    Lenient,
    /// 501, matching `/mysql` and `/postgres`.
    Strict,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
