use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use envprobe::config::{
    BuildVarsPolicy, LogFormat, LoggingConfig, MongoMissingEnvStatus, ServerConfig,
};
use envprobe::probes::ProbeKind;

#[derive(Parser)]
#[command(
    name = "envprobe",
    about = "Diagnostic HTTP server for introspecting a running container",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the diagnostic HTTP server
    Serve {
        /// TOML config file
        #[arg(long, env = "ENVPROBE_CONFIG")]
        config: Option<PathBuf>,

        /// Listen host
        #[arg(long)]
        host: Option<String>,

        /// Listen port
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Build-time variables file
        #[arg(long)]
        build_vars: Option<PathBuf>,

        /// What to do when the build-time variables file cannot be read
        #[arg(long, value_enum)]
        build_vars_policy: Option<BuildVarsPolicy>,

        /// Status code policy for /mongo when CA_CERT or DATABASE_URL is unset
        #[arg(long, value_enum)]
        mongo_missing_env: Option<MongoMissingEnvStatus>,

        /// Log output format
        #[arg(long, value_enum)]
        log_format: Option<LogFormat>,
    },

    /// Print the parsed build-time variables table
    BuildVars {
        /// Build-time variables file
        #[arg(long, default_value = envprobe::build_vars::DEFAULT_PATH)]
        path: PathBuf,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Run one database probe against the current environment
    Probe {
        /// Probe to run
        #[arg(value_enum)]
        kind: ProbeKind,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            build_vars,
            build_vars_policy,
            mongo_missing_env,
            log_format,
        } => {
            let mut cfg = ServerConfig::load_or_default(config.as_deref())?;
            if let Some(host) = host {
                cfg.server.host = host;
            }
            if let Some(port) = port {
                cfg.server.port = port;
            }
            if let Some(path) = build_vars {
                cfg.build_vars.path = path;
            }
            if let Some(policy) = build_vars_policy {
                cfg.build_vars.policy = policy;
            }
            if let Some(policy) = mongo_missing_env {
                cfg.probes.mongo_missing_env = policy;
            }
            if let Some(format) = log_format {
                cfg.logging.format = format;
            }

            init_tracing(&cfg.logging);
            tracing::info!(bind = %cfg.server.bind_addr(), "Starting envprobe");
            envprobe::serve(cfg).await?;
        }
        Commands::BuildVars { path, json } => {
            init_tracing(&LoggingConfig::default());
            let table = envprobe::build_vars::BuildVariableTable::load(&path)?;
            let entries = table.sorted();

            if json {
                let map: serde_json::Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else if entries.is_empty() {
                println!("No build-time variables in {}.", path.display());
            } else {
                for (key, value) in entries {
                    println!("{key}={value}");
                }
            }
        }
        Commands::Probe { kind, json } => {
            init_tracing(&LoggingConfig::default());
            let report = envprobe::probes::run(kind, &envprobe::env::OsEnvironment).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let verdict = if report.success { "OK" } else { "FAILED" };
                println!(
                    "{:<10} | {:<6} | {:.1} ms",
                    report.kind.to_string(),
                    verdict,
                    report.duration_ms
                );
                if let Some(err) = &report.error {
                    println!("{:<10} | {:<6} |   -> {}", "", "", err);
                }
            }

            if !report.success {
                anyhow::bail!("{} probe failed", report.kind);
            }
        }
    }

    Ok(())
}
