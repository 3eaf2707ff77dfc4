//! Smart Router sidecar.
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http server ──▶ routing::Router ──▶ decision
//!                                                            │
//!                          headers rewritten (route header,  │
//!                          X-Routed-By, X-Route-Reason, ...) ◀┘
//!                                         │
//!     Client Response                     ▼
//!     ◀─────────────── http client ◀── upstream[target]
//! ```
//!
//! Subcommands:
//! - `serve`: run the sidecar, optionally hot-reloading the config file
//! - `eval`: print the decision for a synthetic request
//! - `check`: validate a config file and lint its rules

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use smart_router::config::watcher::ConfigWatcher;
use smart_router::config::{
    lint_config, load_config, or_default, ConfigError, LogFormat, RouterConfig,
};
use smart_router::lifecycle::{shutdown_on_signal, Shutdown};
use smart_router::observability::{logging, metrics};
use smart_router::routing::view::PATH_ATTRIBUTE;
use smart_router::{PluginConfig, Router, RouterServer};

#[derive(Parser)]
#[command(name = "smart-router")]
#[command(version, about = "Rule-based request router sidecar", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the routing sidecar
    Serve {
        /// Configuration file (JSON, or TOML with a .toml extension)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<String>,

        /// Reload rules when the configuration file changes
        #[arg(short, long)]
        watch: bool,
    },
    /// Print the routing decision for a request
    Eval {
        /// Configuration file; the built-in sample rules are used if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Request path, including any query string
        #[arg(short, long, default_value = "/")]
        path: String,

        /// Request header as "Name: value"; repeatable
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
    /// Validate a configuration file
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected \"Name: value\", got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Commands::Serve {
            config,
            bind,
            watch,
        } => serve(config.as_deref(), bind, watch).await?,
        Commands::Eval {
            config,
            path,
            headers,
        } => eval(config.as_deref(), path, headers)?,
        Commands::Check { config } => return Ok(check(&config)),
    }
    Ok(ExitCode::SUCCESS)
}

async fn serve(
    path: Option<&Path>,
    bind: Option<String>,
    watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = path.map(|p| (p, load_config(p)));

    // Logging is configured from the file itself, so it starts after the load.
    let (log_level, log_format) = match &loaded {
        Some((_, Ok(config))) => (
            config.plugin.log_level.clone(),
            config.observability.log_format,
        ),
        _ => ("info".to_string(), LogFormat::Pretty),
    };
    logging::init_logging(&log_level, log_format);

    tracing::info!("smart-router v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Some((p, result)) => or_default(p, result),
        None => {
            tracing::info!("No configuration file given, using defaults");
            RouterConfig::default()
        }
    };
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match path {
        Some(p) if watch => {
            let (watcher, updates) = ConfigWatcher::new(p);
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { shutdown_on_signal(&shutdown).await });

    RouterServer::new(config)
        .run(listener, config_updates, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn eval(
    path: Option<&Path>,
    request_path: String,
    headers: Vec<(String, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let plugin = match path {
        Some(p) => load_config(p)?.plugin,
        None => PluginConfig::sample(),
    };

    let mut attributes: HashMap<String, String> = headers.into_iter().collect();
    attributes.insert(PATH_ATTRIBUTE.to_string(), request_path);

    let decision = Router::new(&plugin).evaluate(&attributes);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn check(path: &Path) -> ExitCode {
    match load_config(path) {
        Ok(config) => {
            let warnings = lint_config(&config);
            for warning in &warnings {
                println!("warning: {warning}");
            }
            println!(
                "{}: ok ({} rules, {} warnings)",
                path.display(),
                config.plugin.rules.len(),
                warnings.len()
            );
            ExitCode::SUCCESS
        }
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                eprintln!("error: {error}");
            }
            eprintln!("{}: {} errors", path.display(), errors.len());
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("X-Beta-User: true").unwrap(),
            ("X-Beta-User".to_string(), "true".to_string())
        );
        assert_eq!(
            parse_header("cookie:a=b; c=d").unwrap(),
            ("cookie".to_string(), "a=b; c=d".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_cli_parses_eval() {
        let cli = Cli::parse_from([
            "smart-router",
            "eval",
            "--path",
            "/api?user_type=premium",
            "-H",
            "X-Beta-User: true",
        ]);
        match cli.command {
            Commands::Eval { path, headers, config } => {
                assert!(config.is_none());
                assert_eq!(path, "/api?user_type=premium");
                assert_eq!(headers.len(), 1);
            }
            _ => panic!("expected eval"),
        }
    }
}
