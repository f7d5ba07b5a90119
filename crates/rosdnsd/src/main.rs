// # rosdnsd - RouterOS ExternalDNS Webhook Daemon
//
// This daemon is a THIN integration layer: it reads configuration, wires the
// RouterOS client into the provider and serves the ExternalDNS webhook API.
// All record translation and change logic lives in rosdns-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Router
// - `MIKROTIK_BASEURL`: Router base URL, e.g. `https://192.168.88.1`
// - `MIKROTIK_USERNAME`: API user
// - `MIKROTIK_PASSWORD`: API password
// - `MIKROTIK_SKIP_TLS_VERIFY`: Accept self-signed certificates (default: false)
//
// ### Router defaults
// - `MIKROTIK_DEFAULT_TTL`: TTL the router applies when none is set (default: 3600)
// - `MIKROTIK_DEFAULT_COMMENT`: Comment the router applies when none is set
//
// ### Domain filter
// - `DOMAIN_FILTER`: Comma-separated managed domains
// - `EXCLUDE_DOMAIN_FILTER`: Comma-separated excluded domains
// - `REGEXP_DOMAIN_FILTER`: Managed names pattern (replaces the lists)
// - `REGEXP_DOMAIN_FILTER_EXCLUSION`: Excluded names pattern
//
// ### Server
// - `SERVER_HOST` / `SERVER_PORT`: Webhook listener (default: localhost:8888)
// - `HEALTH_HOST` / `HEALTH_PORT`: Probe listener (default: 0.0.0.0:8080)
//
// ### Daemon
// - `LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `LOG_FORMAT`: text or json (default: text)
// - `ROSDNS_MODE`: set to `dry-run` to skip router writes
//
// ## Example
//
// ```bash
// export MIKROTIK_BASEURL=https://192.168.88.1
// export MIKROTIK_USERNAME=external-dns
// export MIKROTIK_PASSWORD=secret
// export MIKROTIK_SKIP_TLS_VERIFY=true
// export DOMAIN_FILTER=home.example.com
//
// rosdnsd
// ```

mod webhook;

use anyhow::{Context, Result};
use rosdns_core::{
    BridgeConfig, DefaultValues, DomainFilter, DomainFilterConfig, RouterOsConfig,
    RouterOsProvider, ServerConfig,
};
use rosdns_routeros::RouterOsClient;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use crate::webhook::AppState;

/// How long in-flight requests may take to finish after a shutdown signal
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum RosdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<RosdnsExitCode> for ExitCode {
    fn from(code: RosdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

/// Application configuration
#[derive(Debug)]
struct Config {
    bridge: BridgeConfig,
    log_level: String,
    log_format: LogFormat,
    dry_run: bool,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let list = |key: &str| -> Vec<String> {
            var(key)
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let skip_tls_verify = match var("MIKROTIK_SKIP_TLS_VERIFY") {
            Some(v) => v
                .parse()
                .with_context(|| format!("MIKROTIK_SKIP_TLS_VERIFY must be true or false, got '{v}'"))?,
            None => false,
        };

        let defaults = DefaultValues::new(
            match var("MIKROTIK_DEFAULT_TTL") {
                Some(v) => v
                    .parse()
                    .with_context(|| format!("MIKROTIK_DEFAULT_TTL must be a number of seconds, got '{v}'"))?,
                None => DefaultValues::default().ttl,
            },
            var("MIKROTIK_DEFAULT_COMMENT").unwrap_or_default(),
        );

        let server_defaults = ServerConfig::default();
        let port = |key: &str, default: u16| -> Result<u16> {
            match var(key) {
                Some(v) => v
                    .parse()
                    .with_context(|| format!("{key} must be a port number, got '{v}'")),
                None => Ok(default),
            }
        };
        let server = ServerConfig {
            host: var("SERVER_HOST").unwrap_or(server_defaults.host),
            port: port("SERVER_PORT", server_defaults.port)?,
            health_host: var("HEALTH_HOST").unwrap_or(server_defaults.health_host),
            health_port: port("HEALTH_PORT", server_defaults.health_port)?,
        };

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => anyhow::bail!("LOG_FORMAT '{}' is not valid. Valid formats: text, json", other),
        };

        Ok(Self {
            bridge: BridgeConfig {
                router: RouterOsConfig {
                    base_url: var("MIKROTIK_BASEURL").unwrap_or_default(),
                    username: var("MIKROTIK_USERNAME").unwrap_or_default(),
                    password: lookup("MIKROTIK_PASSWORD").unwrap_or_default(),
                    skip_tls_verify,
                },
                defaults,
                domain_filter: DomainFilterConfig {
                    filters: list("DOMAIN_FILTER"),
                    exclusions: list("EXCLUDE_DOMAIN_FILTER"),
                    regex: var("REGEXP_DOMAIN_FILTER"),
                    regex_exclusion: var("REGEXP_DOMAIN_FILTER_EXCLUSION"),
                },
                server,
            },
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
            dry_run: var("ROSDNS_MODE").is_some_and(|m| m == "dry-run"),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.bridge.router.base_url.is_empty() {
            anyhow::bail!(
                "MIKROTIK_BASEURL is required. \
                Set it via: export MIKROTIK_BASEURL=https://192.168.88.1"
            );
        }

        if self.bridge.router.username.is_empty() {
            anyhow::bail!(
                "MIKROTIK_USERNAME is required. \
                Set it via: export MIKROTIK_USERNAME=external-dns"
            );
        }

        if self.bridge.router.password.is_empty() {
            anyhow::bail!("MIKROTIK_PASSWORD is required");
        }

        self.bridge.validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::new(config.log_level.to_lowercase());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return RosdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return RosdnsExitCode::ConfigError.into();
    }

    if let Err(e) = init_tracing(&config) {
        eprintln!("{}", e);
        return RosdnsExitCode::ConfigError.into();
    }

    info!("Starting rosdnsd");
    info!("Router: {:?}", config.bridge.router);
    if config.dry_run {
        warn!("Dry-run mode: router changes will be logged, not applied");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RosdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let server = match start(&config).await {
            Ok(server) => server,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return RosdnsExitCode::ConfigError;
            }
        };

        if let Err(e) = server.run().await {
            error!("Daemon error: {:#}", e);
            RosdnsExitCode::RuntimeError
        } else {
            RosdnsExitCode::CleanShutdown
        }
    })
    .into()
}

/// Listeners and shared state ready to serve
struct Server {
    state: Arc<AppState>,
    webhook: TcpListener,
    health: TcpListener,
}

/// Connect to the router and bind both listeners
async fn start(config: &Config) -> Result<Server> {
    let client = RouterOsClient::new(&config.bridge.router, config.dry_run)
        .context("Failed to create RouterOS client")?;
    let domain_filter = DomainFilter::from_config(&config.bridge.domain_filter)
        .context("Invalid domain filter")?;
    if !domain_filter.is_configured() {
        warn!("No domain filter configured, every router record is managed");
    }

    let provider = RouterOsProvider::new(
        Box::new(client),
        config.bridge.defaults.clone(),
        domain_filter,
    );
    provider
        .connect()
        .await
        .context("Failed to connect to RouterOS")?;

    let state = Arc::new(AppState::new(provider));
    state.set_ready(true);

    let server = &config.bridge.server;
    let webhook = TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("Failed to bind webhook listener on {}:{}", server.host, server.port))?;
    let health = TcpListener::bind((server.health_host.as_str(), server.health_port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind health listener on {}:{}",
                server.health_host, server.health_port
            )
        })?;

    Ok(Server {
        state,
        webhook,
        health,
    })
}

impl Server {
    /// Serve until a shutdown signal, then drain in-flight requests
    async fn run(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!("Webhook listening on {}", self.webhook.local_addr()?);
        info!("Health probes listening on {}", self.health.local_addr()?);

        let webhook = tokio::spawn(serve(
            self.webhook,
            webhook::router(Arc::clone(&self.state)),
            shutdown_rx.clone(),
        ));
        let health = tokio::spawn(serve(
            self.health,
            webhook::health_router(self.state),
            shutdown_rx,
        ));

        let signal = wait_for_shutdown().await?;
        info!("Received shutdown signal: {}", signal);
        let _ = shutdown_tx.send(true);

        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            let (webhook, health) = tokio::join!(webhook, health);
            webhook??;
            health??;
            Ok::<_, anyhow::Error>(())
        })
        .await;

        match drained {
            Ok(result) => {
                result?;
                info!("Shutting down daemon");
                Ok(())
            }
            Err(_) => Err(anyhow::anyhow!("Shutdown timeout after {:?}", DRAIN_TIMEOUT)),
        }
    }
}

async fn serve(listener: TcpListener, app: axum::Router, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .context("HTTP server failed")
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const ROUTER: [(&str, &str); 3] = [
        ("MIKROTIK_BASEURL", "https://192.168.88.1"),
        ("MIKROTIK_USERNAME", "external-dns"),
        ("MIKROTIK_PASSWORD", "secret"),
    ];

    fn with_router<'a>(extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut vars: Vec<(&'a str, &'a str)> = ROUTER.to_vec();
        vars.extend_from_slice(extra);
        vars
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load(&ROUTER).unwrap();
        config.validate().unwrap();

        assert_eq!(config.bridge.defaults.ttl, 3600);
        assert!(config.bridge.defaults.comment.is_empty());
        assert_eq!(config.bridge.server.host, "localhost");
        assert_eq!(config.bridge.server.port, 8888);
        assert_eq!(config.bridge.server.health_host, "0.0.0.0");
        assert_eq!(config.bridge.server.health_port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(!config.dry_run);
        assert!(!config.bridge.router.skip_tls_verify);
    }

    #[test]
    fn test_full_config() {
        let config = load(&with_router(&[
            ("MIKROTIK_SKIP_TLS_VERIFY", "true"),
            ("MIKROTIK_DEFAULT_TTL", "1800"),
            ("MIKROTIK_DEFAULT_COMMENT", "external-dns"),
            ("DOMAIN_FILTER", "example.com, .lan.example.org"),
            ("EXCLUDE_DOMAIN_FILTER", "internal.example.com"),
            ("SERVER_HOST", "0.0.0.0"),
            ("SERVER_PORT", "9999"),
            ("HEALTH_PORT", "9090"),
            ("LOG_FORMAT", "json"),
            ("ROSDNS_MODE", "dry-run"),
        ]))
        .unwrap();
        config.validate().unwrap();

        assert!(config.bridge.router.skip_tls_verify);
        assert_eq!(config.bridge.defaults, DefaultValues::new(1800, "external-dns"));
        assert_eq!(config.bridge.domain_filter.filters, vec!["example.com", ".lan.example.org"]);
        assert_eq!(config.bridge.domain_filter.exclusions, vec!["internal.example.com"]);
        assert_eq!(config.bridge.server.port, 9999);
        assert_eq!(config.bridge.server.health_port, 9090);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.dry_run);
    }

    #[test]
    fn test_unparseable_values_are_rejected() {
        assert!(load(&with_router(&[("MIKROTIK_DEFAULT_TTL", "1h")])).is_err());
        assert!(load(&with_router(&[("SERVER_PORT", "http")])).is_err());
        assert!(load(&with_router(&[("MIKROTIK_SKIP_TLS_VERIFY", "maybe")])).is_err());
        assert!(load(&with_router(&[("LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let missing_url = load(&[("MIKROTIK_USERNAME", "u"), ("MIKROTIK_PASSWORD", "p")]).unwrap();
        assert!(missing_url.validate().is_err());

        let missing_password =
            load(&[("MIKROTIK_BASEURL", "https://router"), ("MIKROTIK_USERNAME", "u")]).unwrap();
        assert!(missing_password.validate().is_err());

        let zero_ttl = load(&with_router(&[("MIKROTIK_DEFAULT_TTL", "0")])).unwrap();
        assert!(zero_ttl.validate().is_err());

        let bad_regex = load(&with_router(&[("REGEXP_DOMAIN_FILTER", "(")])).unwrap();
        assert!(bad_regex.validate().is_err());

        let bad_level = load(&with_router(&[("LOG_LEVEL", "verbose")])).unwrap();
        assert!(bad_level.validate().is_err());

        let shared_port = load(&with_router(&[("SERVER_PORT", "8080")])).unwrap();
        assert!(shared_port.validate().is_err());
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config = load(&ROUTER).unwrap();
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
