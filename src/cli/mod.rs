//! Command-line interface for flushd.
//!
//! Run `flushd --url https://collector/api/metrics` and point the agent's
//! `write_http` plugin at the receiver address.

use crate::application::Forwarder;
use crate::core::config::ConfigBuilder;
use crate::core::{Config, FlushdError, Result};
use crate::receiver::{SampleReceiver, DEFAULT_LISTEN};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Buffer metric samples and flush them in batches to an HTTP collector
#[derive(Parser, Debug)]
#[command(name = "flushd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.config/flushd/config.yaml)
    #[arg(short, long, env = "FLUSHD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Collector URL
    #[arg(long, env = "FLUSHD_URL")]
    pub url: Option<String>,

    /// Types database path
    #[arg(long, env = "FLUSHD_TYPES_DB")]
    pub types_db: Option<PathBuf>,

    /// Maximum age of buffered data in seconds
    #[arg(long, env = "FLUSHD_FLUSH_INTERVAL")]
    pub flush_interval: Option<u64>,

    /// Number of buffered records that forces a flush
    #[arg(long, env = "FLUSHD_FLUSH_MAX_VALUES")]
    pub flush_max_values: Option<usize>,

    /// Plugin option as KEY=VALUE, e.g. `-o Authentication=basic` (repeatable)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Address the sample receiver listens on
    #[arg(long, env = "FLUSHD_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Enable debug logging
    #[arg(short, long, env = "FLUSHD_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. `--url`, `--types-db` and the flush flags, or their environment
    ///    variables (highest priority)
    /// 2. `-o KEY=VALUE` options, applied in order
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            path.clone()
        } else {
            let default_path = dirs::config_dir()
                .map(|d| d.join("flushd").join("config.yaml"))
                .unwrap_or_else(|| PathBuf::from("~/.config/flushd/config.yaml"));

            if default_path.exists() {
                default_path
            } else {
                return self.build_config_from_args(builder);
            }
        };

        match tokio::fs::read_to_string(&config_path).await {
            Ok(content) => {
                builder = builder.from_yaml(&content)?;
                tracing::info!("Loaded configuration from: {:?}", config_path);
            },
            Err(e) if self.config.is_some() => {
                return Err(FlushdError::config(format!(
                    "Failed to read config file {:?}: {}",
                    config_path, e
                )));
            },
            Err(_) => {
                tracing::debug!("No config file found at {:?}, using defaults", config_path);
            },
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        for option in &self.options {
            let (key, value) = option.split_once('=').ok_or_else(|| {
                FlushdError::config(format!("Option '{}' is not of the form KEY=VALUE", option))
            })?;
            builder = builder.option(key.trim(), value.trim())?;
        }

        if let Some(url) = &self.url {
            builder = builder.url(url.clone());
        }
        if let Some(path) = &self.types_db {
            builder = builder.types_db(path.clone());
        }
        if let Some(secs) = self.flush_interval {
            builder = builder.flush_interval_secs(secs);
        }
        if let Some(count) = self.flush_max_values {
            builder = builder.flush_max_values(count);
        }

        builder.build()
    }

    /// Initialize logging.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level =
            std::env::var("FLUSHD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_str()
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| FlushdError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute flushd.
pub async fn execute(cli: Cli) -> Result<()> {
    cli.init_logging()?;

    let config = cli.load_config().await?;

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  URL: {}", config.endpoint.url);
        println!("  Authentication: {}", config.endpoint.auth.protocol());
        println!("  Verify SSL: {}", config.endpoint.verify_ssl);
        println!("  Types DB: {}", config.types_db.display());
        println!("  Flush interval: {}s", config.flush.interval_secs);
        println!("  Flush max values: {}", config.flush.max_values);
        println!("  Flush timeout: {}s", config.endpoint.timeout.as_secs());
        return Ok(());
    }

    let forwarder = Arc::new(Forwarder::new(&config)?);

    #[cfg(unix)]
    spawn_catalog_reloader(Arc::clone(&forwarder));

    let receiver = SampleReceiver::new(cli.listen, Arc::clone(&forwarder));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("Received shutdown signal, stopping...");
    };

    receiver.run(shutdown).await?;

    let flushed = forwarder.flush_now().await;
    tracing::info!("Flushed {} buffered records on shutdown", flushed);

    Ok(())
}

/// Reload the types database on SIGHUP.
#[cfg(unix)]
fn spawn_catalog_reloader(forwarder: Arc<Forwarder>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Cannot install SIGHUP handler, types reload disabled: {}", e);
                return;
            },
        };

        while hangup.recv().await.is_some() {
            match forwarder.reload_catalog() {
                Ok(count) => tracing::info!(
                    "Reloaded {} types from {:?}",
                    count,
                    forwarder.types_db()
                ),
                Err(e) => tracing::warn!("Keeping previous types database: {}", e),
            }
        }
    });
}
