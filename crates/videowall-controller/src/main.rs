//! NVX Video Wall Controller entry point.
//!
//! Loads the configuration, builds the wall controller, and serves control
//! surfaces over TCP until Ctrl+C.
//!
//! # Usage
//!
//! ```text
//! videowall-controller [OPTIONS]
//!
//! Options:
//!   --config <PATH>       Config file [default: platform config dir]
//!   --bind <ADDR>         Bind address, overrides [network].bind_address
//!   --port <PORT>         Control port, overrides [network].control_port
//!   --log-level <LEVEL>   Overrides [controller].log_level
//!   --init-config         Write the effective config to disk and exit
//! ```
//!
//! `RUST_LOG` takes precedence over both the config file and `--log-level`.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ AppConfig              -- file + CLI overrides, validated
//!  └─ BroadcastFeedbackSink  -- feedback fan-out
//!  └─ WallController         -- wall state, behind a tokio Mutex
//!  └─ ControlServer::run()   -- accept loop, one task per session
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use videowall_controller::application::{FeedbackSink, WallController};
use videowall_controller::infrastructure::network::{BroadcastFeedbackSink, ControlServer};
use videowall_controller::infrastructure::storage::config::{
    self, load_config, load_config_from, save_config, save_config_to, AppConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// NVX video wall controller.
///
/// Serves panel and video input button presses from control surfaces and
/// keeps every surface's feedback in sync.
#[derive(Debug, Parser)]
#[command(
    name = "videowall-controller",
    about = "Video wall configurator for NVX receivers",
    version
)]
struct Cli {
    /// Path to the TOML config file.  Defaults to the platform config dir.
    #[arg(long, env = "VIDEOWALL_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to bind the control server to.
    #[arg(long, env = "VIDEOWALL_BIND")]
    bind: Option<String>,

    /// TCP port for the control server.
    #[arg(long, env = "VIDEOWALL_PORT")]
    port: Option<u16>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "VIDEOWALL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    /// Loads the config file and applies the command-line overrides.
    fn load_config(&self) -> Result<AppConfig, config::ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        if let Some(bind) = &self.bind {
            cfg.network.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            cfg.network.control_port = port;
        }
        if let Some(level) = &self.log_level {
            cfg.controller.log_level = level.clone();
        }
        Ok(cfg)
    }

    fn save_config(&self, cfg: &AppConfig) -> Result<(), config::ConfigError> {
        match &self.config {
            Some(path) => save_config_to(cfg, path),
            None => save_config(cfg),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.load_config().context("failed to load configuration")?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.controller.log_level)),
        )
        .init();

    cfg.validate().context("invalid configuration")?;

    if cli.init_config {
        cli.save_config(&cfg).context("failed to write configuration")?;
        info!("configuration written");
        return Ok(());
    }

    let dims = cfg.wall_dimensions()?;
    let bind_addr = cfg.bind_addr()?;
    info!(
        "NVX Video Wall Controller starting: {}x{} wall, {} inputs",
        dims.width(),
        dims.height(),
        cfg.inputs.count
    );

    let feedback = Arc::new(BroadcastFeedbackSink::default());
    let controller = Arc::new(Mutex::new(WallController::new(
        dims,
        cfg.inputs.count,
        Arc::clone(&feedback) as Arc<dyn FeedbackSink>,
    )));
    let server = ControlServer::bind(bind_addr, controller, feedback)
        .await
        .with_context(|| format!("failed to start control server on {bind_addr}"))?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    server.run(running).await?;

    info!("NVX Video Wall Controller stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_config() -> String {
        std::env::temp_dir()
            .join(format!("videowall_missing_{}.toml", uuid::Uuid::new_v4()))
            .display()
            .to_string()
    }

    #[test]
    fn test_cli_defaults_leave_overrides_unset() {
        let cli = Cli::parse_from(["videowall-controller"]);
        assert!(cli.bind.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.init_config);
    }

    #[test]
    fn test_cli_overrides_apply_on_top_of_config_file() {
        // Arrange
        let path = missing_config();
        let cli = Cli::parse_from([
            "videowall-controller",
            "--config",
            &path,
            "--bind",
            "127.0.0.1",
            "--port",
            "9100",
            "--log-level",
            "debug",
        ]);

        // Act
        let cfg = cli.load_config().unwrap();

        // Assert
        assert_eq!(cfg.network.bind_address, "127.0.0.1");
        assert_eq!(cfg.network.control_port, 9100);
        assert_eq!(cfg.controller.log_level, "debug");
        assert_eq!(cfg.inputs.count, 8);
    }

    #[test]
    fn test_cli_without_overrides_keeps_file_values() {
        let path = missing_config();
        let cli = Cli::parse_from(["videowall-controller", "--config", &path]);
        assert_eq!(cli.load_config().unwrap(), AppConfig::default());
    }
}
