//! CLI argument definitions for netpulse-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use netpulse_core::config::NetpulseConfig;

/// Config path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "netpulse.toml";

/// Netpulse synthetic network telemetry daemon.
///
/// Ticks the telemetry engine on a fixed interval, publishes each snapshot,
/// and optionally runs the live capture bridge.
#[derive(Parser, Debug)]
#[command(name = "netpulse-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to netpulse.toml configuration file.
    ///
    /// When omitted, `netpulse.toml` in the working directory is used if it
    /// exists; otherwise built-in defaults apply.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Exit after this many ticks have been published.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub ticks: Option<u64>,
}

impl DaemonCli {
    /// Resolve the configuration: file (or defaults), env overrides, CLI overrides, validation.
    ///
    /// An explicit `--config` path must exist. The default path may be missing.
    pub async fn load_config(&self) -> Result<NetpulseConfig> {
        let mut config = match &self.config {
            Some(path) => load_file(path).await?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                load_file(Path::new(DEFAULT_CONFIG_PATH)).await?
            }
            None => NetpulseConfig::default(),
        };
        config.apply_env_overrides();
        self.apply_overrides(&mut config);

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        Ok(config)
    }

    /// Apply CLI flags on top of file and environment values.
    pub fn apply_overrides(&self, config: &mut NetpulseConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }
}

async fn load_file(path: &Path) -> Result<NetpulseConfig> {
    NetpulseConfig::from_file(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", path.display(), e))
}
