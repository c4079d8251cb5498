//! Module orchestration -- assembly and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `netpulse-daemon`.
//! It builds enabled modules from configuration, manages startup/shutdown
//! ordering, and runs the main loop.
//!
//! # Startup Order
//!
//! 1. Tick driver (synthetic telemetry)
//! 2. Capture bridge (live frames, optional)
//!
//! Shutdown runs in reverse order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use netpulse_core::config::NetpulseConfig;
use netpulse_core::types::TickSnapshot;
use netpulse_engine::SharedEngine;

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};
use crate::metrics_server;
use crate::modules::{self, ModuleRegistry};

/// How often the main loop logs aggregated health.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// How often the uptime gauge is refreshed.
const UPTIME_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

/// Why the main loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// SIGTERM or SIGINT.
    Signal(&'static str),
    /// `--ticks` limit reached.
    TickLimit(u64),
    /// The snapshot channel closed (driver gone).
    DriverClosed,
}

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: NetpulseConfig,
    /// Registry of all modules (ordered for start/stop).
    modules: ModuleRegistry,
    /// Snapshot subscription from the tick driver.
    snapshots: broadcast::Receiver<Arc<TickSnapshot>>,
    /// Shared engine handle for introspection.
    engine: SharedEngine,
    /// Shutdown broadcast sender (signals background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Build from an already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the metrics recorder cannot be
    /// installed, or any enabled module fails to initialize.
    pub async fn build_from_config(config: NetpulseConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        // Install metrics recorder before module initialization
        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
        }

        let mut registry = ModuleRegistry::new();

        let engine = modules::engine::init(&config)?;
        registry.register(engine.handle);

        if let Some(handle) = modules::bridge::init(&config)? {
            registry.register(handle);
        }

        let (shutdown_tx, _) = broadcast::channel(4);

        tracing::info!(
            total_modules = registry.count(),
            enabled_modules = registry.enabled_count(),
            "orchestrator initialized"
        );

        if config.metrics.enabled {
            record_daemon_metrics();
        }

        Ok(Self {
            config,
            modules: registry,
            snapshots: engine.snapshots,
            engine: engine.engine,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Start all modules and run until a signal arrives or `max_ticks` snapshots are seen.
    pub async fn run(&mut self, max_ticks: Option<u64>) -> Result<StopReason> {
        if max_ticks == Some(0) {
            tracing::info!("tick limit is zero, not starting modules");
            return Ok(StopReason::TickLimit(0));
        }

        self.modules.start_all().await?;

        let uptime_task = if self.config.metrics.enabled {
            Some(spawn_uptime_updater(
                self.start_time,
                self.shutdown_tx.subscribe(),
            ))
        } else {
            None
        };

        tracing::info!(max_ticks = ?max_ticks, "entering main loop");
        let reason = self.main_loop(max_ticks).await;

        let _ = self.shutdown_tx.send(());
        if let Some(task) = uptime_task {
            let _ = task.await;
        }

        let reason = match reason {
            Ok(reason) => reason,
            Err(e) => {
                // Stop modules even when the loop itself failed
                if let Err(stop_err) = self.shutdown().await {
                    tracing::error!(error = %stop_err, "shutdown after main loop failure failed");
                }
                return Err(e);
            }
        };
        tracing::info!(reason = ?reason, "main loop finished");

        self.shutdown().await?;
        Ok(reason)
    }

    async fn main_loop(&mut self, max_ticks: Option<u64>) -> Result<StopReason> {
        let shutdown_signal = wait_for_shutdown_signal();
        tokio::pin!(shutdown_signal);

        let mut health_interval = tokio::time::interval(HEALTH_LOG_INTERVAL);
        health_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so health is logged after startup settles
        health_interval.tick().await;

        let mut seen = 0u64;
        loop {
            tokio::select! {
                signal = &mut shutdown_signal => {
                    let signal = signal?;
                    tracing::info!(signal = signal, "shutdown signal received");
                    return Ok(StopReason::Signal(signal));
                }
                snapshot = self.snapshots.recv() => {
                    match snapshot {
                        Ok(snapshot) => {
                            seen += 1;
                            tracing::debug!(
                                seen,
                                packets = snapshot.packets.len(),
                                alerts = snapshot.alerts.len(),
                                "snapshot received"
                            );
                            if max_ticks.is_some_and(|max| seen >= max) {
                                tracing::info!(ticks = seen, "tick limit reached");
                                return Ok(StopReason::TickLimit(seen));
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            // Lagged snapshots still happened; count them toward the limit
                            seen += skipped;
                            tracing::warn!(skipped, "snapshot subscriber lagged");
                            if max_ticks.is_some_and(|max| seen >= max) {
                                return Ok(StopReason::TickLimit(seen));
                            }
                        }
                        Err(RecvError::Closed) => {
                            tracing::warn!("snapshot channel closed");
                            return Ok(StopReason::DriverClosed);
                        }
                    }
                }
                _ = health_interval.tick() => {
                    let health = self.health().await;
                    if health.status.is_healthy() {
                        tracing::info!(
                            uptime_secs = health.uptime_secs,
                            ticks = health.ticks_published,
                            "daemon healthy"
                        );
                    } else {
                        tracing::warn!(status = ?health.status, "daemon health degraded");
                    }
                }
            }
        }
    }

    /// Stop all modules in reverse order.
    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping all modules");
        self.modules.stop_all().await
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let modules: Vec<ModuleHealth> = self
            .modules
            .health_statuses()
            .await
            .into_iter()
            .map(|(name, enabled, status)| ModuleHealth {
                name,
                enabled,
                status,
            })
            .collect();

        DaemonHealth {
            status: aggregate_status(&modules),
            uptime_secs: self.start_time.elapsed().as_secs(),
            ticks_published: self.engine.lock().await.ticks(),
            modules,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &NetpulseConfig {
        &self.config
    }

    /// Shared engine handle.
    pub fn engine(&self) -> SharedEngine {
        Arc::clone(&self.engine)
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Record build info once during initialization.
fn record_daemon_metrics() {
    use netpulse_core::metrics as m;

    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}

/// Spawn a background task that periodically updates the uptime metric.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    use netpulse_core::metrics as m;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_UPDATE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS)
                        .set(start_time.elapsed().as_secs() as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}
