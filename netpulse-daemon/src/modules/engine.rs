//! Telemetry engine module initialization.
//!
//! Builds the `TelemetryEngine` from `[engine]`, wraps it in a `TickDriver`
//! and registers the driver as the `tick-driver` module.
//!
//! ```text
//! TickDriver --Arc<TickSnapshot>--> broadcast --> orchestrator (tick limit, summaries)
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;

use netpulse_core::config::NetpulseConfig;
use netpulse_core::types::TickSnapshot;
use netpulse_engine::{SharedEngine, TelemetryEngine, TickDriver};

use super::ModuleHandle;

/// Module name used in logs and health reports.
pub const MODULE_NAME: &str = "tick-driver";

/// Everything the orchestrator needs from the engine module.
pub struct EngineModule {
    pub handle: ModuleHandle,
    /// Snapshot subscription created before the driver starts, so no tick is missed.
    pub snapshots: broadcast::Receiver<Arc<TickSnapshot>>,
    /// Shared engine for introspection (tick count, history sizes).
    pub engine: SharedEngine,
}

/// Initialize the telemetry engine and its tick driver.
///
/// The engine is always enabled.
pub fn init(config: &NetpulseConfig) -> Result<EngineModule> {
    tracing::info!(
        tick_interval_ms = config.engine.tick_interval_ms,
        "initializing telemetry engine"
    );

    let engine = TelemetryEngine::builder()
        .config(config.engine.clone())
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build telemetry engine: {}", e))?;

    // Slow snapshot subscribers lag rather than block the driver
    let (driver, snapshots) = TickDriver::from_engine(engine);
    let engine = driver.engine();

    Ok(EngineModule {
        handle: ModuleHandle::new(MODULE_NAME, true, Box::new(driver)),
        snapshots,
        engine,
    })
}
