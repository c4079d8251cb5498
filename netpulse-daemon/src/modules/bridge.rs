//! Live capture bridge module initialization.
//!
//! Wraps `BridgeService` in a `ModuleHandle`. Sockets are bound when the
//! module starts, not here.

use anyhow::Result;

use netpulse_bridge::BridgeService;
use netpulse_core::config::NetpulseConfig;

use super::ModuleHandle;

/// Module name used in logs and health reports.
pub const MODULE_NAME: &str = "capture-bridge";

/// Initialize the capture bridge module.
///
/// # Returns
///
/// * `Ok(Some(ModuleHandle))` - Bridge initialized and ready to start
/// * `Ok(None)` - Module disabled in configuration
pub fn init(config: &NetpulseConfig) -> Result<Option<ModuleHandle>> {
    if !config.bridge.enabled {
        tracing::info!("capture bridge disabled in configuration");
        return Ok(None);
    }

    tracing::info!(
        frame_bind = %config.bridge.frame_bind,
        subscriber_bind = %config.bridge.subscriber_bind,
        "initializing capture bridge"
    );

    let service = BridgeService::new(config.bridge.clone());
    Ok(Some(ModuleHandle::new(MODULE_NAME, true, Box::new(service))))
}
