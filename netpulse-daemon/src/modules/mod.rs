//! Module registry and initialization.
//!
//! Each netpulse component is wrapped as a [`ModuleHandle`] that provides
//! uniform lifecycle management via the [`DynPipeline`] trait.
//!
//! The [`ModuleRegistry`] tracks all registered modules and supports
//! ordered start/stop operations.

pub mod bridge;
pub mod engine;

use netpulse_core::pipeline::{DynPipeline, HealthStatus};

/// A handle to a registered module.
///
/// Wraps a `Box<dyn DynPipeline>` with metadata (name, enabled flag).
pub struct ModuleHandle {
    /// Module name for logging and health reporting.
    pub name: String,
    /// Whether this module is enabled in configuration.
    pub enabled: bool,
    /// The module's pipeline implementation (start/stop/health_check).
    pub pipeline: Box<dyn DynPipeline>,
}

impl ModuleHandle {
    pub fn new(name: impl Into<String>, enabled: bool, pipeline: Box<dyn DynPipeline>) -> Self {
        Self {
            name: name.into(),
            enabled,
            pipeline,
        }
    }

    /// Check the module's health status.
    ///
    /// Disabled modules always report `Healthy` (they are not expected to run).
    pub async fn health_check(&self) -> HealthStatus {
        if !self.enabled {
            return HealthStatus::Healthy;
        }
        self.pipeline.health_check().await
    }
}

/// Registry of all netpulse modules.
pub struct ModuleRegistry {
    /// Modules in registration order.
    modules: Vec<ModuleHandle>,
    /// Number of leading modules that were started by `start_all`.
    started: usize,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            started: 0,
        }
    }

    /// Register a module. Modules start in registration order.
    pub fn register(&mut self, handle: ModuleHandle) {
        self.modules.push(handle);
    }

    /// Start all enabled modules in registration order.
    ///
    /// On failure, modules that already started are stopped again before
    /// the error is returned.
    pub async fn start_all(&mut self) -> anyhow::Result<()> {
        for idx in 0..self.modules.len() {
            let handle = &mut self.modules[idx];
            if !handle.enabled {
                tracing::debug!(module = %handle.name, "skipping disabled module");
                self.started = idx + 1;
                continue;
            }

            tracing::info!(module = %handle.name, "starting module");
            if let Err(e) = handle.pipeline.start().await {
                let err = anyhow::anyhow!("failed to start module '{}': {}", handle.name, e);
                tracing::warn!("startup failed, rolling back already-started modules");
                if let Err(stop_err) = self.stop_all().await {
                    tracing::error!(
                        startup_error = %err,
                        rollback_error = %stop_err,
                        "rollback also failed during startup failure cleanup"
                    );
                }
                return Err(err);
            }
            self.started = idx + 1;
            tracing::info!(module = %handle.name, "module started successfully");
        }
        Ok(())
    }

    /// Stop started modules in reverse registration order.
    ///
    /// Logs errors but continues stopping remaining modules.
    pub async fn stop_all(&mut self) -> anyhow::Result<()> {
        let mut errors = Vec::new();

        for handle in self.modules[..self.started].iter_mut().rev() {
            if !handle.enabled {
                continue;
            }

            tracing::info!(module = %handle.name, "stopping module");
            if let Err(e) = handle.pipeline.stop().await {
                tracing::error!(module = %handle.name, error = %e, "failed to stop module");
                errors.push(format!("{}: {}", handle.name, e));
            } else {
                tracing::info!(module = %handle.name, "module stopped successfully");
            }
        }
        self.started = 0;

        if !errors.is_empty() {
            return Err(anyhow::anyhow!(
                "errors stopping modules: {}",
                errors.join("; ")
            ));
        }
        Ok(())
    }

    /// Get health status for all modules as `(name, enabled, status)`.
    pub async fn health_statuses(&self) -> Vec<(String, bool, HealthStatus)> {
        let mut statuses = Vec::with_capacity(self.modules.len());
        for handle in &self.modules {
            let status = handle.health_check().await;
            statuses.push((handle.name.clone(), handle.enabled, status));
        }
        statuses
    }

    /// Number of registered modules.
    pub fn count(&self) -> usize {
        self.modules.len()
    }

    /// Number of enabled modules.
    pub fn enabled_count(&self) -> usize {
        self.modules.iter().filter(|m| m.enabled).count()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
