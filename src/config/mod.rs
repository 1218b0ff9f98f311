//! Simulation Configuration Module
//!
//! Engine constants and hydraulics tuning loaded from TOML, so that rig- or
//! project-specific values (gravity, fallback fluid, Reynolds limits, pump
//! output) never need a rebuild.
//!
//! ## Loading Order
//!
//! 1. `WELLFLOW_CONFIG` environment variable (path to TOML file)
//! 2. `wellflow.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(SimConfig::load());
//!
//! // Anywhere in the codebase:
//! let g = config::get().engine.gravity_m_s2;
//! ```

mod sim_config;
pub mod defaults;
pub mod validation;

pub use sim_config::*;

use std::sync::OnceLock;

/// Global simulation configuration, initialized once at startup.
static SIM_CONFIG: OnceLock<SimConfig> = OnceLock::new();

/// Initialize the global simulation configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: SimConfig) {
    if SIM_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global simulation configuration.
///
/// Falls back to built-in defaults when `init()` was never called, so library
/// users that do not care about configuration can skip it.
pub fn get() -> &'static SimConfig {
    SIM_CONFIG.get_or_init(|| {
        tracing::debug!("config::get() before config::init(), using built-in defaults");
        SimConfig::default()
    })
}
