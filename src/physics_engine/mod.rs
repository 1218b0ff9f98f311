//! Physics Engine Module
//!
//! Deterministic fluid-stack and hydraulics calculations. Every evaluation
//! is a pure function of (project, settings, stage index, progress, rate,
//! control depth): the stack is rebuilt from the schedule on each call, so
//! scrubbing back and forth always yields the same answer.
//!
//! ## Layers
//! - `volume` - volume ↔ depth over piecewise section geometry
//! - `rheology` - friction gradient per rheology model
//! - `stack` - parcel bookkeeping along the circulation path
//! - `schedule` - stage list from final layers or a program
//! - `hydraulics` - hydrostatic + friction integration, BHP/ECD/TCP
//! - `pump_schedule` - the façade the UI and CLI call
//! - `sweep` - parallel what-if evaluations

pub mod hydraulics;
pub mod pump_schedule;
pub mod rheology;
pub mod schedule;
pub mod stack;
pub mod sweep;
pub mod volume;

pub use hydraulics::evaluate;
pub use pump_schedule::PumpSchedule;
pub use rheology::{FlowChannel, FlowRegime, FrictionGradient, RegimeLimits};
pub use schedule::build_stages;
pub use stack::{Parcel, StackState};
pub use sweep::{progress_sweep, rate_sweep};

use crate::config::{InitialStringFill, SimConfig};
use crate::types::{Fluid, Rheology};

// ============================================================================
// Engine Settings
// ============================================================================

/// Engine constants resolved from the simulation config.
///
/// Copied into each `PumpSchedule` so evaluations never touch the global
/// config on the hot path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// m/s²
    pub gravity: f64,
    /// Fallback fluid for unresolved references
    pub default_density_kg_m3: f64,
    pub default_viscosity_pa_s: f64,
    pub volume_tolerance_m3: f64,
    pub depth_tolerance_m: f64,
    pub initial_string: InitialStringFill,
    pub regime: RegimeLimits,
    pub default_pump_rate_m3_min: f64,
    /// 0 disables stroke conversion
    pub output_m3_per_stroke: f64,
}

impl EngineSettings {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            gravity: config.engine.gravity_m_s2,
            default_density_kg_m3: config.engine.default_fluid_density_kg_m3,
            default_viscosity_pa_s: config.engine.default_fluid_viscosity_pa_s,
            volume_tolerance_m3: config.engine.volume_tolerance_m3,
            depth_tolerance_m: config.engine.depth_tolerance_m,
            initial_string: config.engine.initial_string,
            regime: RegimeLimits {
                laminar: config.hydraulics.laminar_reynolds_limit,
                turbulent: config.hydraulics.turbulent_reynolds_limit,
            },
            default_pump_rate_m3_min: config.hydraulics.default_pump_rate_m3_min,
            output_m3_per_stroke: config.pump.output_m3_per_stroke,
        }
    }

    /// Neutral fluid substituted for missing references.
    pub fn default_fluid(&self) -> Fluid {
        Fluid::new(
            crate::config::defaults::DEFAULT_FLUID_ID,
            self.default_density_kg_m3,
            Rheology::Newtonian {
                viscosity_pa_s: self.default_viscosity_pa_s,
            },
        )
        .with_name("Default")
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}
