//! System-wide default constants.
//!
//! Grouped by subsystem. The `SimConfig` defaults are built from these.

// ============================================================================
// Engine
// ============================================================================

/// Standard gravity (m/s²).
pub const GRAVITY_M_S2: f64 = 9.81;

/// Density of the neutral fallback fluid used for unresolved references (kg/m³).
pub const DEFAULT_FLUID_DENSITY_KG_M3: f64 = 1000.0;

/// Viscosity of the neutral fallback fluid (Pa·s), water at ~20 °C.
pub const DEFAULT_FLUID_VISCOSITY_PA_S: f64 = 0.001;

/// Id given to the neutral fallback fluid in a project snapshot.
pub const DEFAULT_FLUID_ID: &str = "__default__";

/// Volumes below this are treated as zero (m³).
pub const VOLUME_TOLERANCE_M3: f64 = 1e-9;

/// Segments shorter than this are dropped when resolving depths (m).
pub const DEPTH_TOLERANCE_M: f64 = 1e-6;

// ============================================================================
// Hydraulics
// ============================================================================

/// Generalised Reynolds number below which flow is laminar.
pub const LAMINAR_REYNOLDS_LIMIT: f64 = 2100.0;

/// Generalised Reynolds number above which flow is fully turbulent.
pub const TURBULENT_REYNOLDS_LIMIT: f64 = 4000.0;

/// Seconds per minute, for m³/min ↔ m³/s.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

// ============================================================================
// Simulation replay
// ============================================================================

/// Default number of progress ticks per stage in the replay binary.
pub const REPLAY_TICKS_PER_STAGE: u32 = 20;
