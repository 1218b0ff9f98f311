//! Wellflow: wellbore fluid-stack and hydraulics engine
//!
//! Tracks fluid segments moving through the drill string and annulus as a
//! pump schedule is executed, and evaluates hydrostatic, friction and
//! equivalent-density outputs at any point in the schedule.
//!
//! ## Architecture
//!
//! - **Config**: engine constants from TOML, process-wide
//! - **Types**: geometry, fluids, segments, stages, results, diagnostics
//! - **Project**: read-only snapshot of the well handed to the engine
//! - **Physics Engine**: volume/depth conversion, rheology, stack
//!   advancement, schedule building, hydraulics, sweeps
//!
//! ## Example
//!
//! ```ignore
//! let project = ProjectSnapshot::load(Path::new("well.toml"))?;
//! let schedule = PumpSchedule::new(&project);
//! let stack = schedule.segments_at(0, 0.5);
//! let hyd = schedule.hydraulics_for_current(0, 0.5, &HydraulicsInput::at_rate(1.5));
//! println!("BHP {:.0} Pa, ECD {:.0} kg/m³", hyd.value.bhp_pa, hyd.value.ecd_kg_m3);
//! ```

pub mod config;
pub mod physics_engine;
pub mod project;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, SimConfig};

// Re-export the engine façade
pub use physics_engine::{EngineSettings, PumpSchedule};
pub use project::{ProjectError, ProjectFile, ProjectSnapshot};

// Re-export commonly used types
pub use types::{
    ControlDepth, Diagnostic, Evaluated, ExpelledFluid, Fluid, FluidIndex, FluidSegment,
    FluidStack, HydraulicsInput, HydraulicsResult, MpdSettings, Rheology, Returns, Section, Side,
    Stage, Survey, TvdLookup, WellGeometry,
};
