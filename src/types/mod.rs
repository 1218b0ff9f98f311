//! Shared data structures for the fluid-stack and hydraulics engine
//!
//! - Geometry: string/annulus sections and compartments
//! - Fluid: density plus rheology model parameters
//! - Segment: fluid occupancy of each compartment, surface returns
//! - Stage: pump stages and the schedule records they come from
//! - Hydraulics: evaluation inputs and pressure outputs
//! - Diagnostics: side channel for clamped/defaulted inputs
//! - Survey: MD → TVD lookup

mod geometry;
mod fluid;
mod segment;
mod stage;
mod hydraulics;
mod diagnostics;
mod survey;

pub use geometry::*;
pub use fluid::*;
pub use segment::*;
pub use stage::*;
pub use hydraulics::*;
pub use diagnostics::{Diagnostic, Evaluated};
pub(crate) use diagnostics::push_unique;
pub use survey::*;
