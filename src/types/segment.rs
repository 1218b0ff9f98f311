//! Fluid segments and the two-compartment fluid stack

use serde::{Deserialize, Serialize};

use super::{FluidIndex, Side};

/// Where a parcel of fluid came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Fluid that was in the hole before the schedule started
    InHole,
    /// Fluid pumped by the stage at this index
    Stage(usize),
}

/// Contiguous depth interval occupied by one fluid.
///
/// `fluid == None` is air (an empty pipe).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluidSegment {
    pub top_md: f64,
    pub bottom_md: f64,
    pub fluid: Option<FluidIndex>,
    pub color: Option<String>,
}

impl FluidSegment {
    pub fn length(&self) -> f64 {
        self.bottom_md - self.top_md
    }

    pub fn contains(&self, md: f64) -> bool {
        md >= self.top_md && md <= self.bottom_md
    }
}

/// Fluid occupancy of both compartments at one instant, ordered top to bottom.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FluidStack {
    pub string: Vec<FluidSegment>,
    pub annulus: Vec<FluidSegment>,
}

impl FluidStack {
    pub fn segments(&self, side: Side) -> &[FluidSegment] {
        match side {
            Side::String => &self.string,
            Side::Annulus => &self.annulus,
        }
    }

    /// Segment occupying `md`; on a boundary the upper segment wins.
    pub fn segment_at(&self, side: Side, md: f64) -> Option<&FluidSegment> {
        self.segments(side).iter().find(|s| s.contains(md))
    }

    /// Fluid at `md`, `None` for air or outside the compartment.
    pub fn fluid_at(&self, side: Side, md: f64) -> Option<FluidIndex> {
        self.segment_at(side, md).and_then(|s| s.fluid)
    }
}

/// Volume of one fluid that has left the well at surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpelledFluid {
    pub fluid_name: String,
    pub volume_m3: f64,
    pub color: Option<String>,
    pub origin: Origin,
}

/// Surface returns after a given point in the schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Returns {
    /// Pumped fluids that have come back to surface, in exit order
    pub expelled: Vec<ExpelledFluid>,
    /// Original in-hole fluid displaced out of the annulus (m³)
    pub displaced_in_hole_m3: f64,
    /// Air vented at the bit as liquid filled an empty string (m³)
    pub vented_air_m3: f64,
}

impl Returns {
    pub fn expelled_volume(&self) -> f64 {
        self.expelled.iter().map(|e| e.volume_m3).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(top_md: f64, bottom_md: f64, fluid: Option<usize>) -> FluidSegment {
        FluidSegment {
            top_md,
            bottom_md,
            fluid: fluid.map(FluidIndex),
            color: None,
        }
    }

    fn stack() -> FluidStack {
        FluidStack {
            string: vec![seg(0.0, 300.0, None), seg(300.0, 800.0, Some(2))],
            annulus: vec![seg(0.0, 650.0, Some(0)), seg(650.0, 900.0, Some(1))],
        }
    }

    #[test]
    fn test_fluid_at_depth() {
        let s = stack();
        assert_eq!(s.fluid_at(Side::String, 150.0), None);
        assert_eq!(s.fluid_at(Side::String, 500.0), Some(FluidIndex(2)));
        assert_eq!(s.fluid_at(Side::Annulus, 0.0), Some(FluidIndex(0)));
        assert_eq!(s.fluid_at(Side::Annulus, 900.0), Some(FluidIndex(1)));
        assert_eq!(s.segment_at(Side::Annulus, 700.0).map(FluidSegment::length), Some(250.0));
    }

    #[test]
    fn test_boundary_belongs_to_upper_segment() {
        let s = stack();
        let at = s.segment_at(Side::Annulus, 650.0).unwrap();
        assert_eq!((at.top_md, at.bottom_md), (0.0, 650.0));
        assert_eq!(s.fluid_at(Side::String, 300.0), None);
    }

    #[test]
    fn test_outside_compartment_is_none() {
        let s = stack();
        assert!(s.segment_at(Side::String, 800.5).is_none());
        assert!(s.segment_at(Side::Annulus, -1.0).is_none());
        assert!(FluidStack::default().segment_at(Side::String, 0.0).is_none());
    }
}
