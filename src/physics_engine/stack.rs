//! Fluid-stack advancement in volume coordinates
//!
//! Each compartment is held as an ordered list of parcels (fluid + volume +
//! origin), top to bottom. Pumping is a pure shift along the circulation
//! path:
//!
//! ```text
//!   string top ──► string bottom (bit) ──► annulus at bit ──► annulus top ──► returns
//! ```
//!
//! String stages enter at the string top, annulus stages at the bit. Liquid
//! crossing the bit moves into the annulus at bit depth; air crossing the
//! bit is vented. Annulus hole below the bit (rathole) is off the flow path
//! and keeps whatever it holds. Whatever crosses the annulus top is recorded
//! as returns. Depths are only resolved at the end, via the compartment
//! geometry.

use std::collections::VecDeque;

use super::volume;
use crate::types::{
    CompartmentGeometry, FluidIndex, FluidSegment, FluidStack, Origin, Side,
};

/// A volume of one fluid from one origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parcel {
    pub fluid: Option<FluidIndex>,
    pub volume: f64,
    pub origin: Origin,
}

impl Parcel {
    pub fn new(fluid: Option<FluidIndex>, volume: f64, origin: Origin) -> Self {
        Self {
            fluid,
            volume,
            origin,
        }
    }

    fn same_kind(&self, other: &Parcel) -> bool {
        self.fluid == other.fluid && self.origin == other.origin
    }
}

/// Parcel contents of both compartments plus everything that has left them.
#[derive(Debug, Clone, PartialEq)]
pub struct StackState {
    string: VecDeque<Parcel>,
    annulus: VecDeque<Parcel>,
    string_capacity: f64,
    annulus_capacity: f64,
    /// Annulus volume below the bit
    rathole: f64,
    /// Liquid returned at surface, in exit order
    returned: Vec<Parcel>,
    vented_air: f64,
    tolerance: f64,
}

impl StackState {
    /// Both compartments filled to capacity with their initial fluids.
    pub fn filled(
        string_fill: Option<FluidIndex>,
        annulus_fill: Option<FluidIndex>,
        string_capacity: f64,
        annulus_capacity: f64,
        tolerance: f64,
    ) -> Self {
        let mut string = VecDeque::new();
        if string_capacity > tolerance {
            string.push_back(Parcel::new(string_fill, string_capacity, Origin::InHole));
        }
        let mut annulus = VecDeque::new();
        if annulus_capacity > tolerance {
            annulus.push_back(Parcel::new(annulus_fill, annulus_capacity, Origin::InHole));
        }
        Self {
            string,
            annulus,
            string_capacity: string_capacity.max(0.0),
            annulus_capacity: annulus_capacity.max(0.0),
            rathole: 0.0,
            returned: Vec::new(),
            vented_air: 0.0,
            tolerance,
        }
    }

    /// Keep the bottom `volume` of the annulus out of circulation.
    pub fn with_rathole(mut self, volume: f64) -> Self {
        self.rathole = if volume > self.tolerance {
            volume.min(self.annulus_capacity)
        } else {
            0.0
        };
        self
    }

    pub fn parcels(&self, side: Side) -> &VecDeque<Parcel> {
        match side {
            Side::String => &self.string,
            Side::Annulus => &self.annulus,
        }
    }

    pub fn returned(&self) -> &[Parcel] {
        &self.returned
    }

    pub fn vented_air(&self) -> f64 {
        self.vented_air
    }

    pub fn capacity(&self, side: Side) -> f64 {
        match side {
            Side::String => self.string_capacity,
            Side::Annulus => self.annulus_capacity,
        }
    }

    /// Volume between the injection point of `side` and the surface.
    pub fn path_capacity(&self, side: Side) -> f64 {
        let above_bit = self.annulus_capacity - self.rathole;
        match side {
            Side::String => self.string_capacity + above_bit,
            Side::Annulus => above_bit,
        }
    }

    /// Pump a parcel into `side`.
    pub fn inject(&mut self, side: Side, parcel: Parcel) {
        if parcel.volume <= self.tolerance {
            return;
        }
        match side {
            Side::String => self.inject_string(parcel),
            Side::Annulus => self.inject_annulus(parcel),
        }
    }

    fn inject_string(&mut self, parcel: Parcel) {
        push_front_merged(&mut self.string, parcel);
        let excess = total(&self.string) - self.string_capacity;
        if excess <= self.tolerance {
            return;
        }
        for out in take_from_back(&mut self.string, excess) {
            if out.fluid.is_some() {
                self.inject_annulus(out);
            } else {
                self.vented_air += out.volume;
            }
        }
    }

    fn inject_annulus(&mut self, parcel: Parcel) {
        let mut rathole = take_from_back(&mut self.annulus, self.rathole);
        push_back_merged(&mut self.annulus, parcel);
        // Bottom-first order, so the shallowest piece goes back first
        while let Some(below) = rathole.pop() {
            push_back_merged(&mut self.annulus, below);
        }
        let excess = total(&self.annulus) - self.annulus_capacity;
        if excess <= self.tolerance {
            return;
        }
        for out in take_from_front(&mut self.annulus, excess) {
            match self.returned.last_mut() {
                Some(last) if last.same_kind(&out) => last.volume += out.volume,
                _ => self.returned.push(out),
            }
        }
    }

    /// Resolve parcels into depth segments for one compartment.
    ///
    /// Segments cover `[0, bottom_md]` exactly, with adjacent same-fluid
    /// segments merged. `color_of` supplies the display color of a fluid.
    pub fn segments<F>(
        &self,
        geom: &CompartmentGeometry,
        depth_tolerance: f64,
        color_of: F,
    ) -> Vec<FluidSegment>
    where
        F: Fn(Option<FluidIndex>) -> Option<String>,
    {
        let bottom = geom.bottom_md();
        let mut segments: Vec<FluidSegment> = Vec::new();
        if bottom <= 0.0 {
            return segments;
        }

        let mut cumulative = 0.0;
        let mut top = 0.0;
        let count = self.parcels(geom.side()).len();
        for (i, parcel) in self.parcels(geom.side()).iter().enumerate() {
            cumulative += parcel.volume;
            let seg_bottom = if i + 1 == count {
                bottom
            } else {
                volume::depth_below(geom, 0.0, cumulative).min(bottom)
            };
            if seg_bottom - top <= depth_tolerance {
                continue;
            }
            match segments.last_mut() {
                Some(last) if last.fluid == parcel.fluid => last.bottom_md = seg_bottom,
                _ => segments.push(FluidSegment {
                    top_md: top,
                    bottom_md: seg_bottom,
                    fluid: parcel.fluid,
                    color: color_of(parcel.fluid),
                }),
            }
            top = seg_bottom;
        }

        // A sliver dropped at the very bottom leaves the last segment short
        if let Some(last) = segments.last_mut() {
            last.bottom_md = bottom;
        }
        segments
    }

    /// Resolve both compartments.
    pub fn to_fluid_stack<F>(
        &self,
        string_geom: &CompartmentGeometry,
        annulus_geom: &CompartmentGeometry,
        depth_tolerance: f64,
        color_of: F,
    ) -> FluidStack
    where
        F: Fn(Option<FluidIndex>) -> Option<String>,
    {
        FluidStack {
            string: self.segments(string_geom, depth_tolerance, &color_of),
            annulus: self.segments(annulus_geom, depth_tolerance, &color_of),
        }
    }
}

fn total(parcels: &VecDeque<Parcel>) -> f64 {
    parcels.iter().map(|p| p.volume).sum()
}

fn push_front_merged(parcels: &mut VecDeque<Parcel>, parcel: Parcel) {
    match parcels.front_mut() {
        Some(first) if first.same_kind(&parcel) => first.volume += parcel.volume,
        _ => parcels.push_front(parcel),
    }
}

fn push_back_merged(parcels: &mut VecDeque<Parcel>, parcel: Parcel) {
    match parcels.back_mut() {
        Some(last) if last.same_kind(&parcel) => last.volume += parcel.volume,
        _ => parcels.push_back(parcel),
    }
}

/// Remove `amount` from the bottom; returned parcels are in exit order.
fn take_from_back(parcels: &mut VecDeque<Parcel>, amount: f64) -> Vec<Parcel> {
    let mut out = Vec::new();
    let mut remaining = amount;
    while remaining > 0.0 {
        let Some(last) = parcels.back_mut() else { break };
        if last.volume <= remaining {
            remaining -= last.volume;
            if let Some(p) = parcels.pop_back() {
                out.push(p);
            }
        } else {
            last.volume -= remaining;
            out.push(Parcel::new(last.fluid, remaining, last.origin));
            remaining = 0.0;
        }
    }
    out
}

/// Remove `amount` from the top; returned parcels are in exit order.
fn take_from_front(parcels: &mut VecDeque<Parcel>, amount: f64) -> Vec<Parcel> {
    let mut out = Vec::new();
    let mut remaining = amount;
    while remaining > 0.0 {
        let Some(first) = parcels.front_mut() else { break };
        if first.volume <= remaining {
            remaining -= first.volume;
            if let Some(p) = parcels.pop_front() {
                out.push(p);
            }
        } else {
            first.volume -= remaining;
            out.push(Parcel::new(first.fluid, remaining, first.origin));
            remaining = 0.0;
        }
    }
    out
}
