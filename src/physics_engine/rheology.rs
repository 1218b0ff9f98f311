//! Friction-pressure gradients per rheology model
//!
//! Each model has its own laminar closed form for pipe flow and for annular
//! flow (narrow-slot approximation, hydraulic diameter ID − OD):
//!
//! | Model            | Pipe (D = bore)                    | Annulus (Dh = ID − OD)           |
//! |------------------|------------------------------------|----------------------------------|
//! | Newtonian        | 32·μ·v / D²                        | 48·μ·v / Dh²                     |
//! | Bingham          | 32·μp·v / D² + 16·τy / (3·D)       | 48·μp·v / Dh² + 6·τy / Dh        |
//! | Power-law        | 4·K·γwⁿ / D                        | 4·K·γwⁿ / Dh                     |
//! | Herschel–Bulkley | 4·(τy + K·γwⁿ) / D                 | 4·(τy + K·γwⁿ) / Dh              |
//!
//! with wall shear rate γw = (3n+1)/(4n)·8v/D in pipes and
//! (2n+1)/(3n)·12v/Dh in the slot.
//!
//! Turbulence is judged on the Metzner–Reed generalised Reynolds number.
//! The turbulent Fanning factor is Dodge–Metzner for the model's flow index
//! (n = 1 for Newtonian and Bingham), scaled by the Swamee–Jain rough/smooth
//! ratio when the wall has roughness. Between the laminar and turbulent
//! limits the two gradients are blended linearly, and the result is never
//! below the laminar gradient.

use crate::types::{Rheology, Section, Side};

/// Flow-path cross-section seen by the fluid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowChannel {
    pub side: Side,
    /// Flow area (m²)
    pub area_m2: f64,
    /// Hydraulic diameter (m)
    pub hydraulic_diameter_m: f64,
    /// Absolute roughness (m)
    pub roughness_m: f64,
}

impl FlowChannel {
    pub fn for_section(section: &Section, side: Side) -> Self {
        Self {
            side,
            area_m2: section.flow_area(side),
            hydraulic_diameter_m: section.hydraulic_diameter(side),
            roughness_m: section.roughness,
        }
    }

    /// Mean velocity (m/s) for a volumetric rate (m³/s).
    pub fn velocity(&self, rate_m3_s: f64) -> f64 {
        if self.area_m2 <= 0.0 {
            0.0
        } else {
            rate_m3_s.abs() / self.area_m2
        }
    }

    /// Nominal (Newtonian) wall shear rate 8v/D or 12v/Dh (1/s).
    fn nominal_shear_rate(&self, velocity: f64) -> f64 {
        match self.side {
            Side::String => 8.0 * velocity / self.hydraulic_diameter_m,
            Side::Annulus => 12.0 * velocity / self.hydraulic_diameter_m,
        }
    }

    /// Rabinowitsch–Mooney style correction of the nominal shear rate.
    fn wall_shear_rate(&self, velocity: f64, n: f64) -> f64 {
        let correction = match self.side {
            Side::String => (3.0 * n + 1.0) / (4.0 * n),
            Side::Annulus => (2.0 * n + 1.0) / (3.0 * n),
        };
        correction * self.nominal_shear_rate(velocity)
    }
}

/// Reynolds limits bounding the laminar/turbulent transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeLimits {
    pub laminar: f64,
    pub turbulent: f64,
}

impl Default for RegimeLimits {
    fn default() -> Self {
        Self {
            laminar: crate::config::defaults::LAMINAR_REYNOLDS_LIMIT,
            turbulent: crate::config::defaults::TURBULENT_REYNOLDS_LIMIT,
        }
    }
}

/// Flow regime of a friction evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRegime {
    Static,
    Laminar,
    Transitional,
    Turbulent,
}

/// Full result of one friction-gradient evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionGradient {
    /// Pressure gradient (Pa/m)
    pub gradient_pa_m: f64,
    pub reynolds: f64,
    pub regime: FlowRegime,
}

impl FrictionGradient {
    const STATIC: Self = Self {
        gradient_pa_m: 0.0,
        reynolds: 0.0,
        regime: FlowRegime::Static,
    };
}

impl Rheology {
    /// Flow-behaviour index used for the turbulent friction factor.
    pub fn flow_index(&self) -> f64 {
        match *self {
            Rheology::Newtonian { .. } | Rheology::Bingham { .. } => 1.0,
            Rheology::PowerLaw { flow_index, .. }
            | Rheology::HerschelBulkley { flow_index, .. } => flow_index,
        }
    }

    /// Laminar frictional pressure gradient (Pa/m) at mean velocity `v`.
    pub fn laminar_gradient(&self, velocity: f64, channel: &FlowChannel) -> f64 {
        let d = channel.hydraulic_diameter_m;
        if velocity <= 0.0 || d <= 0.0 {
            return 0.0;
        }
        match (*self, channel.side) {
            (Rheology::Newtonian { viscosity_pa_s }, Side::String) => {
                32.0 * viscosity_pa_s * velocity / (d * d)
            }
            (Rheology::Newtonian { viscosity_pa_s }, Side::Annulus) => {
                48.0 * viscosity_pa_s * velocity / (d * d)
            }
            (
                Rheology::Bingham {
                    plastic_viscosity_pa_s,
                    yield_point_pa,
                },
                Side::String,
            ) => {
                32.0 * plastic_viscosity_pa_s * velocity / (d * d)
                    + 16.0 * yield_point_pa / (3.0 * d)
            }
            (
                Rheology::Bingham {
                    plastic_viscosity_pa_s,
                    yield_point_pa,
                },
                Side::Annulus,
            ) => 48.0 * plastic_viscosity_pa_s * velocity / (d * d) + 6.0 * yield_point_pa / d,
            (
                Rheology::PowerLaw {
                    consistency_pa_sn,
                    flow_index,
                },
                _,
            ) => {
                let gamma_w = channel.wall_shear_rate(velocity, flow_index);
                4.0 * consistency_pa_sn * gamma_w.powf(flow_index) / d
            }
            (
                Rheology::HerschelBulkley {
                    yield_stress_pa,
                    consistency_pa_sn,
                    flow_index,
                },
                _,
            ) => {
                let gamma_w = channel.wall_shear_rate(velocity, flow_index);
                4.0 * (yield_stress_pa + consistency_pa_sn * gamma_w.powf(flow_index)) / d
            }
        }
    }

    /// Frictional pressure gradient (Pa/m) for `rate_m3_s` through `channel`.
    pub fn friction_gradient(
        &self,
        density_kg_m3: f64,
        rate_m3_s: f64,
        channel: &FlowChannel,
        limits: RegimeLimits,
    ) -> FrictionGradient {
        let velocity = channel.velocity(rate_m3_s);
        let d = channel.hydraulic_diameter_m;
        if !velocity.is_finite() || velocity <= 0.0 || d <= 0.0 {
            return FrictionGradient::STATIC;
        }

        let laminar = self.laminar_gradient(velocity, channel);
        let reynolds = generalized_reynolds(density_kg_m3, velocity, laminar, channel);

        if reynolds <= limits.laminar {
            return FrictionGradient {
                gradient_pa_m: laminar,
                reynolds,
                regime: FlowRegime::Laminar,
            };
        }

        let fanning = turbulent_fanning(reynolds, self.flow_index(), channel);
        let turbulent = 2.0 * fanning * density_kg_m3 * velocity * velocity / d;

        let fully_turbulent = reynolds >= limits.turbulent || limits.turbulent <= limits.laminar;
        let (gradient, regime) = if fully_turbulent {
            (turbulent, FlowRegime::Turbulent)
        } else {
            let w = (reynolds - limits.laminar) / (limits.turbulent - limits.laminar);
            (laminar + w * (turbulent - laminar), FlowRegime::Transitional)
        };

        FrictionGradient {
            gradient_pa_m: gradient.max(laminar),
            reynolds,
            regime,
        }
    }
}

/// Metzner–Reed Reynolds number ρ·v·D / μapp with μapp = τw / γnominal.
fn generalized_reynolds(
    density: f64,
    velocity: f64,
    laminar_gradient: f64,
    channel: &FlowChannel,
) -> f64 {
    let d = channel.hydraulic_diameter_m;
    let wall_stress = laminar_gradient * d / 4.0;
    let shear = channel.nominal_shear_rate(velocity);
    if wall_stress <= 0.0 || shear <= 0.0 || density <= 0.0 {
        return 0.0;
    }
    let apparent_viscosity = wall_stress / shear;
    density * velocity * d / apparent_viscosity
}

/// Dodge–Metzner Fanning friction factor, corrected for wall roughness.
fn turbulent_fanning(reynolds: f64, flow_index: f64, channel: &FlowChannel) -> f64 {
    let n = flow_index.clamp(0.1, 2.0);
    let a = (n.log10() + 3.93) / 50.0;
    let b = (1.75 - n.log10()) / 7.0;
    let smooth = a / reynolds.powf(b);

    let relative_roughness = channel.roughness_m / channel.hydraulic_diameter_m;
    if relative_roughness > 0.0 {
        smooth * swamee_jain(reynolds, relative_roughness) / swamee_jain(reynolds, 0.0)
    } else {
        smooth
    }
}

/// Swamee–Jain explicit Darcy friction factor.
fn swamee_jain(reynolds: f64, relative_roughness: f64) -> f64 {
    let log_term = (relative_roughness / 3.7 + 5.74 / reynolds.powf(0.9)).log10();
    0.25 / (log_term * log_term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe() -> FlowChannel {
        FlowChannel::for_section(&Section::new("dp", 0.0, 800.0, 0.095, 0.127), Side::String)
    }

    fn annulus() -> FlowChannel {
        FlowChannel::for_section(&Section::new("oh", 0.0, 800.0, 0.244, 0.127), Side::Annulus)
    }

    const SLOW: f64 = 0.2 / 60.0; // 0.2 m³/min

    #[test]
    fn test_zero_rate_is_static() {
        let r = Rheology::Newtonian { viscosity_pa_s: 0.001 };
        let g = r.friction_gradient(1000.0, 0.0, &pipe(), RegimeLimits::default());
        assert_eq!(g.gradient_pa_m, 0.0);
        assert_eq!(g.regime, FlowRegime::Static);
    }

    #[test]
    fn test_newtonian_laminar_matches_hagen_poiseuille() {
        let mu = 0.5;
        let r = Rheology::Newtonian { viscosity_pa_s: mu };
        let ch = pipe();
        let v = ch.velocity(SLOW);
        let g = r.friction_gradient(1200.0, SLOW, &ch, RegimeLimits::default());
        assert_eq!(g.regime, FlowRegime::Laminar);
        let expected = 32.0 * mu * v / (0.095 * 0.095);
        assert!((g.gradient_pa_m - expected).abs() < 1e-9);
    }

    #[test]
    fn test_power_law_n1_equals_newtonian() {
        let newtonian = Rheology::Newtonian { viscosity_pa_s: 0.03 };
        let power = Rheology::PowerLaw {
            consistency_pa_sn: 0.03,
            flow_index: 1.0,
        };
        for ch in [pipe(), annulus()] {
            for rate in [SLOW, 1.5 / 60.0, 4.0 / 60.0] {
                let a = newtonian.friction_gradient(1300.0, rate, &ch, RegimeLimits::default());
                let b = power.friction_gradient(1300.0, rate, &ch, RegimeLimits::default());
                assert!(
                    (a.gradient_pa_m - b.gradient_pa_m).abs() < 1e-9 * a.gradient_pa_m.max(1.0),
                    "{a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn test_bingham_and_power_law_differ() {
        let bingham = Rheology::Bingham {
            plastic_viscosity_pa_s: 0.02,
            yield_point_pa: 8.0,
        };
        let power = Rheology::PowerLaw {
            consistency_pa_sn: 0.4,
            flow_index: 0.6,
        };
        let ch = annulus();
        let a = bingham.friction_gradient(1260.0, 1.0 / 60.0, &ch, RegimeLimits::default());
        let b = power.friction_gradient(1260.0, 1.0 / 60.0, &ch, RegimeLimits::default());
        assert!((a.gradient_pa_m - b.gradient_pa_m).abs() > 1.0);
    }

    #[test]
    fn test_herschel_bulkley_without_yield_is_power_law() {
        let hb = Rheology::HerschelBulkley {
            yield_stress_pa: 0.0,
            consistency_pa_sn: 0.4,
            flow_index: 0.7,
        };
        let pl = Rheology::PowerLaw {
            consistency_pa_sn: 0.4,
            flow_index: 0.7,
        };
        let ch = pipe();
        let a = hb.friction_gradient(1260.0, SLOW, &ch, RegimeLimits::default());
        let b = pl.friction_gradient(1260.0, SLOW, &ch, RegimeLimits::default());
        assert!((a.gradient_pa_m - b.gradient_pa_m).abs() < 1e-9);
    }

    #[test]
    fn test_water_turbulent_at_high_rate() {
        let water = Rheology::Newtonian { viscosity_pa_s: 0.001 };
        let g = water.friction_gradient(1000.0, 2.0 / 60.0, &pipe(), RegimeLimits::default());
        assert_eq!(g.regime, FlowRegime::Turbulent);
        assert!(g.reynolds > 4000.0);
        // Laminar would be far smaller than the turbulent gradient here
        let laminar = water.laminar_gradient(pipe().velocity(2.0 / 60.0), &pipe());
        assert!(g.gradient_pa_m > laminar);
    }

    #[test]
    fn test_roughness_increases_turbulent_friction() {
        let water = Rheology::Newtonian { viscosity_pa_s: 0.001 };
        let smooth = pipe();
        let rough = FlowChannel {
            roughness_m: 0.0005,
            ..smooth
        };
        let a = water.friction_gradient(1000.0, 2.0 / 60.0, &smooth, RegimeLimits::default());
        let b = water.friction_gradient(1000.0, 2.0 / 60.0, &rough, RegimeLimits::default());
        assert!(b.gradient_pa_m > a.gradient_pa_m);
    }

    #[test]
    fn test_gradient_monotonic_in_rate() {
        let mud = Rheology::Bingham {
            plastic_viscosity_pa_s: 0.015,
            yield_point_pa: 5.0,
        };
        let ch = annulus();
        let mut last = 0.0;
        for i in 1..=40 {
            let rate = f64::from(i) * 0.1 / 60.0;
            let g = mud.friction_gradient(1260.0, rate, &ch, RegimeLimits::default());
            assert!(g.gradient_pa_m >= last, "gradient dropped at {rate}");
            last = g.gradient_pa_m;
        }
    }
}
