//! Hydraulics evaluator
//!
//! Integrates each compartment from surface down to the control depth:
//!
//! - hydrostatic: Σ ρ·g·ΔTVD over the segments, TVD from the project survey
//! - friction: Σ (dP/dL)·ΔMD over every segment/section piece, the gradient
//!   chosen by the segment fluid's rheology and the piece's flow geometry
//!
//! The same volumetric rate flows in both compartments. Air carries neither
//! weight nor friction. From the two columns:
//!
//! ```text
//! annulus_at_control = annulus hydrostatic + annulus friction + SBP
//! string_at_control  = string hydrostatic + string friction
//! BHP = annulus_at_control
//! ECD = BHP / (g · TVD(control))
//! TCP = string_at_control + annulus friction
//! ```

use super::rheology::FlowChannel;
use super::{volume, EngineSettings};
use crate::config::defaults::SECONDS_PER_MINUTE;
use crate::project::ProjectSnapshot;
use crate::types::{
    push_unique, Diagnostic, Evaluated, FluidIndex, FluidSegment, FluidStack, HydraulicsResult,
    MpdSettings, ProfilePoint, Rheology, Side, TvdLookup,
};

/// Pressure contributions of one compartment down to the control depth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Column {
    /// Pa
    pub hydrostatic: f64,
    /// Pa
    pub friction: f64,
    /// Depth the integration actually reached (m)
    pub reached_md: f64,
}

impl Column {
    pub fn total(&self) -> f64 {
        self.hydrostatic + self.friction
    }
}

/// Evaluate pressures at `control_md` for a fluid stack pumped at `rate_m3_min`.
pub fn evaluate(
    project: &ProjectSnapshot,
    settings: &EngineSettings,
    stack: &FluidStack,
    rate_m3_min: f64,
    control_md: f64,
    mpd: &MpdSettings,
) -> Evaluated<HydraulicsResult> {
    let mut diagnostics = Vec::new();

    let rate_m3_min = finite_or_zero(rate_m3_min, "pump_rate_m3_min", &mut diagnostics).abs();
    let control_md = finite_or_zero(control_md, "control_md", &mut diagnostics);
    let rate_m3_s = rate_m3_min / SECONDS_PER_MINUTE;

    let string = column(
        project,
        settings,
        Side::String,
        &stack.string,
        rate_m3_s,
        control_md,
        &mut diagnostics,
    );
    let annulus = column(
        project,
        settings,
        Side::Annulus,
        &stack.annulus,
        rate_m3_s,
        control_md,
        &mut diagnostics,
    );

    let g = settings.gravity;
    let tvd = project.survey().tvd(annulus.reached_md);

    let sbp = if mpd.enabled {
        back_pressure(mpd, g, tvd, &annulus, &mut diagnostics)
    } else {
        0.0
    };

    let annulus_at_control = annulus.total() + sbp;
    let string_at_control = string.total();
    let bhp = annulus_at_control;

    let ecd = if tvd > 0.0 && g > 0.0 {
        bhp / (g * tvd)
    } else {
        push_unique(&mut diagnostics, Diagnostic::ZeroVerticalDepth { control_md });
        0.0
    };

    let result = HydraulicsResult {
        bhp_pa: bhp,
        ecd_kg_m3: ecd,
        sbp_pa: sbp,
        tcp_pa: string_at_control + annulus.friction,
        annulus_friction_pa: annulus.friction,
        string_friction_pa: string.friction,
        annulus_hydrostatic_pa: annulus.hydrostatic,
        string_hydrostatic_pa: string.hydrostatic,
        annulus_at_control_pa: annulus_at_control,
        string_at_control_pa: string_at_control,
        control_md,
        control_tvd: tvd,
        pump_rate_m3_min: rate_m3_min,
    };
    tracing::trace!(
        bhp_pa = result.bhp_pa,
        ecd = result.ecd_kg_m3,
        tcp_pa = result.tcp_pa,
        control_md,
        "hydraulics evaluated"
    );
    Evaluated::new(result, diagnostics)
}

/// Annulus and string pressure at each of `depths`.
pub fn profile(
    project: &ProjectSnapshot,
    settings: &EngineSettings,
    stack: &FluidStack,
    rate_m3_min: f64,
    depths: &[f64],
    mpd: &MpdSettings,
) -> Evaluated<Vec<ProfilePoint>> {
    let mut diagnostics = Vec::new();
    let points = depths
        .iter()
        .map(|&md| {
            let eval = evaluate(project, settings, stack, rate_m3_min, md, mpd);
            for d in eval.diagnostics {
                push_unique(&mut diagnostics, d);
            }
            ProfilePoint {
                md,
                tvd: eval.value.control_tvd,
                annulus_pressure_pa: eval.value.annulus_at_control_pa,
                string_pressure_pa: eval.value.string_at_control_pa,
                annulus_ecd_kg_m3: eval.value.ecd_kg_m3,
            }
        })
        .collect();
    Evaluated::new(points, diagnostics)
}

/// Integrate one compartment from surface to `control_md`.
///
/// Zero contributions (with a diagnostic) for an empty compartment or a
/// control depth at or above surface. A control depth below the
/// compartment is integrated to the compartment bottom.
pub fn column(
    project: &ProjectSnapshot,
    settings: &EngineSettings,
    side: Side,
    segments: &[FluidSegment],
    rate_m3_s: f64,
    control_md: f64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Column {
    let geom = project.geometry().compartment(side);
    if geom.is_empty() {
        push_unique(diagnostics, Diagnostic::EmptyCompartment { side });
        return Column::default();
    }
    let bottom = geom.bottom_md();
    if control_md <= 0.0 {
        push_unique(
            diagnostics,
            Diagnostic::ControlDepthOutOfRange { side, control_md, bottom_md: bottom },
        );
        return Column::default();
    }
    if control_md > bottom + settings.depth_tolerance_m {
        push_unique(
            diagnostics,
            Diagnostic::ControlDepthOutOfRange { side, control_md, bottom_md: bottom },
        );
    }
    let limit = control_md.min(bottom);

    let survey = project.survey();
    let mut col = Column {
        reached_md: limit,
        ..Column::default()
    };

    for segment in segments {
        let top = segment.top_md;
        let bot = segment.bottom_md.min(limit);
        if bot <= top {
            continue;
        }
        let Some(index) = segment.fluid else {
            continue;
        };
        let (density, rheology) = fluid_properties(project, settings, index, diagnostics);

        col.hydrostatic += density * settings.gravity * (survey.tvd(bot) - survey.tvd(top));

        if rate_m3_s > 0.0 {
            for (piece_top, piece_bottom, section) in volume::pieces(geom, top, bot) {
                let channel = FlowChannel::for_section(section, side);
                let gradient =
                    rheology.friction_gradient(density, rate_m3_s, &channel, settings.regime);
                col.friction += gradient.gradient_pa_m * (piece_bottom - piece_top);
            }
        }
    }
    col
}

/// Density and rheology of a fluid, or of the default fluid when unresolved.
fn fluid_properties(
    project: &ProjectSnapshot,
    settings: &EngineSettings,
    index: FluidIndex,
    diagnostics: &mut Vec<Diagnostic>,
) -> (f64, Rheology) {
    match project.fluid(index) {
        Some(fluid) => (fluid.density_kg_m3, fluid.rheology),
        None => {
            push_unique(
                diagnostics,
                Diagnostic::MissingFluid {
                    reference: if index.is_default() {
                        "default".to_string()
                    } else {
                        format!("index {}", index.0)
                    },
                },
            );
            let fallback = settings.default_fluid();
            (fallback.density_kg_m3, fallback.rheology)
        }
    }
}

/// Surface back pressure: solved from the target ECD when one is set,
/// otherwise the fixed back pressure.
fn back_pressure(
    mpd: &MpdSettings,
    g: f64,
    tvd: f64,
    annulus: &Column,
    diagnostics: &mut Vec<Diagnostic>,
) -> f64 {
    match mpd.target_ecd_kg_m3 {
        Some(target) if target.is_finite() => (target * g * tvd - annulus.total()).max(0.0),
        Some(_) => {
            push_unique(
                diagnostics,
                Diagnostic::NonFiniteInput {
                    field: "mpd.target_ecd_kg_m3".into(),
                },
            );
            0.0
        }
        None => finite_or_zero(mpd.back_pressure_pa, "mpd.back_pressure_pa", diagnostics).max(0.0),
    }
}

fn finite_or_zero(value: f64, field: &str, diagnostics: &mut Vec<Diagnostic>) -> f64 {
    if value.is_finite() {
        value
    } else {
        push_unique(diagnostics, Diagnostic::NonFiniteInput { field: field.to_string() });
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Fluid, Section, Survey, WellGeometry};

    const G: f64 = 9.81;

    fn project(survey: Survey) -> ProjectSnapshot {
        let geometry = WellGeometry::new(
            vec![Section::new("dp", 0.0, 800.0, 0.095, 0.127)],
            vec![Section::new("oh", 0.0, 800.0, 0.244, 0.127)],
        )
        .unwrap();
        ProjectSnapshot::new(
            "t",
            geometry,
            vec![
                Fluid::new(
                    "active",
                    1260.0,
                    Rheology::Bingham {
                        plastic_viscosity_pa_s: 0.02,
                        yield_point_pa: 7.0,
                    },
                ),
                Fluid::new("heavy", 1855.0, Rheology::default()),
            ],
            "active",
            survey,
        )
        .unwrap()
    }

    fn run(
        p: &ProjectSnapshot,
        stack: &FluidStack,
        rate_m3_min: f64,
        control_md: f64,
        mpd: &MpdSettings,
    ) -> Evaluated<HydraulicsResult> {
        evaluate(p, &EngineSettings::default(), stack, rate_m3_min, control_md, mpd)
    }

    fn full_of(fluid: Option<FluidIndex>) -> FluidStack {
        let seg = FluidSegment {
            top_md: 0.0,
            bottom_md: 800.0,
            fluid,
            color: None,
        };
        FluidStack {
            string: vec![seg.clone()],
            annulus: vec![seg],
        }
    }

    #[test]
    fn test_static_column_is_pure_hydrostatic() {
        let p = project(Survey::vertical());
        let eval = run(&p, &full_of(Some(FluidIndex(0))), 0.0, 800.0, &MpdSettings::default());
        assert!(eval.is_clean(), "{:?}", eval.diagnostics);
        let r = eval.value;
        let expected = 1260.0 * G * 800.0;
        assert!((r.bhp_pa - expected).abs() < 1e-6);
        assert!((r.ecd_kg_m3 - 1260.0).abs() < 1e-9);
        assert_eq!(r.annulus_friction_pa, 0.0);
        assert_eq!(r.string_friction_pa, 0.0);
        assert!((r.tcp_pa - expected).abs() < 1e-6);
    }

    #[test]
    fn test_circulating_adds_friction_and_ecd() {
        let p = project(Survey::vertical());
        let r = run(&p, &full_of(Some(FluidIndex(0))), 2.0, 800.0, &MpdSettings::default()).value;
        assert!(r.annulus_friction_pa > 0.0);
        assert!(r.string_friction_pa > 0.0);
        assert!(r.ecd_kg_m3 > 1260.0);
        assert!((r.tcp_pa - (r.string_at_control_pa + r.annulus_friction_pa)).abs() < 1e-9);
        assert!((r.bhp_pa - r.annulus_at_control_pa).abs() < 1e-9);
    }

    #[test]
    fn test_air_weighs_nothing() {
        let p = project(Survey::vertical());
        let r = run(&p, &full_of(None), 3.0, 800.0, &MpdSettings::default()).value;
        assert_eq!(r.bhp_pa, 0.0);
        assert_eq!(r.string_at_control_pa, 0.0);
    }

    #[test]
    fn test_deviated_well_uses_tvd() {
        let p = project(Survey::from_md_tvd(&[(800.0, 600.0)]));
        let r = run(&p, &full_of(Some(FluidIndex(0))), 0.0, 800.0, &MpdSettings::default()).value;
        assert!((r.bhp_pa - 1260.0 * G * 600.0).abs() < 1e-6);
        assert!((r.ecd_kg_m3 - 1260.0).abs() < 1e-9);
    }

    #[test]
    fn test_mpd_target_ecd_sets_back_pressure() {
        let p = project(Survey::vertical());
        let mpd = MpdSettings {
            enabled: true,
            back_pressure_pa: 0.0,
            target_ecd_kg_m3: Some(1300.0),
        };
        let r = run(&p, &full_of(Some(FluidIndex(0))), 0.0, 800.0, &mpd).value;
        assert!((r.sbp_pa - 40.0 * G * 800.0).abs() < 1e-6);
        assert!((r.ecd_kg_m3 - 1300.0).abs() < 1e-9);

        // Target below the hydrostatic: no negative back pressure
        let under = MpdSettings {
            target_ecd_kg_m3: Some(1000.0),
            ..mpd
        };
        let r = run(&p, &full_of(Some(FluidIndex(0))), 0.0, 800.0, &under).value;
        assert_eq!(r.sbp_pa, 0.0);
    }

    #[test]
    fn test_fixed_back_pressure_only_when_enabled() {
        let p = project(Survey::vertical());
        let stack = full_of(Some(FluidIndex(0)));
        let mut mpd = MpdSettings {
            enabled: false,
            back_pressure_pa: 1.0e6,
            target_ecd_kg_m3: None,
        };
        let off = run(&p, &stack, 0.0, 800.0, &mpd).value;
        mpd.enabled = true;
        let on = run(&p, &stack, 0.0, 800.0, &mpd).value;
        assert_eq!(off.sbp_pa, 0.0);
        assert!((on.bhp_pa - off.bhp_pa - 1.0e6).abs() < 1e-6);
    }

    #[test]
    fn test_control_depth_at_surface_yields_zero_with_diagnostic() {
        let p = project(Survey::vertical());
        let eval = run(&p, &full_of(Some(FluidIndex(0))), 1.0, 0.0, &MpdSettings::default());
        assert_eq!(eval.value.bhp_pa, 0.0);
        assert_eq!(eval.value.ecd_kg_m3, 0.0);
        assert!(eval
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::ControlDepthOutOfRange { .. })));
        assert!(eval.diagnostics.contains(&Diagnostic::ZeroVerticalDepth { control_md: 0.0 }));
    }

    #[test]
    fn test_control_depth_below_well_integrates_whole_column() {
        let p = project(Survey::vertical());
        let eval = run(&p, &full_of(Some(FluidIndex(0))), 0.0, 1200.0, &MpdSettings::default());
        assert!((eval.value.bhp_pa - 1260.0 * G * 800.0).abs() < 1e-6);
        assert!(eval.diagnostics.contains(&Diagnostic::ControlDepthOutOfRange {
            side: Side::Annulus,
            control_md: 1200.0,
            bottom_md: 800.0,
        }));
    }

    #[test]
    fn test_unresolved_fluid_uses_default_density() {
        let p = project(Survey::vertical());
        let stack = full_of(Some(FluidIndex::DEFAULT));
        let eval = run(&p, &stack, 0.0, 800.0, &MpdSettings::default());
        assert!((eval.value.bhp_pa - 1000.0 * G * 800.0).abs() < 1e-6);
        assert_eq!(
            eval.diagnostics,
            vec![Diagnostic::MissingFluid {
                reference: "default".into()
            }]
        );
    }

    #[test]
    fn test_profile_increases_with_depth() {
        let p = project(Survey::vertical());
        let depths = [200.0, 400.0, 800.0];
        let stack = full_of(Some(FluidIndex(0)));
        let settings = EngineSettings::default();
        let prof = profile(&p, &settings, &stack, 1.5, &depths, &MpdSettings::default());
        assert!(prof.is_clean());
        assert_eq!(prof.value.len(), 3);
        assert!(prof.value.windows(2).all(|w| w[1].annulus_pressure_pa > w[0].annulus_pressure_pa));
    }
}
