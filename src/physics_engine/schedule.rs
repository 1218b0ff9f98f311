//! Stage schedule builder
//!
//! Turns the project's schedule source into an ordered stage list:
//!
//! - **Program**: one stage per program entry, in order, pumped down the
//!   string (down the string, round the bit, up the annulus to surface).
//! - **Final layers**: per compartment the target layers are clipped to the
//!   compartment, gaps are filled with the active mud, and adjacent layers of
//!   the same fluid are merged. Annulus stages come first, top layer first,
//!   because annulus fluid enters at the bit and rises. String stages
//!   follow, bottom layer first, because string fluid enters at surface and
//!   sinks. Leading layers that already match the compartment's starting
//!   fluid need no pumping and are skipped. Annulus hole below the bit and,
//!   when the string starts full of liquid, the bottom of the annulus that
//!   liquid is pushed into cannot be targeted; that part is reported.
//!
//! Building never fails. Missing fluids resolve to the default fluid and
//! unusable volumes become zero, each with a diagnostic.

use tracing::debug;

use super::{volume, EngineSettings};
use crate::config::InitialStringFill;
use crate::project::ProjectSnapshot;
use crate::types::{
    push_unique, CompartmentGeometry, Diagnostic, Evaluated, FluidIndex, ScheduleMode, Side, Stage,
};

/// Build the stage list for the project's current schedule mode.
pub fn build_stages(project: &ProjectSnapshot, settings: &EngineSettings) -> Evaluated<Vec<Stage>> {
    let mut built = match project.mode() {
        ScheduleMode::Program => program_stages(project),
        ScheduleMode::FinalLayers => final_layer_stages(project, settings),
    };
    for d in project.load_diagnostics().iter().rev() {
        if !built.diagnostics.contains(d) {
            built.diagnostics.insert(0, d.clone());
        }
    }
    debug!(
        mode = %project.mode(),
        stages = built.value.len(),
        diagnostics = built.diagnostics.len(),
        "stages built"
    );
    built
}

/// Fluid each compartment holds before the first stage: `None` is air.
pub fn initial_fill(
    project: &ProjectSnapshot,
    settings: &EngineSettings,
    side: Side,
) -> Evaluated<Option<FluidIndex>> {
    let active = project.active();
    let air = match side {
        Side::Annulus => false,
        Side::String => match settings.initial_string {
            InitialStringFill::Active => false,
            InitialStringFill::Air => true,
            InitialStringFill::Auto => project.mode() == ScheduleMode::FinalLayers,
        },
    };
    if air {
        Evaluated::clean(None)
    } else {
        active.map(Some)
    }
}

// ============================================================================
// Program Mode
// ============================================================================

fn program_stages(project: &ProjectSnapshot) -> Evaluated<Vec<Stage>> {
    let mut diagnostics = Vec::new();
    let mut stages = Vec::with_capacity(project.program().len());

    for (i, entry) in project.program().iter().enumerate() {
        let resolved = project.resolve(&entry.fluid_id);
        for d in resolved.diagnostics {
            push_unique(&mut diagnostics, d);
        }
        let fluid = resolved.value;

        let total_volume_m3 = if entry.volume_m3.is_finite() {
            entry.volume_m3.max(0.0)
        } else {
            push_unique(
                &mut diagnostics,
                Diagnostic::NonFiniteInput {
                    field: format!("program[{i}].volume_m3"),
                },
            );
            0.0
        };

        let rate_m3_min = entry.rate_m3_min.filter(|r| r.is_finite() && *r >= 0.0);

        let name = entry
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| project.fluid_name(Some(fluid)));

        stages.push(Stage {
            name,
            fluid,
            total_volume_m3,
            side: Side::String,
            color: project.fluid_color(Some(fluid)),
            rate_m3_min,
        });
    }

    Evaluated::new(stages, diagnostics)
}

// ============================================================================
// Final-Layers Mode
// ============================================================================

/// A resolved target layer.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layer {
    top_md: f64,
    bottom_md: f64,
    fluid: FluidIndex,
}

fn final_layer_stages(
    project: &ProjectSnapshot,
    settings: &EngineSettings,
) -> Evaluated<Vec<Stage>> {
    let mut diagnostics = Vec::new();
    let geometry = project.geometry();
    let string_baseline = initial_fill(project, settings, Side::String);
    let annulus_baseline = initial_fill(project, settings, Side::Annulus);
    for d in string_baseline.diagnostics.into_iter().chain(annulus_baseline.diagnostics) {
        push_unique(&mut diagnostics, d);
    }

    let string_stages = compartment_stages(
        project,
        settings,
        Side::String,
        string_baseline.value,
        FlowPath::open(geometry.string.bottom_md()),
        &mut diagnostics,
    );

    // String stages push the string's own liquid through the bit after the
    // annulus is placed; that volume lifts the annulus layers.
    let lifted_m3: f64 = if string_baseline.value.is_some() {
        string_stages.iter().map(|s| s.total_volume_m3).sum()
    } else {
        0.0
    };
    let reach_md = if volume::rathole(geometry) > 0.0 {
        geometry.bit_md()
    } else {
        geometry.annulus.bottom_md()
    };
    let annulus_path = FlowPath {
        reach_md,
        lifted_m3,
        lifted: string_baseline.value,
    };
    let mut stages = compartment_stages(
        project,
        settings,
        Side::Annulus,
        annulus_baseline.value,
        annulus_path,
        &mut diagnostics,
    );
    stages.extend(string_stages);

    Evaluated::new(stages, diagnostics)
}

/// Part of a compartment the pumped stages can place fluid into.
#[derive(Debug, Clone, Copy)]
struct FlowPath {
    /// Deepest point on the circulation path
    reach_md: f64,
    /// Volume that later stages push in at `reach_md`
    lifted_m3: f64,
    lifted: Option<FluidIndex>,
}

impl FlowPath {
    fn open(bottom_md: f64) -> Self {
        Self {
            reach_md: bottom_md,
            lifted_m3: 0.0,
            lifted: None,
        }
    }
}

/// Stages that turn `baseline` into the target layers of one compartment.
///
/// Target volume that cannot be placed (below `reach_md`, or where the
/// lifted volume will end up) is left out and reported.
fn compartment_stages(
    project: &ProjectSnapshot,
    settings: &EngineSettings,
    side: Side,
    baseline: Option<FluidIndex>,
    path: FlowPath,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Stage> {
    let geom = project.geometry().compartment(side);
    let layers = target_layers(project, geom, diagnostics);
    let cutoff_md = if path.lifted_m3 > settings.volume_tolerance_m3 {
        volume::depth_above(geom, path.reach_md, path.lifted_m3)
    } else {
        path.reach_md
    };

    let mut unreachable_m3 = 0.0;
    let mut reachable = Vec::with_capacity(layers.len());
    for layer in layers {
        for (top, bottom, ends_up) in [
            (cutoff_md, path.reach_md, path.lifted),
            (path.reach_md, geom.bottom_md(), baseline),
        ] {
            let (t, b) = (layer.top_md.max(top), layer.bottom_md.min(bottom));
            if b > t && Some(layer.fluid) != ends_up {
                unreachable_m3 += volume::volume_between(geom, t, b);
            }
        }
        if layer.top_md < cutoff_md {
            reachable.push(Layer {
                bottom_md: layer.bottom_md.min(cutoff_md),
                ..layer
            });
        }
    }
    if unreachable_m3 > settings.volume_tolerance_m3 {
        push_unique(
            diagnostics,
            Diagnostic::TargetUnreachable {
                side,
                volume_m3: unreachable_m3,
            },
        );
    }

    // Annulus fluid rises from the bit, string fluid sinks from surface
    let pump_order: Vec<Layer> = match side {
        Side::Annulus => reachable,
        Side::String => reachable.into_iter().rev().collect(),
    };

    pump_order
        .into_iter()
        .skip_while(|l| Some(l.fluid) == baseline)
        .filter_map(|layer| {
            let total_volume_m3 = volume::volume_between(geom, layer.top_md, layer.bottom_md);
            (total_volume_m3 > settings.volume_tolerance_m3).then(|| Stage {
                name: format!(
                    "{side}: {} ({:.0}-{:.0} m)",
                    project.fluid_name(Some(layer.fluid)),
                    layer.top_md,
                    layer.bottom_md
                ),
                fluid: layer.fluid,
                total_volume_m3,
                side,
                color: project.fluid_color(Some(layer.fluid)),
                rate_m3_min: None,
            })
        })
        .collect()
}

/// Target layers for one compartment, covering `[0, bottom]` top to bottom.
fn target_layers(
    project: &ProjectSnapshot,
    geom: &CompartmentGeometry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Layer> {
    let bottom = geom.bottom_md();
    if bottom <= 0.0 {
        return Vec::new();
    }
    let active = project.active();
    for d in active.diagnostics {
        push_unique(diagnostics, d);
    }
    let filler = active.value;

    let mut requested: Vec<Layer> = Vec::new();
    for (i, layer) in project
        .final_layers()
        .iter()
        .enumerate()
        .filter(|(_, l)| l.side == geom.side())
    {
        if !layer.top_md.is_finite() || !layer.bottom_md.is_finite() {
            push_unique(
                diagnostics,
                Diagnostic::NonFiniteInput {
                    field: format!("final_layers[{i}]"),
                },
            );
            continue;
        }
        let top = layer.top_md.clamp(0.0, bottom);
        let bot = layer.bottom_md.clamp(0.0, bottom);
        if bot <= top {
            continue;
        }
        let resolved = project.resolve(&layer.fluid_id);
        for d in resolved.diagnostics {
            push_unique(diagnostics, d);
        }
        requested.push(Layer {
            top_md: top,
            bottom_md: bot,
            fluid: resolved.value,
        });
    }
    requested.sort_by(|a, b| a.top_md.total_cmp(&b.top_md));

    let mut layers: Vec<Layer> = Vec::new();
    let mut cursor = 0.0;
    for layer in requested {
        // Overlaps: the shallower layer keeps the contested interval
        let top = layer.top_md.max(cursor);
        if layer.bottom_md <= top {
            continue;
        }
        if top > cursor {
            push_merged(&mut layers, Layer { top_md: cursor, bottom_md: top, fluid: filler });
        }
        push_merged(&mut layers, Layer { top_md: top, ..layer });
        cursor = layer.bottom_md;
    }
    if cursor < bottom {
        push_merged(&mut layers, Layer { top_md: cursor, bottom_md: bottom, fluid: filler });
    }
    layers
}

fn push_merged(layers: &mut Vec<Layer>, layer: Layer) {
    match layers.last_mut() {
        Some(last) if last.fluid == layer.fluid => last.bottom_md = layer.bottom_md,
        _ => layers.push(layer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        FinalFluidLayer, Fluid, ProgramStage, Rheology, Section, Survey, WellGeometry,
    };
    use std::f64::consts::PI;

    const STRING_AREA: f64 = PI * 0.1 * 0.1 / 4.0;
    const ANNULUS_AREA: f64 = PI * (0.25 * 0.25 - 0.127 * 0.127) / 4.0;

    fn project() -> ProjectSnapshot {
        let geometry = WellGeometry::new(
            vec![Section::new("dp", 0.0, 1000.0, 0.1, 0.127)],
            vec![Section::new("oh", 0.0, 1000.0, 0.25, 0.127)],
        )
        .unwrap();
        ProjectSnapshot::new(
            "t",
            geometry,
            vec![
                Fluid::new("mud", 1200.0, Rheology::default()),
                Fluid::new("spacer", 1400.0, Rheology::default()),
                Fluid::new("cement", 1900.0, Rheology::default()),
            ],
            "mud",
            Survey::vertical(),
        )
        .unwrap()
    }

    fn layer(side: Side, top: f64, bottom: f64, fluid: &str) -> FinalFluidLayer {
        FinalFluidLayer {
            side,
            top_md: top,
            bottom_md: bottom,
            fluid_id: fluid.into(),
        }
    }

    #[test]
    fn test_program_stages_go_down_the_string() {
        let p = project().with_program(vec![
            ProgramStage {
                name: None,
                fluid_id: "spacer".into(),
                volume_m3: 3.0,
                rate_m3_min: Some(1.2),
            },
            ProgramStage {
                name: Some("Lead".into()),
                fluid_id: "cement".into(),
                volume_m3: 10.0,
                rate_m3_min: None,
            },
        ]);
        let built = build_stages(&p, &EngineSettings::default());
        assert!(built.is_clean());
        let stages = built.value;
        assert_eq!(stages.len(), 2);
        assert!(stages.iter().all(|s| s.side == Side::String));
        assert_eq!(stages[0].name, "spacer");
        assert_eq!(stages[1].name, "Lead");
        assert_eq!(stages[0].rate_m3_min, Some(1.2));
    }

    #[test]
    fn test_program_missing_fluid_falls_back() {
        let p = project().with_program(vec![ProgramStage {
            name: None,
            fluid_id: "nope".into(),
            volume_m3: 2.0,
            rate_m3_min: None,
        }]);
        let built = build_stages(&p, &EngineSettings::default());
        assert_eq!(built.value[0].fluid, FluidIndex::DEFAULT);
        assert_eq!(built.value[0].name, "Default");
        assert!(built
            .diagnostics
            .contains(&Diagnostic::MissingFluid { reference: "nope".into() }));
    }

    #[test]
    fn test_final_layers_annulus_first_then_string() {
        let p = project().with_final_layers(vec![
            layer(Side::Annulus, 600.0, 800.0, "spacer"),
            layer(Side::Annulus, 800.0, 1000.0, "cement"),
            layer(Side::String, 900.0, 1000.0, "cement"),
        ]);
        let stages = build_stages(&p, &EngineSettings::default()).value;
        let summary: Vec<(Side, FluidIndex)> = stages.iter().map(|s| (s.side, s.fluid)).collect();
        // Annulus top mud already in place; string starts empty so all of it is pumped
        assert_eq!(
            summary,
            vec![
                (Side::Annulus, FluidIndex(1)),
                (Side::Annulus, FluidIndex(2)),
                (Side::String, FluidIndex(2)),
                (Side::String, FluidIndex(0)),
            ]
        );
        assert_eq!(stages[0].name, "Annulus: spacer (600-800 m)");
        assert!((stages[3].total_volume_m3 - STRING_AREA * 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_final_layers_merge_and_clip() {
        let p = project().with_final_layers(vec![
            layer(Side::Annulus, 500.0, 700.0, "cement"),
            layer(Side::Annulus, 700.0, 1500.0, "cement"),
        ]);
        let stages = build_stages(&p, &EngineSettings::default()).value;
        let annulus: Vec<&Stage> = stages.iter().filter(|s| s.side == Side::Annulus).collect();
        assert_eq!(annulus.len(), 1);
        assert_eq!(annulus[0].name, "Annulus: cement (500-1000 m)");
    }

    #[test]
    fn test_build_is_idempotent() {
        let p = project().with_final_layers(vec![layer(Side::Annulus, 0.0, 300.0, "spacer")]);
        let settings = EngineSettings::default();
        assert_eq!(build_stages(&p, &settings), build_stages(&p, &settings));
    }

    #[test]
    fn test_liquid_string_lifts_annulus_plan() {
        let p = project().with_final_layers(vec![
            layer(Side::Annulus, 800.0, 1000.0, "cement"),
            layer(Side::String, 0.0, 300.0, "spacer"),
        ]);
        let settings = EngineSettings {
            initial_string: InitialStringFill::Active,
            ..EngineSettings::default()
        };
        let built = build_stages(&p, &settings);
        let stages = built.value;
        assert_eq!(stages.len(), 2);
        assert_eq!((stages[0].side, stages[0].fluid), (Side::Annulus, FluidIndex(2)));
        assert_eq!((stages[1].side, stages[1].fluid), (Side::String, FluidIndex(1)));

        // 300 m of string mud comes out of the bit after the cement is placed
        let lifted = STRING_AREA * 300.0;
        let lift_m = lifted / ANNULUS_AREA;
        assert!((stages[0].total_volume_m3 - ANNULUS_AREA * (200.0 - lift_m)).abs() < 1e-9);
        assert!((stages[1].total_volume_m3 - lifted).abs() < 1e-9);
        match built.diagnostics.as_slice() {
            [Diagnostic::TargetUnreachable {
                side: Side::Annulus,
                volume_m3,
            }] => assert!((volume_m3 - lifted).abs() < 1e-9),
            other => panic!("expected one unreachable-target diagnostic, got {other:?}"),
        }
    }

    #[test]
    fn test_rathole_is_not_targeted() {
        let geometry = WellGeometry::new(
            vec![Section::new("dp", 0.0, 800.0, 0.1, 0.127)],
            vec![Section::new("oh", 0.0, 1000.0, 0.25, 0.127)],
        )
        .unwrap();
        let p = ProjectSnapshot::new(
            "rathole",
            geometry,
            vec![
                Fluid::new("mud", 1200.0, Rheology::default()),
                Fluid::new("cement", 1900.0, Rheology::default()),
            ],
            "mud",
            Survey::vertical(),
        )
        .unwrap()
        .with_final_layers(vec![layer(Side::Annulus, 600.0, 1000.0, "cement")]);

        let built = build_stages(&p, &EngineSettings::default());
        let annulus: Vec<&Stage> = built.value.iter().filter(|s| s.side == Side::Annulus).collect();
        assert_eq!(annulus.len(), 1);
        assert_eq!(annulus[0].name, "Annulus: cement (600-800 m)");
        assert!((annulus[0].total_volume_m3 - ANNULUS_AREA * 200.0).abs() < 1e-9);
        assert!(built.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::TargetUnreachable { side: Side::Annulus, volume_m3 }
                if (volume_m3 - ANNULUS_AREA * 200.0).abs() < 1e-9
        )));
    }
}
