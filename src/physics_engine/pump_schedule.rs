//! Pump schedule façade
//!
//! `PumpSchedule` owns the built stage list for one project snapshot and
//! answers every query the UI or CLI asks about a point in the schedule.
//! A point is a stage index plus either a progress fraction (0..1) or a
//! volume pumped within that stage. Each query replays the stages from the
//! initial fill, so results never depend on earlier calls.

use tracing::{debug, info};

use super::hydraulics;
use super::schedule::{build_stages, initial_fill};
use super::stack::{Parcel, StackState};
use super::{volume, EngineSettings};
use crate::config;
use crate::project::ProjectSnapshot;
use crate::types::{
    push_unique, ControlDepth, Diagnostic, Evaluated, ExpelledFluid, FluidStack, HydraulicsInput,
    HydraulicsResult, Origin, ProfilePoint, Returns, Side, Stage, StageCursor,
};

#[derive(Debug, Clone)]
pub struct PumpSchedule<'a> {
    project: &'a ProjectSnapshot,
    settings: EngineSettings,
    stages: Vec<Stage>,
    build_diagnostics: Vec<Diagnostic>,
}

impl<'a> PumpSchedule<'a> {
    /// Build a schedule with settings from the global config.
    pub fn new(project: &'a ProjectSnapshot) -> Self {
        Self::with_settings(project, EngineSettings::from_config(config::get()))
    }

    pub fn with_settings(project: &'a ProjectSnapshot, settings: EngineSettings) -> Self {
        let mut schedule = Self {
            project,
            settings,
            stages: Vec::new(),
            build_diagnostics: Vec::new(),
        };
        schedule.rebuild();
        schedule
    }

    /// Discard and regenerate the stage list ("Apply Program").
    pub fn rebuild(&mut self) {
        let built = build_stages(self.project, &self.settings);
        self.stages = built.value;
        self.build_diagnostics = built.diagnostics;
        info!(
            project = %self.project.name(),
            mode = %self.project.mode(),
            stages = self.stages.len(),
            total_m3 = self.total_volume(),
            "Pump schedule built"
        );
    }

    pub fn project(&self) -> &ProjectSnapshot {
        self.project
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Diagnostics raised while building the stage list.
    pub fn build_diagnostics(&self) -> &[Diagnostic] {
        &self.build_diagnostics
    }

    /// Total volume of all stages (m³).
    pub fn total_volume(&self) -> f64 {
        self.stages.iter().map(|s| s.total_volume_m3).sum()
    }

    // ========================================================================
    // Cursor handling
    // ========================================================================

    /// Stage shown at (`progress`, `stage_index`). An index past the end
    /// selects the last stage; `None` only when there are no stages.
    pub fn current_stage(&self, progress: f64, stage_index: usize) -> Evaluated<Option<&Stage>> {
        let mut diagnostics = Vec::new();
        clamp_progress(progress, &mut diagnostics);
        let index = self.checked_index(stage_index, &mut diagnostics);
        Evaluated::new(index.and_then(|i| self.stages.get(i)), diagnostics)
    }

    /// Volume pumped in `stage_index` at `progress`.
    pub fn pumped_volume(&self, stage_index: usize, progress: f64) -> Evaluated<f64> {
        let mut diagnostics = Vec::new();
        let progress = clamp_progress(progress, &mut diagnostics);
        let volume = self
            .stages
            .get(stage_index)
            .map_or(0.0, |s| s.total_volume_m3 * progress);
        Evaluated::new(volume, diagnostics)
    }

    /// Map a cumulative pumped volume across the whole schedule to a cursor.
    pub fn cursor_for_volume(&self, total_pumped_m3: f64) -> Evaluated<StageCursor> {
        let mut diagnostics = Vec::new();
        let mut remaining = total_pumped_m3;
        if remaining.is_nan() {
            push_unique(
                &mut diagnostics,
                Diagnostic::NonFiniteInput {
                    field: "total pumped volume".to_string(),
                },
            );
            remaining = 0.0;
        } else if remaining < 0.0 {
            push_unique(
                &mut diagnostics,
                Diagnostic::ProgressClamped {
                    requested: total_pumped_m3,
                    applied: 0.0,
                },
            );
            remaining = 0.0;
        }

        for (i, stage) in self.stages.iter().enumerate() {
            if remaining <= stage.total_volume_m3 && stage.total_volume_m3 > 0.0 {
                return Evaluated::new(
                    StageCursor {
                        stage_index: i,
                        pumped_volume_m3: remaining,
                    },
                    diagnostics,
                );
            }
            remaining -= stage.total_volume_m3;
        }

        let Some(last) = self.stages.len().checked_sub(1) else {
            return Evaluated::new(
                StageCursor {
                    stage_index: 0,
                    pumped_volume_m3: 0.0,
                },
                diagnostics,
            );
        };
        if remaining > self.settings.volume_tolerance_m3 {
            push_unique(
                &mut diagnostics,
                Diagnostic::ProgressClamped {
                    requested: total_pumped_m3,
                    applied: self.total_volume(),
                },
            );
        }
        Evaluated::new(
            StageCursor {
                stage_index: last,
                pumped_volume_m3: self.stages[last].total_volume_m3,
            },
            diagnostics,
        )
    }

    /// Pump strokes for a volume; `None` when pump output is not configured.
    pub fn strokes_for_volume(&self, volume_m3: f64) -> Option<f64> {
        (self.settings.output_m3_per_stroke > 0.0)
            .then(|| volume_m3 / self.settings.output_m3_per_stroke)
    }

    pub fn volume_for_strokes(&self, strokes: f64) -> Option<f64> {
        (self.settings.output_m3_per_stroke > 0.0)
            .then(|| strokes * self.settings.output_m3_per_stroke)
    }

    // ========================================================================
    // Fluid stack
    // ========================================================================

    /// Segments of both compartments at (`stage_index`, `progress`).
    pub fn segments_at(&self, stage_index: usize, progress: f64) -> Evaluated<FluidStack> {
        let mut diagnostics = Vec::new();
        let progress = clamp_progress(progress, &mut diagnostics);
        let pumped = self
            .stages
            .get(stage_index)
            .map_or(0.0, |s| s.total_volume_m3 * progress);
        let stack = self.stacks_for(stage_index, pumped);
        extend_unique(&mut diagnostics, stack.diagnostics);
        Evaluated::new(stack.value, diagnostics)
    }

    /// Segments of both compartments after `pumped_volume_m3` of `stage_index`.
    pub fn stacks_for(&self, stage_index: usize, pumped_volume_m3: f64) -> Evaluated<FluidStack> {
        self.state_at(stage_index, pumped_volume_m3).map(|state| {
            let geometry = self.project.geometry();
            state.to_fluid_stack(
                &geometry.string,
                &geometry.annulus,
                self.settings.depth_tolerance_m,
                |fluid| self.project.fluid_color(fluid),
            )
        })
    }

    /// Pumped fluids that have reached surface, in exit order.
    pub fn expelled_fluids(
        &self,
        stage_index: usize,
        pumped_volume_m3: f64,
    ) -> Evaluated<Vec<ExpelledFluid>> {
        self.returns(stage_index, pumped_volume_m3).map(|r| r.expelled)
    }

    /// Full surface returns: pumped fluids, displaced in-hole fluid, vented air.
    pub fn returns(&self, stage_index: usize, pumped_volume_m3: f64) -> Evaluated<Returns> {
        self.state_at(stage_index, pumped_volume_m3).map(|state| {
            let mut returns = Returns {
                vented_air_m3: state.vented_air(),
                ..Returns::default()
            };
            for parcel in state.returned() {
                match parcel.origin {
                    Origin::InHole => returns.displaced_in_hole_m3 += parcel.volume,
                    Origin::Stage(_) => returns.expelled.push(ExpelledFluid {
                        fluid_name: self.project.fluid_name(parcel.fluid),
                        volume_m3: parcel.volume,
                        color: self.project.fluid_color(parcel.fluid),
                        origin: parcel.origin,
                    }),
                }
            }
            returns
        })
    }

    /// Compartment holding the leading edge of a stage's fluid once that
    /// stage has been pumped in full. Fluid already at surface counts as
    /// annulus.
    pub fn front_side(&self, stage_index: usize) -> Option<Side> {
        let total = self.stages.get(stage_index)?.total_volume_m3;
        self.front_side_at(stage_index, total)
    }

    /// Compartment holding the leading edge of a stage's fluid after
    /// `pumped_volume_m3` of it.
    pub fn front_side_at(&self, stage_index: usize, pumped_volume_m3: f64) -> Option<Side> {
        let stage = self.stages.get(stage_index)?;
        let state = self.state_at(stage_index, pumped_volume_m3).value;
        let origin = Origin::Stage(stage_index);
        let reached_annulus = state.parcels(Side::Annulus).iter().any(|p| p.origin == origin)
            || state.returned().iter().any(|p| p.origin == origin);
        Some(if reached_annulus { Side::Annulus } else { stage.side })
    }

    /// Replay the schedule up to (`stage_index`, `pumped_volume_m3`).
    pub fn state_at(&self, stage_index: usize, pumped_volume_m3: f64) -> Evaluated<StackState> {
        let mut diagnostics = self.build_diagnostics.clone();
        let geometry = self.project.geometry();
        let tolerance = self.settings.volume_tolerance_m3;

        let string_fill = initial_fill(self.project, &self.settings, Side::String);
        let annulus_fill = initial_fill(self.project, &self.settings, Side::Annulus);
        extend_unique(&mut diagnostics, string_fill.diagnostics);
        extend_unique(&mut diagnostics, annulus_fill.diagnostics);

        let mut state = StackState::filled(
            string_fill.value,
            annulus_fill.value,
            volume::capacity(&geometry.string),
            volume::capacity(&geometry.annulus),
            tolerance,
        )
        .with_rathole(volume::rathole(geometry));

        let Some(current) = self.checked_index(stage_index, &mut diagnostics) else {
            return Evaluated::new(state, diagnostics);
        };
        // An index past the end applies every stage in full
        let past_end = stage_index >= self.stages.len();

        for (i, stage) in self.stages.iter().enumerate().take(current + 1) {
            if stage.total_volume_m3 <= tolerance {
                push_unique(&mut diagnostics, Diagnostic::ZeroVolumeStage { stage_index: i });
                continue;
            }
            let amount = if i < current || past_end {
                stage.total_volume_m3
            } else {
                clamp_volume(pumped_volume_m3, stage.total_volume_m3, &mut diagnostics)
            };

            let excess = amount - state.path_capacity(stage.side);
            if excess > tolerance {
                push_unique(
                    &mut diagnostics,
                    Diagnostic::VolumeClamped {
                        stage_index: i,
                        excess_m3: excess,
                    },
                );
            }
            state.inject(stage.side, Parcel::new(Some(stage.fluid), amount, Origin::Stage(i)));
        }

        debug!(
            stage_index,
            pumped_m3 = pumped_volume_m3,
            returned = state.returned().len(),
            "stack replayed"
        );
        Evaluated::new(state, diagnostics)
    }

    // ========================================================================
    // Hydraulics
    // ========================================================================

    /// Hydraulics at (`stage_index`, `progress`).
    ///
    /// Pump rate: the input's rate, else the stage's rate, else the configured
    /// default.
    pub fn hydraulics_for_current(
        &self,
        stage_index: usize,
        progress: f64,
        input: &HydraulicsInput,
    ) -> Evaluated<HydraulicsResult> {
        let stack = self.segments_at(stage_index, progress);
        let mut diagnostics = stack.diagnostics;
        let rate = self.rate_for(stage_index, input);
        let eval = hydraulics::evaluate(
            self.project,
            &self.settings,
            &stack.value,
            rate,
            self.control_md(input.control_depth),
            &input.mpd,
        );
        extend_unique(&mut diagnostics, eval.diagnostics);
        Evaluated::new(eval.value, diagnostics)
    }

    /// Pressures along the well at (`stage_index`, `progress`).
    pub fn pressure_profile(
        &self,
        stage_index: usize,
        progress: f64,
        input: &HydraulicsInput,
        depths: &[f64],
    ) -> Evaluated<Vec<ProfilePoint>> {
        let stack = self.segments_at(stage_index, progress);
        let mut diagnostics = stack.diagnostics;
        let rate = self.rate_for(stage_index, input);
        let eval = hydraulics::profile(
            self.project,
            &self.settings,
            &stack.value,
            rate,
            depths,
            &input.mpd,
        );
        extend_unique(&mut diagnostics, eval.diagnostics);
        Evaluated::new(eval.value, diagnostics)
    }

    /// Pump rate (m³/min) in effect for a stage.
    pub fn rate_for(&self, stage_index: usize, input: &HydraulicsInput) -> f64 {
        input
            .pump_rate_m3_min
            .or_else(|| self.stages.get(stage_index).and_then(|s| s.rate_m3_min))
            .unwrap_or(self.settings.default_pump_rate_m3_min)
    }

    /// Measured depth for a control-depth mode.
    pub fn control_md(&self, control_depth: ControlDepth) -> f64 {
        match control_depth {
            ControlDepth::Bit => self.project.geometry().bit_md(),
            ControlDepth::Custom(md) => md,
        }
    }

    fn checked_index(
        &self,
        stage_index: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<usize> {
        let last = self.stages.len().checked_sub(1)?;
        if stage_index > last {
            push_unique(
                diagnostics,
                Diagnostic::StageIndexOutOfRange {
                    stage_index,
                    stage_count: self.stages.len(),
                },
            );
        }
        Some(stage_index.min(last))
    }
}

/// Clamp a progress fraction to [0, 1]; NaN becomes 0.
fn clamp_progress(progress: f64, diagnostics: &mut Vec<Diagnostic>) -> f64 {
    clamp_reported(progress, 1.0, "progress", diagnostics)
}

fn clamp_volume(volume: f64, total: f64, diagnostics: &mut Vec<Diagnostic>) -> f64 {
    clamp_reported(volume, total, "pumped volume", diagnostics)
}

/// Clamp into `0..=max`. NaN becomes zero and is reported by name so the
/// diagnostic carries no NaN and still dedups.
fn clamp_reported(
    requested: f64,
    max: f64,
    field: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> f64 {
    if requested.is_nan() {
        push_unique(diagnostics, Diagnostic::NonFiniteInput { field: field.to_string() });
        return 0.0;
    }
    let applied = requested.clamp(0.0, max);
    if applied != requested {
        push_unique(diagnostics, Diagnostic::ProgressClamped { requested, applied });
    }
    applied
}

fn extend_unique(diagnostics: &mut Vec<Diagnostic>, more: Vec<Diagnostic>) {
    for d in more {
        push_unique(diagnostics, d);
    }
}
