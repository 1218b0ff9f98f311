//! Diagnostic side channel for degenerate inputs
//!
//! The engine never fails an evaluation. Every time it clamps, defaults, or
//! zeroes a value it records a `Diagnostic` next to the result so callers and
//! tests can see that it happened.

use serde::{Deserialize, Serialize};

use super::{ScheduleMode, Side};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A fluid id or index did not resolve; the neutral default fluid was used
    MissingFluid { reference: String },
    /// Stage with no volume; treated as already complete
    ZeroVolumeStage { stage_index: usize },
    /// Requested stage index past the end of the schedule
    StageIndexOutOfRange { stage_index: usize, stage_count: usize },
    /// Progress or pumped volume outside the stage range was clamped
    ProgressClamped { requested: f64, applied: f64 },
    /// Stage volume exceeded the remaining well capacity; excess left at surface
    VolumeClamped { stage_index: usize, excess_m3: f64 },
    /// Control depth outside the compartment; out-of-range terms are zero
    ControlDepthOutOfRange { side: Side, control_md: f64, bottom_md: f64 },
    /// Vertical depth at the control point is zero; ECD reported as zero
    ZeroVerticalDepth { control_md: f64 },
    /// A non-finite number was replaced
    NonFiniteInput { field: String },
    /// Compartment has no geometry
    EmptyCompartment { side: Side },
    /// Part of a final-layers target cannot be reached by pumping
    TargetUnreachable { side: Side, volume_m3: f64 },
    /// Project has both schedule sources and no explicit mode
    ScheduleModeAmbiguous { applied: ScheduleMode },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingFluid { reference } => {
                write!(f, "fluid '{reference}' not found, default fluid used")
            }
            Diagnostic::ZeroVolumeStage { stage_index } => {
                write!(f, "stage {stage_index} has zero volume")
            }
            Diagnostic::StageIndexOutOfRange {
                stage_index,
                stage_count,
            } => write!(
                f,
                "stage index {stage_index} out of range ({stage_count} stages)"
            ),
            Diagnostic::ProgressClamped { requested, applied } => {
                write!(f, "progress {requested} clamped to {applied}")
            }
            Diagnostic::VolumeClamped {
                stage_index,
                excess_m3,
            } => write!(
                f,
                "stage {stage_index} exceeds well capacity by {excess_m3:.3} m³"
            ),
            Diagnostic::ControlDepthOutOfRange {
                side,
                control_md,
                bottom_md,
            } => write!(
                f,
                "{side} control depth {control_md:.1} m outside 0..{bottom_md:.1} m"
            ),
            Diagnostic::ZeroVerticalDepth { control_md } => {
                write!(f, "zero vertical depth at {control_md:.1} m MD")
            }
            Diagnostic::NonFiniteInput { field } => write!(f, "non-finite {field} replaced"),
            Diagnostic::EmptyCompartment { side } => write!(f, "{side} has no geometry"),
            Diagnostic::TargetUnreachable { side, volume_m3 } => {
                write!(f, "{side} target misses {volume_m3:.3} m³ that pumping cannot place")
            }
            Diagnostic::ScheduleModeAmbiguous { applied } => {
                write!(f, "no schedule mode set with both sources present, using {applied}")
            }
        }
    }
}

/// A value together with the diagnostics raised while computing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evaluated<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Evaluated<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Evaluated<U> {
        Evaluated {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}

/// Push a diagnostic unless an identical one is already recorded.
pub(crate) fn push_unique(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    if !diagnostics.contains(&diagnostic) {
        tracing::debug!(%diagnostic, "engine diagnostic");
        diagnostics.push(diagnostic);
    }
}
