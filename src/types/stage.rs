//! Pump stages and the persisted schedule records they are built from

use serde::{Deserialize, Serialize};

use super::{FluidIndex, Side};

/// How the stage list is derived from the project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Synthesise stages that reach a target set of fluid layers
    #[default]
    FinalLayers,
    /// Use the user-authored program stage list
    Program,
}

impl std::fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleMode::FinalLayers => write!(f, "Final layers"),
            ScheduleMode::Program => write!(f, "Program"),
        }
    }
}

/// Target fluid layer for the final-layers mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalFluidLayer {
    pub side: Side,
    pub top_md: f64,
    pub bottom_md: f64,
    pub fluid_id: String,
}

/// User-authored pump program entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramStage {
    #[serde(default)]
    pub name: Option<String>,
    pub fluid_id: String,
    pub volume_m3: f64,
    /// Pump rate for this stage (m³/min)
    #[serde(default)]
    pub rate_m3_min: Option<f64>,
}

/// One discrete pumping step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stage {
    pub name: String,
    pub fluid: FluidIndex,
    pub total_volume_m3: f64,
    /// Compartment the stage fluid is pumped into
    pub side: Side,
    pub color: Option<String>,
    /// Pump rate (m³/min), when the stage defines one
    pub rate_m3_min: Option<f64>,
}

/// Position within the schedule: stage index plus volume pumped in that stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StageCursor {
    pub stage_index: usize,
    pub pumped_volume_m3: f64,
}
