//! Hydraulics evaluation inputs and results

use serde::{Deserialize, Serialize};

/// Depth at which pressures are reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControlDepth {
    /// Bottom of the string
    #[default]
    Bit,
    /// Custom measured depth (m)
    Custom(f64),
}

/// Managed-pressure settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MpdSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Fixed surface back pressure (Pa), used when no target ECD is set
    #[serde(default)]
    pub back_pressure_pa: f64,
    /// Hold this ECD (kg/m³) at the control depth by solving for back pressure
    #[serde(default)]
    pub target_ecd_kg_m3: Option<f64>,
}

/// Per-call inputs supplied by the caller on every evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct HydraulicsInput {
    /// Pump rate (m³/min); `None` uses the current stage rate or the configured default
    #[serde(default)]
    pub pump_rate_m3_min: Option<f64>,
    #[serde(default)]
    pub control_depth: ControlDepth,
    #[serde(default)]
    pub mpd: MpdSettings,
}

impl HydraulicsInput {
    pub fn at_rate(rate_m3_min: f64) -> Self {
        Self {
            pump_rate_m3_min: Some(rate_m3_min),
            ..Self::default()
        }
    }

    pub fn with_control_depth(mut self, control_depth: ControlDepth) -> Self {
        self.control_depth = control_depth;
        self
    }

    pub fn with_mpd(mut self, mpd: MpdSettings) -> Self {
        self.mpd = mpd;
        self
    }
}

/// Derived pressures at the control depth (Pa, ECD in kg/m³).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct HydraulicsResult {
    pub bhp_pa: f64,
    pub ecd_kg_m3: f64,
    pub sbp_pa: f64,
    pub tcp_pa: f64,
    pub annulus_friction_pa: f64,
    pub string_friction_pa: f64,
    pub annulus_hydrostatic_pa: f64,
    pub string_hydrostatic_pa: f64,
    pub annulus_at_control_pa: f64,
    pub string_at_control_pa: f64,
    pub control_md: f64,
    pub control_tvd: f64,
    pub pump_rate_m3_min: f64,
}

/// Pressures at one depth of a profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProfilePoint {
    pub md: f64,
    pub tvd: f64,
    pub annulus_pressure_pa: f64,
    pub string_pressure_pa: f64,
    pub annulus_ecd_kg_m3: f64,
}

/// One point of a pump-rate sweep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SweepPoint {
    pub pump_rate_m3_min: f64,
    pub result: HydraulicsResult,
}
