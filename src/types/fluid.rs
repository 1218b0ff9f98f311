//! Fluid definitions and rheology parameters

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rheological model with its parameters (SI units).
///
/// The friction-gradient closed forms for each variant live in
/// `physics_engine::rheology`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Rheology {
    /// τ = μ·γ
    Newtonian { viscosity_pa_s: f64 },
    /// τ = τy + μp·γ
    Bingham {
        plastic_viscosity_pa_s: f64,
        yield_point_pa: f64,
    },
    /// τ = K·γⁿ
    PowerLaw { consistency_pa_sn: f64, flow_index: f64 },
    /// τ = τy + K·γⁿ
    HerschelBulkley {
        yield_stress_pa: f64,
        consistency_pa_sn: f64,
        flow_index: f64,
    },
}

impl Rheology {
    pub fn name(&self) -> &'static str {
        match self {
            Rheology::Newtonian { .. } => "Newtonian",
            Rheology::Bingham { .. } => "Bingham",
            Rheology::PowerLaw { .. } => "Power-law",
            Rheology::HerschelBulkley { .. } => "Herschel-Bulkley",
        }
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        match *self {
            Rheology::Newtonian { viscosity_pa_s } => vec![("viscosity_pa_s", viscosity_pa_s)],
            Rheology::Bingham {
                plastic_viscosity_pa_s,
                yield_point_pa,
            } => vec![
                ("plastic_viscosity_pa_s", plastic_viscosity_pa_s),
                ("yield_point_pa", yield_point_pa),
            ],
            Rheology::PowerLaw {
                consistency_pa_sn,
                flow_index,
            } => vec![
                ("consistency_pa_sn", consistency_pa_sn),
                ("flow_index", flow_index),
            ],
            Rheology::HerschelBulkley {
                yield_stress_pa,
                consistency_pa_sn,
                flow_index,
            } => vec![
                ("yield_stress_pa", yield_stress_pa),
                ("consistency_pa_sn", consistency_pa_sn),
                ("flow_index", flow_index),
            ],
        }
    }
}

impl Default for Rheology {
    fn default() -> Self {
        Rheology::Newtonian {
            viscosity_pa_s: crate::config::defaults::DEFAULT_FLUID_VISCOSITY_PA_S,
        }
    }
}

/// A named fluid referenced by segments and stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fluid {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Density (kg/m³)
    pub density_kg_m3: f64,
    #[serde(default)]
    pub rheology: Rheology,
    /// Display color, e.g. "#8B4513"
    #[serde(default)]
    pub color: Option<String>,
}

impl Fluid {
    pub fn new(id: impl Into<String>, density_kg_m3: f64, rheology: Rheology) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            density_kg_m3,
            rheology,
            color: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn validate(&self) -> Result<(), FluidError> {
        if self.id.trim().is_empty() {
            return Err(FluidError::MissingId);
        }
        if !self.density_kg_m3.is_finite() || self.density_kg_m3 < 0.0 {
            return Err(FluidError::InvalidDensity {
                id: self.id.clone(),
                density: self.density_kg_m3,
            });
        }
        for (param, value) in self.rheology.parameters() {
            if !value.is_finite() || value < 0.0 {
                return Err(FluidError::InvalidParameter {
                    id: self.id.clone(),
                    param,
                    value,
                });
            }
            if param == "flow_index" && value == 0.0 {
                return Err(FluidError::InvalidParameter {
                    id: self.id.clone(),
                    param,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Index of a fluid in a project snapshot's fluid arena.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FluidIndex(pub usize);

impl FluidIndex {
    /// Placeholder for an unresolved reference. Never present in an arena;
    /// the engine substitutes its neutral default fluid.
    pub const DEFAULT: Self = Self(usize::MAX);

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FluidError {
    #[error("fluid has an empty id")]
    MissingId,

    #[error("fluid '{id}' has invalid density {density} kg/m³")]
    InvalidDensity { id: String, density: f64 },

    #[error("fluid '{id}' has invalid {param} = {value}")]
    InvalidParameter {
        id: String,
        param: &'static str,
        value: f64,
    },

    #[error("duplicate fluid id '{0}'")]
    Duplicate(String),
}
