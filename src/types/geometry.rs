//! Wellbore geometry: string and annulus sections

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

// ============================================================================
// Side / Compartment
// ============================================================================

/// Flow compartment of the well: inside the string or the annulus around it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    String,
    Annulus,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::String => write!(f, "String"),
            Side::Annulus => write!(f, "Annulus"),
        }
    }
}

// ============================================================================
// Section
// ============================================================================

/// One depth interval of constant cross-section.
///
/// For string sections `inner_diameter` is the pipe bore and `outer_diameter`
/// the pipe body. For annulus sections `inner_diameter` is the hole or casing
/// ID and `outer_diameter` the OD of the pipe running through it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    #[serde(default)]
    pub id: String,
    /// Top measured depth (m)
    pub top_md: f64,
    /// Bottom measured depth (m)
    pub bottom_md: f64,
    /// Inner diameter (m)
    pub inner_diameter: f64,
    /// Outer diameter (m)
    pub outer_diameter: f64,
    /// Absolute wall roughness (m)
    #[serde(default)]
    pub roughness: f64,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        top_md: f64,
        bottom_md: f64,
        inner_diameter: f64,
        outer_diameter: f64,
    ) -> Self {
        Self {
            id: id.into(),
            top_md,
            bottom_md,
            inner_diameter,
            outer_diameter,
            roughness: 0.0,
        }
    }

    pub fn with_roughness(mut self, roughness: f64) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn length(&self) -> f64 {
        self.bottom_md - self.top_md
    }

    /// Cross-sectional flow area (m²) for the compartment this section belongs to.
    pub fn flow_area(&self, side: Side) -> f64 {
        match side {
            Side::String => PI * self.inner_diameter.powi(2) / 4.0,
            Side::Annulus => {
                PI * (self.inner_diameter.powi(2) - self.outer_diameter.powi(2)) / 4.0
            }
        }
    }

    /// Hydraulic diameter (m): bore for pipe flow, ID − OD for annular flow.
    pub fn hydraulic_diameter(&self, side: Side) -> f64 {
        match side {
            Side::String => self.inner_diameter,
            Side::Annulus => self.inner_diameter - self.outer_diameter,
        }
    }

    fn validate(&self, side: Side) -> Result<(), GeometryError> {
        let values = [
            self.top_md,
            self.bottom_md,
            self.inner_diameter,
            self.outer_diameter,
            self.roughness,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite { id: self.id.clone() });
        }
        if self.top_md < 0.0 || self.bottom_md <= self.top_md {
            return Err(GeometryError::InvalidInterval {
                id: self.id.clone(),
                top_md: self.top_md,
                bottom_md: self.bottom_md,
            });
        }
        if self.inner_diameter <= 0.0 || self.outer_diameter < 0.0 {
            return Err(GeometryError::NonPositiveDiameter { id: self.id.clone() });
        }
        if self.roughness < 0.0 {
            return Err(GeometryError::NegativeRoughness { id: self.id.clone() });
        }
        match side {
            Side::Annulus if self.inner_diameter <= self.outer_diameter => {
                Err(GeometryError::AnnulusClosed {
                    id: self.id.clone(),
                    inner_diameter: self.inner_diameter,
                    outer_diameter: self.outer_diameter,
                })
            }
            Side::String if self.outer_diameter < self.inner_diameter => {
                Err(GeometryError::PipeWallInverted {
                    id: self.id.clone(),
                    inner_diameter: self.inner_diameter,
                    outer_diameter: self.outer_diameter,
                })
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("section '{id}' has non-finite dimensions")]
    NonFinite { id: String },

    #[error("section '{id}' interval {top_md}..{bottom_md} m is empty or negative")]
    InvalidInterval { id: String, top_md: f64, bottom_md: f64 },

    #[error("section '{id}' has a non-positive diameter")]
    NonPositiveDiameter { id: String },

    #[error("section '{id}' has negative roughness")]
    NegativeRoughness { id: String },

    #[error("annulus section '{id}' is closed: ID {inner_diameter} m <= OD {outer_diameter} m")]
    AnnulusClosed {
        id: String,
        inner_diameter: f64,
        outer_diameter: f64,
    },

    #[error("string section '{id}' has OD {outer_diameter} m smaller than ID {inner_diameter} m")]
    PipeWallInverted {
        id: String,
        inner_diameter: f64,
        outer_diameter: f64,
    },

    #[error("sections '{first}' and '{second}' overlap")]
    Overlap { first: String, second: String },
}

// ============================================================================
// Compartment Geometry
// ============================================================================

/// Validated, depth-ordered sections of one compartment.
#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentGeometry {
    side: Side,
    sections: Vec<Section>,
}

impl CompartmentGeometry {
    pub fn new(side: Side, mut sections: Vec<Section>) -> Result<Self, GeometryError> {
        for section in &sections {
            section.validate(side)?;
        }
        sections.sort_by(|a, b| a.top_md.total_cmp(&b.top_md));
        for pair in sections.windows(2) {
            if pair[1].top_md < pair[0].bottom_md {
                return Err(GeometryError::Overlap {
                    first: pair[0].id.clone(),
                    second: pair[1].id.clone(),
                });
            }
        }
        Ok(Self { side, sections })
    }

    pub fn empty(side: Side) -> Self {
        Self {
            side,
            sections: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Deepest point of the compartment (m), 0 when empty.
    pub fn bottom_md(&self) -> f64 {
        self.sections.last().map_or(0.0, |s| s.bottom_md)
    }

    /// Section containing `md`. The bottom of the last section belongs to it.
    pub fn section_at(&self, md: f64) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| md >= s.top_md && md < s.bottom_md)
            .or_else(|| self.sections.last().filter(|s| md == s.bottom_md))
    }

    /// Flow area at `md` (m²); 0 outside any section.
    pub fn area_at(&self, md: f64) -> f64 {
        self.section_at(md).map_or(0.0, |s| s.flow_area(self.side))
    }
}

/// String and annulus geometry of one well.
#[derive(Debug, Clone, PartialEq)]
pub struct WellGeometry {
    pub string: CompartmentGeometry,
    pub annulus: CompartmentGeometry,
}

impl WellGeometry {
    pub fn new(
        string_sections: Vec<Section>,
        annulus_sections: Vec<Section>,
    ) -> Result<Self, GeometryError> {
        Ok(Self {
            string: CompartmentGeometry::new(Side::String, string_sections)?,
            annulus: CompartmentGeometry::new(Side::Annulus, annulus_sections)?,
        })
    }

    pub fn compartment(&self, side: Side) -> &CompartmentGeometry {
        match side {
            Side::String => &self.string,
            Side::Annulus => &self.annulus,
        }
    }

    /// Bit depth: bottom of the string (m).
    pub fn bit_md(&self) -> f64 {
        self.string.bottom_md()
    }
}
