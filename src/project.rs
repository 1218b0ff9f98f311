//! Read-only project snapshot consumed by the engine
//!
//! A project file carries geometry, fluids, the active mud, survey stations
//! and the two schedule sources (final layers and program stages). Loading
//! validates geometry and fluids once and puts the fluids into an arena
//! indexed by `FluidIndex`; everything downstream works on indices.
//!
//! ```toml
//! name = "Demo 8.5in"
//! active_fluid = "active"
//! mode = "program"
//!
//! [[string]]
//! id = "DP 5in"
//! top_md = 0.0
//! bottom_md = 800.0
//! inner_diameter = 0.095
//! outer_diameter = 0.127
//!
//! [[annulus]]
//! id = "OH"
//! top_md = 0.0
//! bottom_md = 800.0
//! inner_diameter = 0.244
//! outer_diameter = 0.127
//!
//! [[fluids]]
//! id = "active"
//! density_kg_m3 = 1260.0
//! rheology = { model = "bingham", plastic_viscosity_pa_s = 0.02, yield_point_pa = 7.0 }
//!
//! [[program]]
//! fluid_id = "active"
//! volume_m3 = 5.0
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{
    push_unique, Diagnostic, Evaluated, FinalFluidLayer, Fluid, FluidError, FluidIndex,
    GeometryError, ProgramStage, ScheduleMode, Section, Survey, SurveyStation, WellGeometry,
};

// ============================================================================
// Persisted Records
// ============================================================================

/// Project as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub string: Vec<Section>,
    #[serde(default)]
    pub annulus: Vec<Section>,
    #[serde(default)]
    pub fluids: Vec<Fluid>,
    /// Id of the fluid currently in the hole. Empty means the first fluid.
    #[serde(default)]
    pub active_fluid: String,
    #[serde(default)]
    pub survey: Vec<SurveyStation>,
    /// Schedule source; inferred from the lists present when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ScheduleMode>,
    #[serde(default)]
    pub final_layers: Vec<FinalFluidLayer>,
    #[serde(default)]
    pub program: Vec<ProgramStage>,
}

impl ProjectFile {
    pub fn to_toml(&self) -> Result<String, ProjectError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Project parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Project serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Invalid fluid: {0}")]
    Fluid(#[from] FluidError),
}

// ============================================================================
// Snapshot
// ============================================================================

/// Validated, immutable view of a project for one simulation run.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    name: String,
    geometry: WellGeometry,
    fluids: Vec<Fluid>,
    active_id: String,
    survey: Survey,
    mode: ScheduleMode,
    load_diagnostics: Vec<Diagnostic>,
    final_layers: Vec<FinalFluidLayer>,
    program: Vec<ProgramStage>,
}

impl ProjectSnapshot {
    /// Assemble a snapshot. Fluids are validated and must have unique ids.
    pub fn new(
        name: impl Into<String>,
        geometry: WellGeometry,
        fluids: Vec<Fluid>,
        active_id: impl Into<String>,
        survey: Survey,
    ) -> Result<Self, ProjectError> {
        let mut seen = HashSet::new();
        for fluid in &fluids {
            fluid.validate()?;
            if !seen.insert(fluid.id.as_str()) {
                return Err(FluidError::Duplicate(fluid.id.clone()).into());
            }
        }
        Ok(Self {
            name: name.into(),
            geometry,
            fluids,
            active_id: active_id.into(),
            survey,
            mode: ScheduleMode::default(),
            load_diagnostics: Vec::new(),
            final_layers: Vec::new(),
            program: Vec::new(),
        })
    }

    /// Use a program stage list as the schedule source.
    pub fn with_program(mut self, program: Vec<ProgramStage>) -> Self {
        self.program = program;
        self.mode = ScheduleMode::Program;
        self
    }

    /// Use a target layer list as the schedule source.
    pub fn with_final_layers(mut self, layers: Vec<FinalFluidLayer>) -> Self {
        self.final_layers = layers;
        self.mode = ScheduleMode::FinalLayers;
        self
    }

    pub fn from_file(file: ProjectFile) -> Result<Self, ProjectError> {
        let geometry = WellGeometry::new(file.string, file.annulus)?;
        let survey = Survey::from_stations(&file.survey);
        let mut snapshot = Self::new(file.name, geometry, file.fluids, file.active_fluid, survey)?;
        let inferred = infer_mode(file.mode, &file.program, &file.final_layers);
        snapshot.mode = inferred.value;
        snapshot.load_diagnostics = inferred.diagnostics;
        snapshot.final_layers = file.final_layers;
        snapshot.program = file.program;
        Ok(snapshot)
    }

    /// Load a project TOML file.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProjectError::Io(path.to_path_buf(), e))?;
        let file: ProjectFile =
            toml::from_str(&contents).map_err(|e| ProjectError::Parse(path.to_path_buf(), e))?;
        let snapshot = Self::from_file(file)?;
        info!(
            path = %path.display(),
            project = %snapshot.name,
            fluids = snapshot.fluids.len(),
            mode = %snapshot.mode,
            "Loaded project"
        );
        Ok(snapshot)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &WellGeometry {
        &self.geometry
    }

    pub fn fluids(&self) -> &[Fluid] {
        &self.fluids
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    /// Diagnostics raised while reading the project file.
    pub fn load_diagnostics(&self) -> &[Diagnostic] {
        &self.load_diagnostics
    }

    pub fn final_layers(&self) -> &[FinalFluidLayer] {
        &self.final_layers
    }

    pub fn program(&self) -> &[ProgramStage] {
        &self.program
    }

    /// Fluid at `index`; `None` for `FluidIndex::DEFAULT` or a stale index.
    pub fn fluid(&self, index: FluidIndex) -> Option<&Fluid> {
        self.fluids.get(index.0)
    }

    /// Look up a fluid id. Unknown ids resolve to `FluidIndex::DEFAULT`.
    pub fn resolve(&self, id: &str) -> Evaluated<FluidIndex> {
        match self.fluids.iter().position(|f| f.id == id) {
            Some(i) => Evaluated::clean(FluidIndex(i)),
            None => {
                debug!(fluid = %id, "unresolved fluid reference");
                let mut diagnostics = Vec::new();
                push_unique(
                    &mut diagnostics,
                    Diagnostic::MissingFluid {
                        reference: id.to_string(),
                    },
                );
                Evaluated::new(FluidIndex::DEFAULT, diagnostics)
            }
        }
    }

    /// The active mud. An empty active id selects the first fluid.
    pub fn active(&self) -> Evaluated<FluidIndex> {
        if self.active_id.is_empty() && !self.fluids.is_empty() {
            return Evaluated::clean(FluidIndex(0));
        }
        self.resolve(&self.active_id)
    }

    /// Display name for a fluid slot: air, a known fluid, or the default.
    pub fn fluid_name(&self, fluid: Option<FluidIndex>) -> String {
        match fluid {
            None => "Air".to_string(),
            Some(index) => self
                .fluid(index)
                .map_or_else(|| "Default".to_string(), |f| f.display_name().to_string()),
        }
    }

    pub fn fluid_color(&self, fluid: Option<FluidIndex>) -> Option<String> {
        fluid.and_then(|i| self.fluid(i)).and_then(|f| f.color.clone())
    }
}

/// Pick the schedule source. An explicit mode wins; otherwise a file with
/// only program stages runs the program and anything else runs final layers.
fn infer_mode(
    explicit: Option<ScheduleMode>,
    program: &[ProgramStage],
    final_layers: &[FinalFluidLayer],
) -> Evaluated<ScheduleMode> {
    if let Some(mode) = explicit {
        return Evaluated::clean(mode);
    }
    match (program.is_empty(), final_layers.is_empty()) {
        (false, true) => Evaluated::clean(ScheduleMode::Program),
        (false, false) => {
            let applied = ScheduleMode::FinalLayers;
            let mut diagnostics = Vec::new();
            push_unique(&mut diagnostics, Diagnostic::ScheduleModeAmbiguous { applied });
            Evaluated::new(applied, diagnostics)
        }
        _ => Evaluated::clean(ScheduleMode::FinalLayers),
    }
}
