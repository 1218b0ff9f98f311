//! Simulation Configuration - engine and hydraulics constants as TOML values
//!
//! Each struct implements `Default` with values from `defaults.rs`, so an
//! absent or empty config file behaves exactly like the built-in constants.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "WELLFLOW_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "wellflow.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Well / rig identification
    #[serde(default)]
    pub well: WellInfo,

    /// Fluid-stack engine constants
    #[serde(default)]
    pub engine: EngineConfig,

    /// Friction-pressure model tuning
    #[serde(default)]
    pub hydraulics: HydraulicsConfig,

    /// Mud pump
    #[serde(default)]
    pub pump: PumpConfig,
}

impl SimConfig {
    /// Load configuration using the standard search order:
    /// 1. `$WELLFLOW_CONFIG`
    /// 2. `./wellflow.toml`
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(
                            path = %p.display(),
                            well = %config.well.name,
                            "Loaded config from {CONFIG_ENV_VAR}"
                        );
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from {CONFIG_ENV_VAR}, falling back"
                        );
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(well = %config.well.name, "Loaded config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents, path)
    }

    fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        // Unknown keys only warn
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(&config);
        for w in range_warnings {
            warn!("{}", w);
        }
        if !range_errors.is_empty() {
            return Err(ConfigError::Validation(range_errors));
        }
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Validate values for internal consistency.
    ///
    /// Rules:
    /// - All numeric values must be finite
    /// - Gravity, tolerances and the fallback fluid must be positive
    /// - Turbulent Reynolds limit must be >= laminar limit
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let e = &self.engine;
        let h = &self.hydraulics;

        Self::check_positive(e.gravity_m_s2, "engine.gravity_m_s2", &mut errors);
        Self::check_positive(
            e.default_fluid_density_kg_m3,
            "engine.default_fluid_density_kg_m3",
            &mut errors,
        );
        Self::check_positive(
            e.default_fluid_viscosity_pa_s,
            "engine.default_fluid_viscosity_pa_s",
            &mut errors,
        );
        Self::check_positive(e.volume_tolerance_m3, "engine.volume_tolerance_m3", &mut errors);
        Self::check_positive(e.depth_tolerance_m, "engine.depth_tolerance_m", &mut errors);

        Self::check_positive(
            h.laminar_reynolds_limit,
            "hydraulics.laminar_reynolds_limit",
            &mut errors,
        );
        Self::check_escalation(
            h.laminar_reynolds_limit,
            h.turbulent_reynolds_limit,
            "hydraulics.reynolds_limit",
            &mut errors,
        );
        if !h.default_pump_rate_m3_min.is_finite() || h.default_pump_rate_m3_min < 0.0 {
            errors.push(format!(
                "hydraulics.default_pump_rate_m3_min must be finite and >= 0 (got {})",
                h.default_pump_rate_m3_min
            ));
        }

        if !self.pump.output_m3_per_stroke.is_finite() || self.pump.output_m3_per_stroke < 0.0 {
            errors.push(format!(
                "pump.output_m3_per_stroke must be finite and >= 0 (got {})",
                self.pump.output_m3_per_stroke
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} must be finite and > 0 (got {value})"));
        }
    }

    fn check_escalation(lower: f64, upper: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass, catch them explicitly
        if !lower.is_finite() || !upper.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got lower={lower}, upper={upper})"
            ));
            return;
        }
        if upper < lower {
            errors.push(format!(
                "{name}: upper ({upper:.1}) must be >= lower ({lower:.1})"
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Well Info
// ============================================================================

/// Identification metadata. Not used for logic; appears in logs and reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellInfo {
    #[serde(default = "default_well_name")]
    pub name: String,

    #[serde(default)]
    pub field: String,

    #[serde(default)]
    pub rig: String,
}

fn default_well_name() -> String {
    "DEFAULT".to_string()
}

impl Default for WellInfo {
    fn default() -> Self {
        Self {
            name: default_well_name(),
            field: String::new(),
            rig: String::new(),
        }
    }
}

// ============================================================================
// Engine Config
// ============================================================================

/// What the string holds before the first stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitialStringFill {
    /// Air for final-layers schedules, active mud for programs
    #[default]
    Auto,
    /// Full of the active mud
    Active,
    /// Empty (air)
    Air,
}

/// Fluid-stack engine constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Gravitational acceleration (m/s²).
    #[serde(default = "default_gravity")]
    pub gravity_m_s2: f64,

    /// Density of the fallback fluid used for missing references (kg/m³).
    #[serde(default = "default_fluid_density")]
    pub default_fluid_density_kg_m3: f64,

    /// Newtonian viscosity of the fallback fluid (Pa·s).
    #[serde(default = "default_fluid_viscosity")]
    pub default_fluid_viscosity_pa_s: f64,

    /// Volumes below this are treated as zero (m³).
    #[serde(default = "default_volume_tolerance")]
    pub volume_tolerance_m3: f64,

    /// Segments shorter than this are dropped (m).
    #[serde(default = "default_depth_tolerance")]
    pub depth_tolerance_m: f64,

    /// Initial string content.
    #[serde(default)]
    pub initial_string: InitialStringFill,
}

fn default_gravity() -> f64 {
    defaults::GRAVITY_M_S2
}

fn default_fluid_density() -> f64 {
    defaults::DEFAULT_FLUID_DENSITY_KG_M3
}

fn default_fluid_viscosity() -> f64 {
    defaults::DEFAULT_FLUID_VISCOSITY_PA_S
}

fn default_volume_tolerance() -> f64 {
    defaults::VOLUME_TOLERANCE_M3
}

fn default_depth_tolerance() -> f64 {
    defaults::DEPTH_TOLERANCE_M
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity_m_s2: default_gravity(),
            default_fluid_density_kg_m3: default_fluid_density(),
            default_fluid_viscosity_pa_s: default_fluid_viscosity(),
            volume_tolerance_m3: default_volume_tolerance(),
            depth_tolerance_m: default_depth_tolerance(),
            initial_string: InitialStringFill::default(),
        }
    }
}

// ============================================================================
// Hydraulics Config
// ============================================================================

/// Flow-regime limits and rate defaults for friction pressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydraulicsConfig {
    /// Generalised Reynolds number below which flow is laminar.
    #[serde(default = "default_laminar_re")]
    pub laminar_reynolds_limit: f64,

    /// Generalised Reynolds number above which flow is fully turbulent.
    /// Between the two limits laminar and turbulent gradients are blended.
    #[serde(default = "default_turbulent_re")]
    pub turbulent_reynolds_limit: f64,

    /// Pump rate used when neither the caller nor the stage gives one (m³/min).
    #[serde(default)]
    pub default_pump_rate_m3_min: f64,
}

fn default_laminar_re() -> f64 {
    defaults::LAMINAR_REYNOLDS_LIMIT
}

fn default_turbulent_re() -> f64 {
    defaults::TURBULENT_REYNOLDS_LIMIT
}

impl Default for HydraulicsConfig {
    fn default() -> Self {
        Self {
            laminar_reynolds_limit: default_laminar_re(),
            turbulent_reynolds_limit: default_turbulent_re(),
            default_pump_rate_m3_min: 0.0,
        }
    }
}

// ============================================================================
// Pump Config
// ============================================================================

/// Mud pump output, for stroke counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PumpConfig {
    /// Volume per stroke (m³). 0 disables stroke conversion.
    #[serde(default)]
    pub output_m3_per_stroke: f64,
}

// ============================================================================
// Tests
// ============================================================================
