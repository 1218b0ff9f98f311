//! Config Validation Tests
//!
//! Typo detection, physical range checks and file round-trips for the
//! engine config, exercised independently from the engine.

use std::io::Write;

use wellflow::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use wellflow::config::{ConfigError, InitialStringFill, SimConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_engine_key_warns_with_suggestion() {
    let toml_str = r#"
[engine]
gravty_m_s2 = 9.81
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("gravty_m_s2"));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("engine.gravity_m_s2"));
}

#[test]
fn typo_in_well_section_warns() {
    let toml_str = r#"
[well]
naem = "Test-Well"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    // "naem" is distance 2 from "name"
    assert_eq!(warnings[0].suggestion.as_deref(), Some("well.name"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[well]
name = "Endeavour-7"
field = "North Sea"
rig = "Maersk Invincible"

[engine]
gravity_m_s2 = 9.81
default_fluid_density_kg_m3 = 1030.0
default_fluid_viscosity_pa_s = 0.0012
volume_tolerance_m3 = 1e-9
depth_tolerance_m = 1e-6
initial_string = "air"

[hydraulics]
laminar_reynolds_limit = 2000.0
turbulent_reynolds_limit = 4000.0
default_pump_rate_m3_min = 1.5

[pump]
output_m3_per_stroke = 0.0185
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(
        warnings.is_empty(),
        "Valid config should produce 0 warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn unknown_section_warns() {
    let warnings = validate_unknown_keys("[torque_and_drag]\nfriction_factor = 0.25\n");
    assert!(warnings.iter().any(|w| w.field == "torque_and_drag"));
    assert!(warnings.iter().any(|w| w.field == "torque_and_drag.friction_factor"));
}

#[test]
fn empty_toml_produces_zero_warnings() {
    assert!(validate_unknown_keys("").is_empty());
}

#[test]
fn known_keys_set_is_complete() {
    let config = SimConfig::default();
    let toml_str = config.to_toml().expect("Default config should serialize");
    let warnings = validate_unknown_keys(&toml_str);
    assert!(
        warnings.is_empty(),
        "Default config serialization should produce 0 unknown-key warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn suggest_correction_returns_none_for_garbage() {
    let known = known_config_keys();
    assert!(suggest_correction("zzz_completely_invalid_xyz_12345", &known).is_none());
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn lunar_gravity_is_error() {
    let mut config = SimConfig::default();
    config.engine.gravity_m_s2 = 1.62;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("gravity_m_s2")));
}

#[test]
fn slightly_off_gravity_is_warning() {
    let mut config = SimConfig::default();
    config.engine.gravity_m_s2 = 10.0;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings.iter().any(|w| w.field == "engine.gravity_m_s2"));
}

#[test]
fn coarse_volume_tolerance_is_error() {
    let mut config = SimConfig::default();
    config.engine.volume_tolerance_m3 = 0.5;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("volume_tolerance_m3")));
}

#[test]
fn exotic_default_density_is_warning() {
    let mut config = SimConfig::default();
    config.engine.default_fluid_density_kg_m3 = 5000.0;
    let (_, warnings) = validate_physical_ranges(&config);
    assert!(warnings.iter().any(|w| w.field.contains("default_fluid_density")));
}

#[test]
fn all_defaults_pass_validation() {
    let config = SimConfig::default();
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty(), "Default config should have 0 range errors: {errors:?}");
    assert!(warnings.is_empty());
    assert!(config.validate().is_ok(), "Default config must always pass full validation");
}

#[test]
fn validate_rejects_inverted_reynolds_limits() {
    let mut config = SimConfig::default();
    config.hydraulics.laminar_reynolds_limit = 5000.0;
    config.hydraulics.turbulent_reynolds_limit = 3000.0;
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation(ref v) if v.iter().any(|e| e.contains("reynolds"))
    ));
}

#[test]
fn validate_collects_every_error() {
    let mut config = SimConfig::default();
    config.engine.gravity_m_s2 = 0.0;
    config.engine.depth_tolerance_m = f64::NAN;
    config.pump.output_m3_per_stroke = -1.0;
    match config.validate() {
        Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3, "{errors:?}"),
        other => panic!("expected validation errors, got {other:?}"),
    }
}

// ============================================================================
// File Round-trips
// ============================================================================

#[test]
fn config_roundtrip_preserves_values() {
    let mut original = SimConfig::default();
    original.well.name = "Roundtrip-Test".to_string();
    original.engine.initial_string = InitialStringFill::Active;
    original.pump.output_m3_per_stroke = 0.02;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("wellflow.toml");
    original.save_to_file(&path).expect("save");
    let loaded = SimConfig::load_from_file(&path).expect("load");

    assert_eq!(loaded.well.name, "Roundtrip-Test");
    assert_eq!(loaded.engine.initial_string, InitialStringFill::Active);
    assert!((loaded.pump.output_m3_per_stroke - 0.02).abs() < f64::EPSILON);
}

#[test]
fn partial_file_fills_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[hydraulics]\ndefault_pump_rate_m3_min = 2.0").expect("write");
    let loaded = SimConfig::load_from_file(file.path()).expect("load");
    assert!((loaded.hydraulics.default_pump_rate_m3_min - 2.0).abs() < f64::EPSILON);
    assert!((loaded.engine.gravity_m_s2 - 9.81).abs() < f64::EPSILON);
}

#[test]
fn load_rejects_out_of_range_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[engine]\ngravity_m_s2 = 3.7").expect("write");
    let err = SimConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn load_reports_parse_errors_with_path() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[engine\ngravity_m_s2 = ").expect("write");
    let err = SimConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
    assert!(err.to_string().contains("parse"));
}

#[test]
fn missing_file_is_io_error() {
    let err =
        SimConfig::load_from_file(std::path::Path::new("/nonexistent/wellflow.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}
