//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse: the raw TOML is first walked as a `toml::Value` tree and
//! compared against the known field names, emitting "did you mean?" warnings.
//! Normal serde deserialization follows. Warnings never break a config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `SimConfig`.
///
/// Kept in step with the struct hierarchy in sim_config.rs by hand.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [well]
        "well",
        "well.name",
        "well.field",
        "well.rig",
        // [engine]
        "engine",
        "engine.gravity_m_s2",
        "engine.default_fluid_density_kg_m3",
        "engine.default_fluid_viscosity_pa_s",
        "engine.volume_tolerance_m3",
        "engine.depth_tolerance_m",
        "engine.initial_string",
        // [hydraulics]
        "hydraulics",
        "hydraulics.laminar_reynolds_limit",
        "hydraulics.turbulent_reynolds_limit",
        "hydraulics.default_pump_rate_m3_min",
        // [pump]
        "pump",
        "pump.output_m3_per_stroke",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// A table `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for unknown config keys.
///
/// Never fails; parse errors are reported later by serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed config.
///
/// Returns (errors, warnings): errors are impossible values that must prevent
/// startup, warnings are suspicious but allowed.
pub fn validate_physical_ranges(
    config: &super::SimConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let e = &config.engine;

    // Gravity: anything outside 9.7-9.9 m/s² is not Earth
    if !(9.0..=10.5).contains(&e.gravity_m_s2) {
        errors.push(format!(
            "engine.gravity_m_s2 = {:.3} is outside physical range (9.0-10.5 m/s²)",
            e.gravity_m_s2
        ));
    } else if !(9.7..=9.9).contains(&e.gravity_m_s2) {
        warnings.push(ValidationWarning {
            field: "engine.gravity_m_s2".to_string(),
            message: format!(
                "gravity_m_s2 = {:.3} is outside typical range (9.7-9.9 m/s²)",
                e.gravity_m_s2
            ),
            suggestion: None,
        });
    }

    // Fallback fluid density: 500-3000 kg/m³ covers base oil to heavy brine
    let rho = e.default_fluid_density_kg_m3;
    if rho > 0.0 && !(500.0..=3000.0).contains(&rho) {
        warnings.push(ValidationWarning {
            field: "engine.default_fluid_density_kg_m3".to_string(),
            message: format!(
                "default_fluid_density_kg_m3 = {rho:.0} is outside typical range (500-3000 kg/m³)"
            ),
            suggestion: None,
        });
    }

    // Tolerances coarser than a litre / centimetre distort the stack
    if e.volume_tolerance_m3 > 1e-3 {
        errors.push(format!(
            "engine.volume_tolerance_m3 = {} is too coarse (max 1e-3 m³)",
            e.volume_tolerance_m3
        ));
    }
    if e.depth_tolerance_m > 1e-2 {
        errors.push(format!(
            "engine.depth_tolerance_m = {} is too coarse (max 1e-2 m)",
            e.depth_tolerance_m
        ));
    }

    let lam = config.hydraulics.laminar_reynolds_limit;
    if lam > 0.0 && !(1000.0..=4000.0).contains(&lam) {
        warnings.push(ValidationWarning {
            field: "hydraulics.laminar_reynolds_limit".to_string(),
            message: format!(
                "laminar_reynolds_limit = {lam:.0} is outside typical range (1000-4000)"
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("gravity", "gravity"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("gravty", "gravity"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = "[engine]\ngravity_m_s2 = 9.81\n".parse().unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"engine".to_string()));
        assert!(keys.contains(&"engine.gravity_m_s2".to_string()));
    }

    #[test]
    fn test_suggestion_for_typo() {
        let known = known_config_keys();
        assert_eq!(
            suggest_correction("engine.gravity_m_s", &known).as_deref(),
            Some("engine.gravity_m_s2")
        );
        assert!(suggest_correction("completely.unrelated.key", &known).is_none());
    }

    #[test]
    fn test_default_config_has_no_range_errors() {
        let (errors, warnings) = validate_physical_ranges(&crate::config::SimConfig::default());
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert!(warnings.is_empty());
    }
}
