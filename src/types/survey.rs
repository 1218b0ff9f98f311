//! Measured depth to true vertical depth mapping

use serde::{Deserialize, Serialize};

/// Maps measured depth (m) to true vertical depth (m).
pub trait TvdLookup {
    fn tvd(&self, md: f64) -> f64;
}

/// Survey station as stored in a project file.
///
/// Either `tvd` or `inclination_deg` must be set; when both are present
/// `tvd` wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SurveyStation {
    pub md: f64,
    #[serde(default)]
    pub tvd: Option<f64>,
    #[serde(default)]
    pub inclination_deg: Option<f64>,
}

/// Piecewise-linear MD→TVD table built from survey stations.
///
/// An empty survey behaves as a vertical hole. Beyond the last station the
/// last MD/TVD gradient is extended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Survey {
    /// (md, tvd) sorted by md, starting at (0, 0)
    points: Vec<(f64, f64)>,
}

impl Survey {
    pub fn vertical() -> Self {
        Self::default()
    }

    /// Build from (md, tvd) pairs. Non-finite and negative entries are skipped.
    pub fn from_md_tvd(stations: &[(f64, f64)]) -> Self {
        let mut points: Vec<(f64, f64)> = stations
            .iter()
            .copied()
            .filter(|(md, tvd)| md.is_finite() && tvd.is_finite() && *md > 0.0 && *tvd >= 0.0)
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.dedup_by(|a, b| a.0 == b.0);
        if !points.is_empty() {
            points.insert(0, (0.0, 0.0));
        }
        Self { points }
    }

    /// Build from (md, inclination°) pairs using the balanced-tangential method.
    pub fn from_inclinations(stations: &[(f64, f64)]) -> Self {
        let mut sorted: Vec<(f64, f64)> = stations
            .iter()
            .copied()
            .filter(|(md, inc)| md.is_finite() && inc.is_finite() && *md >= 0.0)
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        if sorted.first().map_or(true, |s| s.0 > 0.0) {
            sorted.insert(0, (0.0, 0.0));
        }

        let mut pairs = Vec::with_capacity(sorted.len());
        let mut tvd = 0.0;
        for w in sorted.windows(2) {
            let (md1, inc1) = w[0];
            let (md2, inc2) = w[1];
            tvd += (md2 - md1) * (inc1.to_radians().cos() + inc2.to_radians().cos()) / 2.0;
            pairs.push((md2, tvd));
        }
        Self::from_md_tvd(&pairs)
    }

    /// Build from project-file stations, mixing TVD and inclination entries.
    pub fn from_stations(stations: &[SurveyStation]) -> Self {
        if stations.iter().all(|s| s.tvd.is_some()) {
            let pairs: Vec<(f64, f64)> = stations
                .iter()
                .filter_map(|s| s.tvd.map(|tvd| (s.md, tvd)))
                .collect();
            return Self::from_md_tvd(&pairs);
        }
        let pairs: Vec<(f64, f64)> = stations
            .iter()
            .map(|s| (s.md, s.inclination_deg.unwrap_or(0.0)))
            .collect();
        Self::from_inclinations(&pairs)
    }

    pub fn is_vertical(&self) -> bool {
        self.points.is_empty()
    }
}

impl TvdLookup for Survey {
    fn tvd(&self, md: f64) -> f64 {
        if md <= 0.0 || !md.is_finite() {
            return 0.0;
        }
        if self.points.len() < 2 {
            return md;
        }
        let idx = self.points.partition_point(|p| p.0 < md);
        let (a, b) = if idx == 0 {
            (self.points[0], self.points[1])
        } else if idx >= self.points.len() {
            (self.points[self.points.len() - 2], self.points[self.points.len() - 1])
        } else {
            (self.points[idx - 1], self.points[idx])
        };
        let span = b.0 - a.0;
        if span <= 0.0 {
            return a.1;
        }
        a.1 + (md - a.0) * (b.1 - a.1) / span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_survey_is_vertical() {
        let s = Survey::vertical();
        assert_eq!(s.tvd(800.0), 800.0);
        assert_eq!(s.tvd(-5.0), 0.0);
    }

    #[test]
    fn test_linear_interpolation_and_extrapolation() {
        let s = Survey::from_md_tvd(&[(1000.0, 1000.0), (2000.0, 1500.0)]);
        assert!((s.tvd(500.0) - 500.0).abs() < 1e-9);
        assert!((s.tvd(1500.0) - 1250.0).abs() < 1e-9);
        // Extends the last gradient (0.5 m/m)
        assert!((s.tvd(2200.0) - 1600.0).abs() < 1e-9);
    }

    #[test]
    fn test_inclination_survey() {
        // Constant 60° inclination: TVD = MD × cos 60°
        let s = Survey::from_inclinations(&[(0.0, 60.0), (1000.0, 60.0)]);
        assert!((s.tvd(1000.0) - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_stations_prefers_tvd() {
        let stations = [
            SurveyStation { md: 500.0, tvd: Some(450.0), inclination_deg: Some(10.0) },
            SurveyStation { md: 1000.0, tvd: Some(900.0), inclination_deg: None },
        ];
        let s = Survey::from_stations(&stations);
        assert!((s.tvd(1000.0) - 900.0).abs() < 1e-9);
    }
}
