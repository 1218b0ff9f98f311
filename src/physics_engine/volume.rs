//! Volume ↔ depth conversion over piecewise-constant compartment geometry
//!
//! A compartment's cross-section changes at section boundaries, so a volume
//! cannot be turned into a length with one area. These helpers walk the
//! sections and apportion volume across boundaries. Gaps between sections
//! carry no volume.

use crate::types::{CompartmentGeometry, Section, WellGeometry};

/// Total fluid capacity of the compartment (m³).
pub fn capacity(geom: &CompartmentGeometry) -> f64 {
    volume_between(geom, 0.0, geom.bottom_md())
}

/// Annulus volume below the bit, out of the circulation path (m³).
///
/// Zero when the string reaches the annulus bottom or has no geometry.
pub fn rathole(geometry: &WellGeometry) -> f64 {
    let bit = geometry.bit_md();
    let bottom = geometry.annulus.bottom_md();
    if bit <= 0.0 || bit >= bottom {
        return 0.0;
    }
    volume_between(&geometry.annulus, bit, bottom)
}

/// Volume between two measured depths (m³). Order of the bounds does not matter.
pub fn volume_between(geom: &CompartmentGeometry, a: f64, b: f64) -> f64 {
    let (top, bottom) = if a <= b { (a, b) } else { (b, a) };
    pieces(geom, top, bottom)
        .map(|(t, b, s)| s.flow_area(geom.side()) * (b - t))
        .sum()
}

/// Depth reached by filling `volume` downward from `start_md`.
///
/// Clamped to the compartment bottom when the volume does not fit.
pub fn depth_below(geom: &CompartmentGeometry, start_md: f64, volume: f64) -> f64 {
    let mut remaining = volume.max(0.0);
    let mut cursor = start_md.max(0.0);
    for section in geom.sections() {
        if section.bottom_md <= cursor {
            continue;
        }
        let top = cursor.max(section.top_md);
        let area = section.flow_area(geom.side());
        if area <= 0.0 {
            cursor = section.bottom_md;
            continue;
        }
        let available = area * (section.bottom_md - top);
        if remaining <= available {
            return top + remaining / area;
        }
        remaining -= available;
        cursor = section.bottom_md;
    }
    cursor.max(geom.bottom_md()).max(start_md.max(0.0))
}

/// Depth reached by filling `volume` upward from `end_md`, clamped at surface.
pub fn depth_above(geom: &CompartmentGeometry, end_md: f64, volume: f64) -> f64 {
    let mut remaining = volume.max(0.0);
    let mut cursor = end_md.min(geom.bottom_md());
    for section in geom.sections().iter().rev() {
        if section.top_md >= cursor {
            continue;
        }
        let bottom = cursor.min(section.bottom_md);
        let area = section.flow_area(geom.side());
        if area <= 0.0 {
            cursor = section.top_md;
            continue;
        }
        let available = area * (bottom - section.top_md);
        if remaining <= available {
            return bottom - remaining / area;
        }
        remaining -= available;
        cursor = section.top_md;
    }
    0.0
}

/// Sub-intervals of `[top, bottom]` that fall inside sections, with their section.
pub fn pieces(
    geom: &CompartmentGeometry,
    top: f64,
    bottom: f64,
) -> impl Iterator<Item = (f64, f64, &Section)> {
    geom.sections().iter().filter_map(move |s| {
        let t = top.max(s.top_md);
        let b = bottom.min(s.bottom_md);
        (b > t).then_some((t, b, s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use std::f64::consts::PI;

    fn tapered_string() -> CompartmentGeometry {
        CompartmentGeometry::new(
            Side::String,
            vec![
                Section::new("upper", 0.0, 500.0, 0.1, 0.127),
                Section::new("lower", 500.0, 800.0, 0.05, 0.0889),
            ],
        )
        .unwrap()
    }

    fn area(d: f64) -> f64 {
        PI * d * d / 4.0
    }

    #[test]
    fn test_capacity_sums_sections() {
        let geom = tapered_string();
        let expected = area(0.1) * 500.0 + area(0.05) * 300.0;
        assert!((capacity(&geom) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_depth_below_crosses_section_boundary() {
        let geom = tapered_string();
        let upper_volume = area(0.1) * 500.0;
        let extra = area(0.05) * 100.0;
        let depth = depth_below(&geom, 0.0, upper_volume + extra);
        assert!((depth - 600.0).abs() < 1e-9, "got {depth}");
    }

    #[test]
    fn test_depth_below_clamps_to_bottom() {
        let geom = tapered_string();
        assert_eq!(depth_below(&geom, 0.0, 1e6), 800.0);
    }

    #[test]
    fn test_depth_above_mirrors_depth_below() {
        let geom = tapered_string();
        let v = area(0.05) * 300.0 + area(0.1) * 50.0;
        let depth = depth_above(&geom, 800.0, v);
        assert!((depth - 450.0).abs() < 1e-9, "got {depth}");
        assert!((volume_between(&geom, depth, 800.0) - v).abs() < 1e-9);
    }

    #[test]
    fn test_gap_carries_no_volume() {
        let geom = CompartmentGeometry::new(
            Side::String,
            vec![
                Section::new("a", 0.0, 100.0, 0.1, 0.127),
                Section::new("b", 200.0, 300.0, 0.1, 0.127),
            ],
        )
        .unwrap();
        assert!((volume_between(&geom, 0.0, 300.0) - area(0.1) * 200.0).abs() < 1e-9);
        // Exactly one section full lands on its bottom, not inside the gap
        let d = depth_below(&geom, 0.0, area(0.1) * 150.0);
        assert!((d - 250.0).abs() < 1e-9, "got {d}");
    }

    #[test]
    fn test_depth_walks_start_mid_section() {
        let geom = tapered_string();
        // From 400 m: 100 m of the upper section, then 50 m of the lower
        let v = area(0.1) * 100.0 + area(0.05) * 50.0;
        assert!((depth_below(&geom, 400.0, v) - 550.0).abs() < 1e-9);
        assert!((depth_above(&geom, 550.0, v) - 400.0).abs() < 1e-9);
        // Sections wholly above the start are skipped
        assert!((depth_below(&geom, 600.0, area(0.05) * 100.0) - 700.0).abs() < 1e-9);
        assert_eq!(depth_above(&geom, 800.0, 1e6), 0.0);
    }

    #[test]
    fn test_rathole_is_annulus_below_bit() {
        let well = |string_bottom: f64| {
            WellGeometry::new(
                vec![Section::new("dp", 0.0, string_bottom, 0.1, 0.127)],
                vec![Section::new("oh", 0.0, 900.0, 0.216, 0.127)],
            )
            .unwrap()
        };
        let annulus_area = area(0.216) - area(0.127);
        assert!((rathole(&well(800.0)) - annulus_area * 100.0).abs() < 1e-9);
        assert_eq!(rathole(&well(900.0)), 0.0);
        assert_eq!(rathole(&well(950.0)), 0.0);
    }
}
