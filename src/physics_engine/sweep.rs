//! Batch what-if evaluations
//!
//! Every evaluation is a pure function of its inputs, so sweeps fan out over
//! rayon's pool with no shared state. Output order matches input order.

use rayon::prelude::*;

use super::hydraulics;
use super::pump_schedule::PumpSchedule;
use crate::types::{push_unique, Evaluated, HydraulicsInput, HydraulicsResult, SweepPoint};

/// Hydraulics at one schedule point for each pump rate (m³/min).
///
/// The fluid stack does not depend on rate, so it is resolved once.
pub fn rate_sweep(
    schedule: &PumpSchedule<'_>,
    stage_index: usize,
    progress: f64,
    input: &HydraulicsInput,
    rates_m3_min: &[f64],
) -> Vec<Evaluated<SweepPoint>> {
    let stack = schedule.segments_at(stage_index, progress);
    let control_md = schedule.control_md(input.control_depth);

    rates_m3_min
        .par_iter()
        .map(|&rate| {
            let eval = hydraulics::evaluate(
                schedule.project(),
                schedule.settings(),
                &stack.value,
                rate,
                control_md,
                &input.mpd,
            );
            let mut diagnostics = stack.diagnostics.clone();
            for d in eval.diagnostics {
                push_unique(&mut diagnostics, d);
            }
            Evaluated::new(
                SweepPoint {
                    pump_rate_m3_min: rate,
                    result: eval.value,
                },
                diagnostics,
            )
        })
        .collect()
}

/// Hydraulics through one stage at `steps + 1` evenly spaced progress values.
pub fn progress_sweep(
    schedule: &PumpSchedule<'_>,
    stage_index: usize,
    steps: usize,
    input: &HydraulicsInput,
) -> Vec<Evaluated<HydraulicsResult>> {
    let steps = steps.max(1);
    (0..=steps)
        .into_par_iter()
        .map(|i| schedule.hydraulics_for_current(stage_index, i as f64 / steps as f64, input))
        .collect()
}
