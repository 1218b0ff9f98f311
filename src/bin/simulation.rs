//! Pump Schedule Replay
//!
//! Scrubs through every stage of a project's pump schedule the way the
//! progress slider does, emitting one record per tick with the surface
//! returns and hydraulics at that point. Useful for plotting and for
//! checking that results move smoothly from tick to tick.
//!
//! # Usage
//! ```bash
//! ./simulation --project well.toml --ticks 50 --rate 1.5 > replay.jsonl
//! ./simulation --project well.toml --format csv --quiet > replay.csv
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use wellflow::config::{self, defaults, SimConfig};
use wellflow::physics_engine::{EngineSettings, PumpSchedule};
use wellflow::types::{ControlDepth, HydraulicsInput, Side};
use wellflow::ProjectSnapshot;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "wellflow-simulation")]
#[command(about = "Replay a pump schedule tick by tick")]
#[command(version)]
struct Args {
    /// Project TOML file
    #[arg(short, long)]
    project: PathBuf,

    /// Progress ticks per stage
    #[arg(
        short,
        long,
        default_value_t = defaults::REPLAY_TICKS_PER_STAGE,
        value_parser = clap::value_parser!(u32).range(1..=10_000)
    )]
    ticks: u32,

    /// Pump rate (m³/min); defaults to each stage's rate
    #[arg(short, long)]
    rate: Option<f64>,

    /// Control depth (m MD); defaults to the bit
    #[arg(long)]
    control_md: Option<f64>,

    /// Output format: json or csv
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Suppress the replay log on stderr
    #[arg(short, long)]
    quiet: bool,
}

/// One replay record.
#[derive(Debug, Serialize)]
struct Tick {
    stage_index: usize,
    stage_name: String,
    progress: f64,
    pumped_m3: f64,
    cumulative_m3: f64,
    strokes: Option<f64>,
    front: Side,
    expelled_m3: f64,
    displaced_in_hole_m3: f64,
    bhp_pa: f64,
    ecd_kg_m3: f64,
    tcp_pa: f64,
    annulus_friction_pa: f64,
    string_friction_pa: f64,
    diagnostics: usize,
}

impl Tick {
    const CSV_HEADER: &'static str = concat!(
        "stage_index,stage_name,progress,pumped_m3,cumulative_m3,strokes,front,",
        "expelled_m3,displaced_in_hole_m3,bhp_pa,ecd_kg_m3,tcp_pa,",
        "annulus_friction_pa,string_friction_pa,diagnostics"
    );

    fn to_csv(&self) -> String {
        format!(
            "{},\"{}\",{:.4},{:.4},{:.4},{},{},{:.4},{:.4},{:.1},{:.2},{:.1},{:.1},{:.1},{}",
            self.stage_index,
            self.stage_name.replace('"', "'"),
            self.progress,
            self.pumped_m3,
            self.cumulative_m3,
            self.strokes.map_or_else(String::new, |s| format!("{s:.1}")),
            self.front,
            self.expelled_m3,
            self.displaced_in_hole_m3,
            self.bhp_pa,
            self.ecd_kg_m3,
            self.tcp_pa,
            self.annulus_friction_pa,
            self.string_friction_pa,
            self.diagnostics
        )
    }
}

fn log_replay(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[replay] {message}");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    config::init(SimConfig::load());
    let settings = EngineSettings::from_config(config::get());

    let project = ProjectSnapshot::load(&args.project)
        .with_context(|| format!("Failed to load project {}", args.project.display()))?;
    let schedule = PumpSchedule::with_settings(&project, settings);

    let csv = args.format.eq_ignore_ascii_case("csv");
    let input = HydraulicsInput {
        pump_rate_m3_min: args.rate,
        control_depth: args.control_md.map_or(ControlDepth::Bit, ControlDepth::Custom),
        ..HydraulicsInput::default()
    };

    log_replay(&"=".repeat(60), args.quiet);
    log_replay(&format!("Project: {}", project.name()), args.quiet);
    log_replay(&format!("Mode: {}", project.mode()), args.quiet);
    log_replay(
        &format!(
            "Stages: {} ({:.3} m³ total), {} ticks per stage",
            schedule.stages().len(),
            schedule.total_volume(),
            args.ticks
        ),
        args.quiet,
    );
    log_replay(&"=".repeat(60), args.quiet);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if csv {
        writeln!(out, "{}", Tick::CSV_HEADER)?;
    }

    let mut completed = 0.0;
    for (stage_index, stage) in schedule.stages().iter().enumerate() {
        log_replay(
            &format!(
                "Stage {stage_index}: {} ({:.3} m³, {})",
                stage.name, stage.total_volume_m3, stage.side
            ),
            args.quiet,
        );
        for tick in 0..=args.ticks {
            let progress = f64::from(tick) / f64::from(args.ticks);
            let pumped = stage.total_volume_m3 * progress;
            let returns = schedule.returns(stage_index, pumped).value;
            let hyd = schedule.hydraulics_for_current(stage_index, progress, &input);
            let front = schedule.front_side_at(stage_index, pumped).unwrap_or(stage.side);

            let record = Tick {
                stage_index,
                stage_name: stage.name.clone(),
                progress,
                pumped_m3: pumped,
                cumulative_m3: completed + pumped,
                strokes: schedule.strokes_for_volume(completed + pumped),
                front,
                expelled_m3: returns.expelled_volume(),
                displaced_in_hole_m3: returns.displaced_in_hole_m3,
                bhp_pa: hyd.value.bhp_pa,
                ecd_kg_m3: hyd.value.ecd_kg_m3,
                tcp_pa: hyd.value.tcp_pa,
                annulus_friction_pa: hyd.value.annulus_friction_pa,
                string_friction_pa: hyd.value.string_friction_pa,
                diagnostics: hyd.diagnostics.len(),
            };

            if csv {
                writeln!(out, "{}", record.to_csv())?;
            } else {
                writeln!(out, "{}", serde_json::to_string(&record)?)?;
            }
        }
        completed += stage.total_volume_m3;
    }
    out.flush()?;

    log_replay(&format!("Replay complete: {completed:.3} m³ pumped"), args.quiet);
    Ok(())
}
