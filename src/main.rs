//! Wellflow command-line interface
//!
//! Runs the fluid-stack and hydraulics engine over a project TOML file.
//!
//! ```bash
//! wellflow stages --project well.toml
//! wellflow stack --project well.toml --stage 1 --progress 0.5
//! wellflow hydraulics --project well.toml --stage 1 --progress 0.5 --rate 1.8
//! wellflow sweep --project well.toml --rates 0,0.5,1,1.5,2 --format json
//! wellflow check-config --config wellflow.toml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

use wellflow::config::{self, SimConfig};
use wellflow::physics_engine::{rate_sweep, EngineSettings, PumpSchedule};
use wellflow::types::{ControlDepth, Diagnostic, FluidSegment, HydraulicsInput, MpdSettings};
use wellflow::ProjectSnapshot;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "wellflow")]
#[command(about = "Wellbore fluid-stack and hydraulics simulation")]
#[command(version)]
struct CliArgs {
    /// Engine config file (default: $WELLFLOW_CONFIG, then ./wellflow.toml)
    #[arg(long, global = true, env = "WELLFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Schedule position shared by the evaluation subcommands.
#[derive(clap::Args, Debug)]
struct Cursor {
    /// Project TOML file
    #[arg(short, long)]
    project: PathBuf,

    /// Stage index (0-based)
    #[arg(short, long, default_value = "0")]
    stage: usize,

    /// Progress within the stage (0-1)
    #[arg(long, default_value = "1.0")]
    progress: f64,
}

/// Hydraulics inputs shared by the pressure subcommands.
#[derive(clap::Args, Debug)]
struct Pumping {
    /// Pump rate (m³/min); defaults to the stage rate, then the configured default
    #[arg(long)]
    rate: Option<f64>,

    /// Control depth (m MD); defaults to the bit
    #[arg(long)]
    control_md: Option<f64>,

    /// Enable MPD with this surface back pressure (Pa)
    #[arg(long)]
    sbp: Option<f64>,

    /// Enable MPD and solve back pressure for this ECD (kg/m³)
    #[arg(long)]
    target_ecd: Option<f64>,
}

impl Pumping {
    fn to_input(&self) -> HydraulicsInput {
        HydraulicsInput {
            pump_rate_m3_min: self.rate,
            control_depth: self.control_md.map_or(ControlDepth::Bit, ControlDepth::Custom),
            mpd: MpdSettings {
                enabled: self.sbp.is_some() || self.target_ecd.is_some(),
                back_pressure_pa: self.sbp.unwrap_or(0.0),
                target_ecd_kg_m3: self.target_ecd,
            },
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the pump stages built from the project
    Stages {
        /// Project TOML file
        #[arg(short, long)]
        project: PathBuf,
    },
    /// Fluid segments in string and annulus at a schedule point
    Stack {
        #[command(flatten)]
        cursor: Cursor,
    },
    /// BHP, ECD, SBP and TCP at a schedule point
    Hydraulics {
        #[command(flatten)]
        cursor: Cursor,
        #[command(flatten)]
        pumping: Pumping,
    },
    /// Annulus/string pressure and ECD down the well
    Profile {
        #[command(flatten)]
        cursor: Cursor,
        #[command(flatten)]
        pumping: Pumping,
        /// Depth step (m)
        #[arg(long, default_value = "100")]
        step: f64,
    },
    /// Hydraulics for a list of pump rates, evaluated in parallel
    Sweep {
        #[command(flatten)]
        cursor: Cursor,
        #[command(flatten)]
        pumping: Pumping,
        /// Pump rates (m³/min), comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        rates: Vec<f64>,
    },
    /// Load and validate the engine config, then print it
    CheckConfig,
    /// Write a config file with all defaults
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "wellflow.toml")]
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &args.command {
        Command::InitConfig { output, force } => return init_config(output, *force),
        Command::CheckConfig => {
            let config = load_config(args.config.as_deref())?;
            print_toml_or_json(&config, args.format)?;
            info!(well = %config.well.name, "Config OK");
            return Ok(());
        }
        _ => {}
    }

    config::init(load_config(args.config.as_deref())?);
    let settings = EngineSettings::from_config(config::get());

    match &args.command {
        Command::Stages { project } => {
            let project = load_project(project)?;
            let schedule = PumpSchedule::with_settings(&project, settings);
            report_diagnostics(schedule.build_diagnostics());
            match args.format {
                OutputFormat::Json => print_json(&schedule.stages())?,
                OutputFormat::Text => {
                    println!(
                        "{:<4} {:<40} {:<8} {:>10} {:>10}",
                        "#", "Stage", "Side", "Vol m³", "Strokes"
                    );
                    for (i, stage) in schedule.stages().iter().enumerate() {
                        let strokes = schedule
                            .strokes_for_volume(stage.total_volume_m3)
                            .map_or_else(|| "-".to_string(), |s| format!("{s:.0}"));
                        println!(
                            "{:<4} {:<40} {:<8} {:>10.3} {:>10}",
                            i, stage.name, stage.side, stage.total_volume_m3, strokes
                        );
                    }
                    println!("Total: {:.3} m³", schedule.total_volume());
                }
            }
        }
        Command::Stack { cursor } => {
            let project = load_project(&cursor.project)?;
            let schedule = PumpSchedule::with_settings(&project, settings);
            let stack = schedule.segments_at(cursor.stage, cursor.progress);
            let pumped = schedule.pumped_volume(cursor.stage, cursor.progress).value;
            let returns = schedule.returns(cursor.stage, pumped);
            report_diagnostics(&stack.diagnostics);
            match args.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "stack": stack.value,
                    "returns": returns.value,
                }))?,
                OutputFormat::Text => {
                    print_segments("String", &stack.value.string, &project);
                    print_segments("Annulus", &stack.value.annulus, &project);
                    println!("Returns:");
                    for e in &returns.value.expelled {
                        println!("  {:<24} {:>10.3} m³", e.fluid_name, e.volume_m3);
                    }
                    println!(
                        "  {:<24} {:>10.3} m³",
                        "In-hole fluid", returns.value.displaced_in_hole_m3
                    );
                    println!("  {:<24} {:>10.3} m³", "Vented air", returns.value.vented_air_m3);
                }
            }
        }
        Command::Hydraulics { cursor, pumping } => {
            let project = load_project(&cursor.project)?;
            let schedule = PumpSchedule::with_settings(&project, settings);
            let eval =
                schedule.hydraulics_for_current(cursor.stage, cursor.progress, &pumping.to_input());
            report_diagnostics(&eval.diagnostics);
            let r = eval.value;
            match args.format {
                OutputFormat::Json => print_json(&r)?,
                OutputFormat::Text => {
                    println!(
                        "Control depth:      {:>10.1} m MD / {:.1} m TVD",
                        r.control_md, r.control_tvd
                    );
                    println!("Pump rate:          {:>10.3} m³/min", r.pump_rate_m3_min);
                    println!("BHP:                {:>10.0} Pa", r.bhp_pa);
                    println!("ECD:                {:>10.1} kg/m³", r.ecd_kg_m3);
                    println!("SBP:                {:>10.0} Pa", r.sbp_pa);
                    println!("TCP:                {:>10.0} Pa", r.tcp_pa);
                    println!("Annulus friction:   {:>10.0} Pa", r.annulus_friction_pa);
                    println!("String friction:    {:>10.0} Pa", r.string_friction_pa);
                    println!("Annulus at control: {:>10.0} Pa", r.annulus_at_control_pa);
                    println!("String at control:  {:>10.0} Pa", r.string_at_control_pa);
                }
            }
        }
        Command::Profile { cursor, pumping, step } => {
            let project = load_project(&cursor.project)?;
            let schedule = PumpSchedule::with_settings(&project, settings);
            let depths = profile_depths(project.geometry().annulus.bottom_md(), *step);
            let eval = schedule.pressure_profile(
                cursor.stage,
                cursor.progress,
                &pumping.to_input(),
                &depths,
            );
            report_diagnostics(&eval.diagnostics);
            match args.format {
                OutputFormat::Json => print_json(&eval.value)?,
                OutputFormat::Text => {
                    println!(
                        "{:>8} {:>8} {:>12} {:>12} {:>8}",
                        "MD", "TVD", "Annulus Pa", "String Pa", "ECD"
                    );
                    for p in &eval.value {
                        println!(
                            "{:>8.1} {:>8.1} {:>12.0} {:>12.0} {:>8.1}",
                            p.md,
                            p.tvd,
                            p.annulus_pressure_pa,
                            p.string_pressure_pa,
                            p.annulus_ecd_kg_m3
                        );
                    }
                }
            }
        }
        Command::Sweep { cursor, pumping, rates } => {
            let project = load_project(&cursor.project)?;
            let schedule = PumpSchedule::with_settings(&project, settings);
            let points = rate_sweep(
                &schedule,
                cursor.stage,
                cursor.progress,
                &pumping.to_input(),
                rates,
            );
            if let Some(first) = points.first() {
                report_diagnostics(&first.diagnostics);
            }
            match args.format {
                OutputFormat::Json => {
                    let values: Vec<_> = points.iter().map(|p| p.value).collect();
                    print_json(&values)?;
                }
                OutputFormat::Text => {
                    println!("{:>10} {:>12} {:>8} {:>12}", "m³/min", "BHP Pa", "ECD", "TCP Pa");
                    for p in &points {
                        let r = &p.value.result;
                        println!(
                            "{:>10.3} {:>12.0} {:>8.1} {:>12.0}",
                            p.value.pump_rate_m3_min, r.bhp_pa, r.ecd_kg_m3, r.tcp_pa
                        );
                    }
                }
            }
        }
        Command::CheckConfig | Command::InitConfig { .. } => {}
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(p) => SimConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(SimConfig::load()),
    }
}

fn load_project(path: &Path) -> Result<ProjectSnapshot> {
    ProjectSnapshot::load(path)
        .with_context(|| format!("Failed to load project {}", path.display()))
}

fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }
    SimConfig::default()
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote default config to {}", output.display());
    Ok(())
}

/// Depths from `step` to `bottom` inclusive.
fn profile_depths(bottom: f64, step: f64) -> Vec<f64> {
    if bottom <= 0.0 || !step.is_finite() || step <= 0.0 {
        return Vec::new();
    }
    let mut depths = Vec::new();
    let mut md = step;
    while md < bottom {
        depths.push(md);
        md += step;
    }
    depths.push(bottom);
    depths
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        warn!(%d, "engine diagnostic");
    }
}

fn print_segments(label: &str, segments: &[FluidSegment], project: &ProjectSnapshot) {
    println!("{label}:");
    for s in segments {
        println!(
            "  {:>8.1} - {:>8.1} m  ({:>7.1} m)  {}",
            s.top_md,
            s.bottom_md,
            s.length(),
            project.fluid_name(s.fluid)
        );
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_toml_or_json(config: &SimConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(config),
        OutputFormat::Text => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
