//! Stealth scenario runner
//!
//! Loads a scenario file, runs it headless and prints a summary.
//!
//! Run with: cargo run -p stealth_sim -- crates/stealth_sim/scenarios/courtyard.toml

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stealth_sim::{load_scenario, SimSummary, Simulation, SimulationSettings};

/// Run a stealth scenario without a game engine
#[derive(Parser)]
#[command(name = "stealth-sim")]
#[command(about = "Headless runner for stealth guard scenarios", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file (TOML)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Seconds to simulate (overrides the scenario)
    #[arg(short, long)]
    duration: Option<f32>,

    /// Seconds per step (overrides the scenario)
    #[arg(short, long)]
    step: Option<f32>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let scenario = load_scenario(&cli.scenario)
        .with_context(|| format!("Failed to load scenario: {}", cli.scenario.display()))?;

    let defaults = scenario.simulation;
    let settings = SimulationSettings {
        duration: cli.duration.unwrap_or(defaults.duration),
        step: cli.step.unwrap_or(defaults.step),
    };
    let mut simulation = Simulation::new(scenario)?.with_settings(settings)?;
    log::info!(
        "Running {} for {:.1}s at {:.3}s per step",
        cli.scenario.display(),
        settings.duration,
        settings.step
    );
    let summary = simulation.run();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &SimSummary) {
    println!();
    println!("Simulated {:.2}s in {} steps", summary.elapsed, summary.steps);
    println!(
        "Transitions: {}  Alerts: {}  Sounds heard: {}",
        summary.transitions, summary.alerts, summary.sounds_heard
    );
    match summary.first_caught_at {
        Some(time) => println!("Player caught at {:.2}s", time),
        None => println!("Player never caught"),
    }
    println!("Player ended at {:?}", summary.player_position);
    println!();
    for agent in &summary.agents {
        println!(
            "  {:<16} {:<7} detection {:.2} (peak {:.2}) at {:?}{}",
            agent.name,
            agent.state.to_string(),
            agent.detection,
            agent.peak_detection,
            agent.position,
            if agent.caught_target { "  [caught]" } else { "" }
        );
    }
}
