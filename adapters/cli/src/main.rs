#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a turngrid scenario without a window.

mod layout_transfer;
mod render;
mod scenario;
mod wander;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use turngrid_world::{query, World};

use crate::{
    layout_transfer::MapLayout,
    render::{describe_event, render_map, roster},
    scenario::{Scenario, DEFAULT_SCENARIO},
};

/// Command-line arguments accepted by the turngrid binary.
#[derive(Debug, Parser)]
#[command(name = "turngrid", about = "Plays a turn-based grid scenario in the terminal")]
struct Cli {
    /// Scenario file to load instead of the built-in village.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,
    /// Shared layout string replacing the scenario's grid and elements.
    #[arg(long, value_name = "LAYOUT")]
    layout: Option<String>,
    /// Number of full rounds to play.
    #[arg(long, default_value_t = 3)]
    rounds: u64,
    /// Seed for wandering agents.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Skip drawing the map after each round.
    #[arg(long)]
    quiet_map: bool,
    /// Print the scenario's layout string and exit.
    #[arg(long)]
    export_layout: bool,
}

/// Entry point for the turngrid command-line interface.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::parse(DEFAULT_SCENARIO).context("built-in scenario is invalid")?,
    };
    if let Some(layout) = &cli.layout {
        let layout = MapLayout::decode(layout).context("failed to decode --layout")?;
        scenario.adopt_layout(layout);
    }
    if cli.export_layout {
        println!("{}", scenario.layout().encode()?);
        return Ok(());
    }

    let mut setup_events = Vec::new();
    let mut world = scenario.build_world(&mut setup_events);
    let mut scheduler = scenario.build_scheduler(&world, cli.seed)?;
    info!(
        "loaded {} elements and {} actors ({} setup events)",
        query::element_count(&world),
        scheduler.actor_count(),
        setup_events.len()
    );

    print_map(&world, cli.quiet_map);
    if scheduler.actor_count() == 0 {
        warn!("scenario has no actors, nothing to play");
        return Ok(());
    }

    for _ in 0..cli.rounds {
        let reports = scheduler.run_rounds(&mut world, 1).await?;
        println!("== Round {} ==", scheduler.round());
        for report in &reports {
            for line in report
                .events
                .iter()
                .filter_map(|event| describe_event(&world, event))
            {
                println!("  {line}");
            }
            if report.timed_out {
                println!("  {} ran out of time", report.actor);
            }
        }
        print_map(&world, cli.quiet_map);
    }

    for line in roster(&world) {
        println!("{line}");
    }
    Ok(())
}

fn print_map(world: &World, quiet: bool) {
    if !quiet {
        print!("{}", render_map(world));
    }
}
