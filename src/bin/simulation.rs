//! Fleet Telemetry Simulation
//!
//! Generates random-walk telemetry for a fleet of vehicles, either as JSON
//! lines on stdout or posted to a running engine.
//!
//! # Usage
//! ```bash
//! ./simulation --vehicles 10 --ticks 600 > readings.jsonl
//! ./simulation --vehicles 10 --scenario overheat --target http://localhost:8080
//! ```

use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;

use lead_engine::acquisition::{FleetSimulator, Scenario};
use lead_engine::config::defaults::SIMULATION_TICK_MS;
use lead_engine::processing::classify;
use lead_engine::types::{now_ms, HealthState};

#[derive(Parser, Debug)]
#[command(name = "fleet-simulation")]
#[command(about = "Vehicle telemetry simulation for the lead engine")]
#[command(version = "1.0")]
struct Args {
    /// Number of simulated vehicles
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=10_000))]
    vehicles: u32,

    /// Number of ticks to run (0 = until interrupted)
    #[arg(short, long, default_value = "60")]
    ticks: u64,

    /// Milliseconds between ticks (0 = no delay)
    #[arg(long, default_value_t = SIMULATION_TICK_MS)]
    tick_ms: u64,

    /// Fault to drift into: normal, overheat, battery-drain, fuel-leak
    #[arg(long, default_value = "normal")]
    scenario: Scenario,

    /// Engine base URL; readings are POSTed to {target}/api/v1/telemetry
    #[arg(long)]
    target: Option<String>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress the progress log on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn log_progress(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[sim] {message}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut fleet = FleetSimulator::new(args.vehicles as usize, args.scenario, args.seed);

    let client = match &args.target {
        Some(_) => Some(reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?),
        None => None,
    };
    let endpoint = args
        .target
        .as_deref()
        .map(|t| format!("{}/api/v1/telemetry", t.trim_end_matches('/')));

    log_progress(
        &format!(
            "{} vehicles, scenario {:?}, {} ticks every {} ms",
            args.vehicles, args.scenario, args.ticks, args.tick_ms
        ),
        args.quiet,
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut tick: u64 = 0;
    let mut critical_seen: u64 = 0;
    let mut failed_posts: u64 = 0;

    while args.ticks == 0 || tick < args.ticks {
        for reading in fleet.tick(now_ms()) {
            if classify(&reading).overall_status == HealthState::Critical {
                critical_seen += 1;
            }
            match (&client, &endpoint) {
                (Some(client), Some(endpoint)) => {
                    let ok = client
                        .post(endpoint)
                        .json(&reading)
                        .send()
                        .await
                        .map(|r| r.status().is_success())
                        .unwrap_or(false);
                    if !ok {
                        failed_posts += 1;
                    }
                }
                _ => writeln!(out, "{}", serde_json::to_string(&reading)?)?,
            }
        }
        tick += 1;

        if tick % 60 == 0 {
            log_progress(
                &format!("tick {tick}: {critical_seen} critical readings, {failed_posts} failed posts"),
                args.quiet,
            );
        }
        if args.tick_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.tick_ms)).await;
        }
    }

    out.flush()?;
    log_progress(
        &format!("done after {tick} ticks: {critical_seen} critical readings, {failed_posts} failed posts"),
        args.quiet,
    );
    Ok(())
}
