//! Telemetry Simulator
//!
//! Per-vehicle random walk producing plausible readings for demos and load
//! tests. Each tick:
//!
//! - speed moves by up to ±2 km/h, clamped to [0, 120]
//! - rpm follows 800 + 45·speed with ±25 noise
//! - fuel drops by 0.001 %
//! - coolant temperature hovers at 92 ± 0.2 °C
//! - position jitters by up to ±0.00002° around the fleet origin
//!
//! A `Scenario` can push one channel towards its alert thresholds.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::defaults::SIMULATION_ORIGIN;
use crate::storage::TelemetryStore;
use crate::types::{now_ms, GeoPoint, TelemetryReading};

const MAX_SPEED_KMH: f64 = 120.0;
const IDLE_RPM: f64 = 800.0;
const RPM_PER_KMH: f64 = 45.0;
const NOMINAL_TEMP_C: f64 = 92.0;
const NOMINAL_BATTERY_V: f64 = 12.6;
const FUEL_BURN_PER_TICK: f64 = 0.001;
const GPS_JITTER_DEG: f64 = 0.00002;

/// Fault to drift into over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scenario {
    #[default]
    Normal,
    /// Coolant temperature climbs 0.5 °C per tick
    Overheat,
    /// Battery loses 0.01 V per tick
    BatteryDrain,
    /// Fuel burns 100x faster
    FuelLeak,
}

impl std::str::FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "overheat" => Ok(Self::Overheat),
            "battery-drain" | "battery_drain" => Ok(Self::BatteryDrain),
            "fuel-leak" | "fuel_leak" => Ok(Self::FuelLeak),
            other => Err(format!("unknown scenario '{other}'")),
        }
    }
}

/// Random-walk state for one vehicle
#[derive(Debug, Clone)]
pub struct SimulatedVehicle {
    pub vehicle_id: String,
    speed: f64,
    fuel: f64,
    temp_offset: f64,
    battery: f64,
    scenario: Scenario,
}

impl SimulatedVehicle {
    pub fn new(vehicle_id: impl Into<String>, scenario: Scenario) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            speed: 0.0,
            fuel: 100.0,
            temp_offset: 0.0,
            battery: NOMINAL_BATTERY_V,
            scenario,
        }
    }

    /// Advance one tick and return the resulting reading.
    pub fn step<R: Rng>(&mut self, rng: &mut R, timestamp: i64) -> TelemetryReading {
        self.speed = (self.speed + rng.gen_range(-2.0..=2.0)).clamp(0.0, MAX_SPEED_KMH);
        let rpm = IDLE_RPM + RPM_PER_KMH * self.speed + rng.gen_range(-25.0..=25.0);

        let burn = match self.scenario {
            Scenario::FuelLeak => FUEL_BURN_PER_TICK * 100.0,
            _ => FUEL_BURN_PER_TICK,
        };
        self.fuel = (self.fuel - burn).max(0.0);

        match self.scenario {
            Scenario::Overheat => self.temp_offset += 0.5,
            Scenario::BatteryDrain => self.battery = (self.battery - 0.01).max(0.0),
            Scenario::Normal | Scenario::FuelLeak => {}
        }
        let temp = NOMINAL_TEMP_C + self.temp_offset + rng.gen_range(-0.2..=0.2);

        let location = GeoPoint {
            lat: SIMULATION_ORIGIN.0 + rng.gen_range(-GPS_JITTER_DEG..=GPS_JITTER_DEG),
            lng: SIMULATION_ORIGIN.1 + rng.gen_range(-GPS_JITTER_DEG..=GPS_JITTER_DEG),
        };

        TelemetryReading::new(
            self.vehicle_id.clone(),
            self.speed,
            rpm,
            self.fuel,
            temp,
            self.battery,
            location,
            timestamp,
        )
    }
}

/// A fleet of simulated vehicles sharing one RNG
pub struct FleetSimulator {
    vehicles: Vec<SimulatedVehicle>,
    rng: StdRng,
}

impl FleetSimulator {
    /// `count` vehicles named `sim-001`, `sim-002`, ...
    pub fn new(count: usize, scenario: Scenario, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let vehicles = (1..=count)
            .map(|i| SimulatedVehicle::new(format!("sim-{i:03}"), scenario))
            .collect();
        Self { vehicles, rng }
    }

    pub fn vehicle_ids(&self) -> Vec<String> {
        self.vehicles.iter().map(|v| v.vehicle_id.clone()).collect()
    }

    /// One reading per vehicle.
    pub fn tick(&mut self, timestamp: i64) -> Vec<TelemetryReading> {
        let rng = &mut self.rng;
        self.vehicles.iter_mut().map(|v| v.step(&mut *rng, timestamp)).collect()
    }

    /// Write a tick to `store` every `tick` until cancelled.
    pub async fn run(
        mut self,
        store: Arc<dyn TelemetryStore>,
        tick: Duration,
        cancel_token: CancellationToken,
    ) {
        info!(
            vehicles = self.vehicles.len(),
            tick_ms = tick.as_millis() as u64,
            "Telemetry simulator started"
        );
        let mut ticker = tokio::time::interval(tick);
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            for reading in self.tick(now_ms()) {
                if let Err(e) = store.write(reading).await {
                    warn!(error = %e, "Simulator write failed");
                }
            }
            ticks += 1;
            if ticks % 60 == 0 {
                debug!(ticks, "Simulator progress");
            }
        }
        info!(ticks, "Telemetry simulator stopped");
    }
}
