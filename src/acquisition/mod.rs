//! Telemetry acquisition
//!
//! Sources that feed readings into a `TelemetryStore`. Real vehicles post to the
//! HTTP ingest route; this module provides the simulated fleet.

pub mod simulator;

pub use simulator::{FleetSimulator, Scenario, SimulatedVehicle};
