//! Telemetry reading types

use serde::{Deserialize, Serialize};

/// GPS position of a vehicle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// One telemetry sample for a single vehicle.
///
/// Readings are immutable and are superseded, never merged, by the next reading
/// for the same vehicle. Every sensor channel is optional on the wire: a feed that
/// drops a channel still produces a valid reading, and the classifier simply skips
/// the rules that need it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryReading {
    pub vehicle_id: String,

    // === Motion ===
    /// Ground speed (km/h)
    #[serde(default)]
    pub speed: Option<f64>,
    /// Engine speed (rev/min)
    #[serde(default)]
    pub rpm: Option<f64>,

    // === Consumables ===
    /// Fuel level (0-100 %)
    #[serde(default)]
    pub fuel_level: Option<f64>,
    /// Coolant temperature (°C)
    #[serde(default)]
    pub temp: Option<f64>,
    /// Battery voltage (V)
    #[serde(default)]
    pub battery_voltage: Option<f64>,

    #[serde(default)]
    pub location: Option<GeoPoint>,

    /// Sample time (epoch ms)
    #[serde(default)]
    pub last_update: i64,
}

impl TelemetryReading {
    /// Build a fully populated reading.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vehicle_id: impl Into<String>,
        speed: f64,
        rpm: f64,
        fuel_level: f64,
        temp: f64,
        battery_voltage: f64,
        location: GeoPoint,
        last_update: i64,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            speed: Some(speed),
            rpm: Some(rpm),
            fuel_level: Some(fuel_level),
            temp: Some(temp),
            battery_voltage: Some(battery_voltage),
            location: Some(location),
            last_update,
        }
    }

    /// Channel value if it was reported and is a finite number.
    pub(crate) fn channel(value: Option<f64>) -> Option<f64> {
        value.filter(|v| v.is_finite())
    }
}
