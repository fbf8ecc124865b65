//! Health Classifier
//!
//! Deterministic, rule-based classification of a telemetry reading into a
//! health state plus the ordered list of alerts that justify it.
//!
//! # Rules
//!
//! Each channel is evaluated independently and every triggered alert is kept:
//!
//! | Channel  | Critical              | Warning                        | Category |
//! |----------|-----------------------|--------------------------------|----------|
//! | temp     | > 105 °C              | 95 < temp ≤ 105 °C             | engine   |
//! | battery  | < 11.5 V              | 11.5 ≤ v < 12.1 V              | battery  |
//! | fuel     | < 10 %                | 10 ≤ f < 20 %                  | fuel     |
//! | rpm      | -                     | rpm > 1200 while speed == 0    | engine   |
//!
//! A channel that was not reported (or is not a finite number) contributes no
//! alert. The overall state is the maximum alert severity.
//!
//! Timestamps are taken from the reading, never from the clock, so classifying
//! the same reading twice yields the same `HealthStatus`.

use crate::config::HealthThresholds;
use crate::types::{
    Alert, AlertCategory, AlertType, HealthState, HealthStatus, TelemetryReading,
};

/// Classify a reading with the stock thresholds.
pub fn classify(reading: &TelemetryReading) -> HealthStatus {
    classify_with(reading, &HealthThresholds::default())
}

/// Classify a reading with explicit thresholds.
pub fn classify_with(reading: &TelemetryReading, t: &HealthThresholds) -> HealthStatus {
    let mut alerts = Vec::new();

    if let Some(temp) = TelemetryReading::channel(reading.temp) {
        if temp > t.temp_critical_c {
            alerts.push(alert(
                reading,
                "temp",
                AlertType::Critical,
                AlertCategory::Engine,
                format!("Critical temperature: {temp:.1}°C. Stop the vehicle immediately."),
            ));
        } else if temp > t.temp_warning_c {
            alerts.push(alert(
                reading,
                "temp",
                AlertType::Warning,
                AlertCategory::Engine,
                format!("Elevated temperature: {temp:.1}°C. Check the cooling system."),
            ));
        }
    }

    if let Some(volts) = TelemetryReading::channel(reading.battery_voltage) {
        if volts < t.battery_critical_v {
            alerts.push(alert(
                reading,
                "batt",
                AlertType::Critical,
                AlertCategory::Battery,
                format!("Critical battery voltage: {volts:.1}V. Risk of starting failure."),
            ));
        } else if volts < t.battery_warning_v {
            alerts.push(alert(
                reading,
                "batt",
                AlertType::Warning,
                AlertCategory::Battery,
                format!("Low battery: {volts:.1}V. Inspection recommended."),
            ));
        }
    }

    if let Some(fuel) = TelemetryReading::channel(reading.fuel_level) {
        if fuel < t.fuel_critical_percent {
            alerts.push(alert(
                reading,
                "fuel",
                AlertType::Critical,
                AlertCategory::Fuel,
                format!("Critical fuel level: {fuel:.0}%. Refuel immediately."),
            ));
        } else if fuel < t.fuel_warning_percent {
            alerts.push(alert(
                reading,
                "fuel",
                AlertType::Warning,
                AlertCategory::Fuel,
                format!("Low fuel level: {fuel:.0}%."),
            ));
        }
    }

    if let (Some(rpm), Some(speed)) = (
        TelemetryReading::channel(reading.rpm),
        TelemetryReading::channel(reading.speed),
    ) {
        if rpm > t.idle_rpm_max && speed == 0.0 {
            alerts.push(alert(
                reading,
                "rpm",
                AlertType::Warning,
                AlertCategory::Engine,
                format!("Unstable idle detected ({rpm:.0} RPM while stationary)."),
            ));
        }
    }

    let overall_status = alerts
        .iter()
        .map(|a| a.alert_type.as_state())
        .max()
        .unwrap_or(HealthState::Healthy);

    HealthStatus {
        overall_status,
        alerts,
        last_check: reading.last_update,
    }
}

fn alert(
    reading: &TelemetryReading,
    channel: &str,
    alert_type: AlertType,
    category: AlertCategory,
    message: String,
) -> Alert {
    let severity = match alert_type {
        AlertType::Critical => "crit",
        AlertType::Warning => "warn",
    };
    Alert {
        id: format!("{}-{channel}-{severity}", reading.vehicle_id),
        alert_type,
        category,
        message,
        timestamp: reading.last_update,
    }
}
