//! Health classification types: HealthState, Alert, HealthStatus

use serde::{Deserialize, Serialize};

/// Overall health of a vehicle. Ordering is total: `Critical > Warning > Healthy`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    #[default]
    Healthy,
    Warning,
    Critical,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthState::Healthy => write!(f, "healthy"),
            HealthState::Warning => write!(f, "warning"),
            HealthState::Critical => write!(f, "critical"),
        }
    }
}

/// Severity of a single alert
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Warning,
    Critical,
}

impl AlertType {
    /// The overall state an alert of this severity forces.
    pub fn as_state(self) -> HealthState {
        match self {
            AlertType::Warning => HealthState::Warning,
            AlertType::Critical => HealthState::Critical,
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::Warning => write!(f, "warning"),
            AlertType::Critical => write!(f, "critical"),
        }
    }
}

/// Vehicle subsystem an alert refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Engine,
    Battery,
    Fuel,
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCategory::Engine => write!(f, "engine"),
            AlertCategory::Battery => write!(f, "battery"),
            AlertCategory::Fuel => write!(f, "fuel"),
        }
    }
}

/// A single detected abnormal condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// `<vehicle>-<category>-<severity>`, stable while the condition persists
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub category: AlertCategory,
    pub message: String,
    /// Epoch ms of the reading that raised it
    pub timestamp: i64,
}

impl Alert {
    pub fn is_critical(&self) -> bool {
        self.alert_type == AlertType::Critical
    }
}

/// Derived health of one telemetry reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub overall_status: HealthState,
    pub alerts: Vec<Alert>,
    /// Epoch ms of the classified reading
    pub last_check: i64,
}

impl HealthStatus {
    pub fn is_critical(&self) -> bool {
        self.overall_status == HealthState::Critical
    }

    /// Critical alerts in classification order.
    pub fn critical_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.is_critical())
    }

    /// Alert messages joined for display and prompt context.
    pub fn alert_summary(&self) -> String {
        self.alerts
            .iter()
            .map(|a| a.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_is_total() {
        assert!(HealthState::Critical > HealthState::Warning);
        assert!(HealthState::Warning > HealthState::Healthy);
        assert_eq!(
            [HealthState::Warning, HealthState::Critical, HealthState::Healthy]
                .into_iter()
                .max(),
            Some(HealthState::Critical)
        );
    }

    #[test]
    fn alert_serializes_type_field() {
        let alert = Alert {
            id: "veh-1-fuel-warning".to_string(),
            alert_type: AlertType::Warning,
            category: AlertCategory::Fuel,
            message: "Low fuel".to_string(),
            timestamp: 1,
        };
        let v = serde_json::to_value(&alert).unwrap();
        assert_eq!(v["type"], "warning");
        assert_eq!(v["category"], "fuel");
    }
}
