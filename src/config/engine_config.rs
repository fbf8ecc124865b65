//! Engine Configuration - health thresholds, scoring weights and runtime tuning
//!
//! Every number the engine decides on is a field in this module. Each struct
//! implements `Default` with the reference values, so a missing config file
//! yields the stock behavior.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one engine deployment.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$LEAD_ENGINE_CONFIG` env var
/// 2. `./engine_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Dealership / tenant identification
    #[serde(default)]
    pub engine: EngineInfo,

    /// Telemetry health classification thresholds
    #[serde(default)]
    pub thresholds: HealthThresholds,

    /// Lead scoring weight table
    #[serde(default)]
    pub scoring: ScoringWeights,

    /// Next-best-action generation
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    /// Polling intervals
    #[serde(default)]
    pub sync: SyncConfig,

    /// Critical alert delivery
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$LEAD_ENGINE_CONFIG` environment variable
    /// 2. `./engine_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("LEAD_ENGINE_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), dealership = %config.engine.dealership, "Loaded engine config from LEAD_ENGINE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from LEAD_ENGINE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "LEAD_ENGINE_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("engine_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(dealership = %config.engine.dealership, "Loaded engine config from ./engine_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./engine_config.toml, using defaults");
                }
            }
        }

        info!("No engine_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the active configuration back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate the configuration.
    ///
    /// - Critical thresholds must be at least as severe as warning thresholds
    /// - Scoring weights must be finite and non-negative
    /// - Intervals and timeouts must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let mut errors: Vec<String> = Vec::new();

        // Rising hazards: critical >= warning
        Self::check_escalation(t.temp_warning_c, t.temp_critical_c, "thresholds.temp", &mut errors);

        // Falling hazards: critical <= warning
        Self::check_escalation(
            -t.battery_warning_v,
            -t.battery_critical_v,
            "thresholds.battery (inverted)",
            &mut errors,
        );
        Self::check_escalation(
            -t.fuel_warning_percent,
            -t.fuel_critical_percent,
            "thresholds.fuel (inverted)",
            &mut errors,
        );
        if !(0.0..=100.0).contains(&t.fuel_warning_percent) {
            errors.push(format!(
                "thresholds.fuel_warning_percent = {:.1} is outside 0-100",
                t.fuel_warning_percent
            ));
        }
        if !t.idle_rpm_max.is_finite() || t.idle_rpm_max <= 0.0 {
            errors.push("thresholds.idle_rpm_max must be a positive number".to_string());
        }

        let s = &self.scoring;
        for (name, value) in s.named_weights() {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("scoring.{name} must be finite and >= 0 (got {value})"));
            }
        }
        if !(0.0..=100.0).contains(&s.base_score) {
            errors.push(format!("scoring.base_score = {:.1} is outside 0-100", s.base_score));
        }
        if !(0.0..=100.0).contains(&s.high_priority_threshold) {
            errors.push(format!(
                "scoring.high_priority_threshold = {:.1} is outside 0-100",
                s.high_priority_threshold
            ));
        }
        if s.stale_contact_days <= 0 {
            errors.push("scoring.stale_contact_days must be > 0".to_string());
        }

        if self.orchestration.generation_timeout_ms == 0 {
            errors.push("orchestration.generation_timeout_ms must be > 0".to_string());
        }
        if self.sync.lead_poll_interval_ms == 0 {
            errors.push("sync.lead_poll_interval_ms must be > 0".to_string());
        }
        if self.sync.telemetry_poll_interval_ms == 0 {
            errors.push("sync.telemetry_poll_interval_ms must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_escalation(warning: f64, critical: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass; catch them explicitly
        if !warning.is_finite() || !critical.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got warning={warning}, critical={critical})"
            ));
            return;
        }
        if critical < warning {
            errors.push(format!(
                "{name}: critical ({critical:.3}) must be at least as severe as warning ({warning:.3})"
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Engine Info
// ============================================================================

/// Identification metadata; appears in logs and outreach drafts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    #[serde(default = "default_dealership")]
    pub dealership: String,

    /// Tenant whose leads this instance serves
    #[serde(default = "default_tenant")]
    pub tenant_id: String,
}

fn default_dealership() -> String {
    defaults::DEALERSHIP_NAME.to_string()
}
fn default_tenant() -> String {
    "default".to_string()
}

impl Default for EngineInfo {
    fn default() -> Self {
        Self {
            dealership: default_dealership(),
            tenant_id: default_tenant(),
        }
    }
}

// ============================================================================
// Health Thresholds
// ============================================================================

/// Telemetry limits used by the health classifier.
///
/// Rising hazards (temperature) alert above the limit; falling hazards (battery,
/// fuel) alert below it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthThresholds {
    pub temp_warning_c: f64,
    pub temp_critical_c: f64,
    pub battery_warning_v: f64,
    pub battery_critical_v: f64,
    pub fuel_warning_percent: f64,
    pub fuel_critical_percent: f64,
    /// RPM above which a stationary vehicle is flagged as unstable idle
    pub idle_rpm_max: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            temp_warning_c: defaults::TEMP_WARNING_C,
            temp_critical_c: defaults::TEMP_CRITICAL_C,
            battery_warning_v: defaults::BATTERY_WARNING_V,
            battery_critical_v: defaults::BATTERY_CRITICAL_V,
            fuel_warning_percent: defaults::FUEL_WARNING_PERCENT,
            fuel_critical_percent: defaults::FUEL_CRITICAL_PERCENT,
            idle_rpm_max: defaults::IDLE_RPM_MAX,
        }
    }
}

// ============================================================================
// Scoring Weights
// ============================================================================

/// Weight table for lead scoring. All weights are magnitudes; the scorer
/// decides the sign (the stale-contact weight is subtracted).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    /// Starting score when the lead carries no upstream intent score
    pub base_score: f64,
    pub critical_health: f64,
    pub warning_health: f64,
    pub trade_in_channel: f64,
    pub finance_channel: f64,
    pub new_lead: f64,
    pub identity_verified: f64,
    pub repeat_engagement: f64,
    /// Engagement events needed for the repeat-engagement bonus
    pub repeat_engagement_min_events: u32,
    pub premium_interest: f64,
    /// Case-insensitive substrings that mark a model of interest as premium
    pub premium_keywords: Vec<String>,
    pub stale_contact_penalty: f64,
    pub stale_contact_days: i64,
    pub high_priority_threshold: f64,
}

impl ScoringWeights {
    fn named_weights(&self) -> [(&'static str, f64); 9] {
        [
            ("critical_health", self.critical_health),
            ("warning_health", self.warning_health),
            ("trade_in_channel", self.trade_in_channel),
            ("finance_channel", self.finance_channel),
            ("new_lead", self.new_lead),
            ("identity_verified", self.identity_verified),
            ("repeat_engagement", self.repeat_engagement),
            ("premium_interest", self.premium_interest),
            ("stale_contact_penalty", self.stale_contact_penalty),
        ]
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base_score: defaults::DEFAULT_BASE_SCORE,
            critical_health: 35.0,
            warning_health: 15.0,
            trade_in_channel: 10.0,
            finance_channel: 8.0,
            new_lead: 5.0,
            identity_verified: 15.0,
            repeat_engagement: 10.0,
            repeat_engagement_min_events: 2,
            premium_interest: 10.0,
            premium_keywords: [
                "lexus", "bmw", "mercedes", "audi", "porsche", "tesla", "land rover", "range rover",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            stale_contact_penalty: 10.0,
            stale_contact_days: defaults::STALE_CONTACT_DAYS,
            high_priority_threshold: defaults::HIGH_PRIORITY_SCORE,
        }
    }
}

// ============================================================================
// Orchestration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Upper bound on one text-generation call
    pub generation_timeout_ms: u64,
    /// Remote text-generation endpoint; template drafts are used when unset
    pub generation_endpoint: Option<String>,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            generation_timeout_ms: defaults::GENERATION_TIMEOUT_MS,
            generation_endpoint: None,
        }
    }
}

// ============================================================================
// Sync
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub lead_poll_interval_ms: u64,
    pub telemetry_poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lead_poll_interval_ms: defaults::LEAD_POLL_INTERVAL_MS,
            telemetry_poll_interval_ms: defaults::TELEMETRY_POLL_INTERVAL_MS,
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// POST target for critical alerts; log-only delivery when unset
    pub webhook_url: Option<String>,
    pub webhook_timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_timeout_secs: defaults::WEBHOOK_TIMEOUT_SECS,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
