//! System-wide default constants.
//!
//! Centralises magic numbers shared by the config defaults, the binary and the
//! simulator. Grouped by subsystem for easy discovery.

// ============================================================================
// Health classification
// ============================================================================

/// Coolant temperature above which an engine alert is critical (°C).
pub const TEMP_CRITICAL_C: f64 = 105.0;

/// Coolant temperature above which an engine alert is raised (°C).
pub const TEMP_WARNING_C: f64 = 95.0;

/// Battery voltage below which the battery alert is critical (V).
pub const BATTERY_CRITICAL_V: f64 = 11.5;

/// Battery voltage below which a battery alert is raised (V).
pub const BATTERY_WARNING_V: f64 = 12.1;

/// Fuel level below which the fuel alert is critical (%).
pub const FUEL_CRITICAL_PERCENT: f64 = 10.0;

/// Fuel level below which a fuel alert is raised (%).
pub const FUEL_WARNING_PERCENT: f64 = 20.0;

/// Engine speed above which a stationary vehicle counts as unstable idle (rev/min).
pub const IDLE_RPM_MAX: f64 = 1200.0;

// ============================================================================
// Lead scoring
// ============================================================================

/// Baseline score for leads without an upstream intent score.
pub const DEFAULT_BASE_SCORE: f64 = 50.0;

/// Score at or above which a lead is high priority.
pub const HIGH_PRIORITY_SCORE: f64 = 70.0;

/// Days without contact after which the stale-contact penalty applies.
pub const STALE_CONTACT_DAYS: i64 = 14;

// ============================================================================
// Orchestration
// ============================================================================

/// Upper bound on a single text-generation call (ms).
pub const GENERATION_TIMEOUT_MS: u64 = 8_000;

/// Dealership name used in outreach drafts.
pub const DEALERSHIP_NAME: &str = "Richard Automotive";

// ============================================================================
// Sync
// ============================================================================

/// Lead collection poll interval (ms).
pub const LEAD_POLL_INTERVAL_MS: u64 = 5_000;

/// Telemetry poll interval when the store offers no push stream (ms).
pub const TELEMETRY_POLL_INTERVAL_MS: u64 = 2_000;

/// Capacity of the in-process telemetry change stream.
pub const TELEMETRY_CHANNEL_CAPACITY: usize = 1_024;

// ============================================================================
// Notifications
// ============================================================================

/// HTTP timeout for webhook notification delivery (seconds).
pub const WEBHOOK_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Simulation
// ============================================================================

/// Interval between simulated telemetry samples (ms).
pub const SIMULATION_TICK_MS: u64 = 1_000;

/// Starting coordinates for simulated vehicles (dealership HQ).
pub const SIMULATION_ORIGIN: (f64, f64) = (18.4861, -69.9312);
