//! Lead Scoring
//!
//! Deterministic, rule-based scoring of a lead's conversion likelihood and
//! response urgency. Pure: the clock is passed in, weights are injected.
//!
//! # Scoring Algorithm
//!
//! Starting from the lead's baseline intent score (`aiScore`, or the configured
//! base when absent), fixed weights are added or subtracted:
//!
//! | Factor                                   | Default |
//! |------------------------------------------|---------|
//! | Vehicle health critical                  | +35     |
//! | Vehicle health warning                   | +15     |
//! | Trade-in channel                         | +10     |
//! | Finance channel                          | +8      |
//! | Status `new`                             | +5      |
//! | Identity verified                        | +15     |
//! | Repeat engagement (>= 2 events)          | +10     |
//! | Premium model interest                   | +10     |
//! | No contact for more than 14 days         | -10     |
//!
//! The total is clamped to [0, 100]. Critical vehicle health forces
//! `Priority::Urgent`; otherwise a score at or above the high threshold (70)
//! is `High` and anything else `Normal`.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::ScoringWeights;
use crate::types::{
    now_ms, HealthState, HealthStatus, Lead, LeadChannel, LeadStatus, Priority, ScoringResult,
};

const MS_PER_DAY: i64 = 86_400_000;

/// Score a lead with the stock weights at the current time.
pub fn score(lead: &Lead, health: Option<&HealthStatus>) -> ScoringResult {
    LeadScorer::default().score(lead, health)
}

/// Lead scorer bound to a weight table.
#[derive(Debug, Clone, Default)]
pub struct LeadScorer {
    weights: ScoringWeights,
}

impl LeadScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score against the wall clock.
    pub fn score(&self, lead: &Lead, health: Option<&HealthStatus>) -> ScoringResult {
        self.score_at(lead, health, now_ms())
    }

    /// Score with an explicit "now" (epoch ms).
    pub fn score_at(&self, lead: &Lead, health: Option<&HealthStatus>, now: i64) -> ScoringResult {
        let w = &self.weights;
        let mut factors = Vec::new();

        let mut total = lead
            .ai_score
            .filter(|s| s.is_finite())
            .unwrap_or(w.base_score);

        let health_state = health.map(|h| h.overall_status);
        match health_state {
            Some(HealthState::Critical) => {
                total += w.critical_health;
                factors.push(format!("Critical vehicle health (+{})", w.critical_health));
            }
            Some(HealthState::Warning) => {
                total += w.warning_health;
                factors.push(format!("Vehicle health warning (+{})", w.warning_health));
            }
            _ => {}
        }

        match lead.channel {
            LeadChannel::TradeIn => {
                total += w.trade_in_channel;
                factors.push(format!("Trade-in lead (+{})", w.trade_in_channel));
            }
            LeadChannel::Finance => {
                total += w.finance_channel;
                factors.push(format!("Finance inquiry (+{})", w.finance_channel));
            }
            _ => {}
        }

        if lead.status == LeadStatus::New {
            total += w.new_lead;
            factors.push(format!("New lead (+{})", w.new_lead));
        }

        if lead.identity_verified {
            total += w.identity_verified;
            factors.push(format!("Verified identity (+{})", w.identity_verified));
        }

        if lead.engagement_events >= w.repeat_engagement_min_events {
            total += w.repeat_engagement;
            factors.push(format!(
                "{} engagement events (+{})",
                lead.engagement_events, w.repeat_engagement
            ));
        }

        if let Some(model) = self.premium_interest(lead) {
            total += w.premium_interest;
            factors.push(format!("Premium interest: {model} (+{})", w.premium_interest));
        }

        if let Some(days) = days_without_contact(lead, now) {
            if days > w.stale_contact_days {
                total -= w.stale_contact_penalty;
                factors.push(format!(
                    "No contact for {days} days (-{})",
                    w.stale_contact_penalty
                ));
            }
        }

        let score = total.clamp(0.0, 100.0);
        let priority = if health_state == Some(HealthState::Critical) {
            Priority::Urgent
        } else if score >= w.high_priority_threshold {
            Priority::High
        } else {
            Priority::Normal
        };

        ScoringResult {
            score,
            priority,
            factors,
        }
    }

    /// First premium keyword found in the vehicle of interest or remembered models.
    fn premium_interest(&self, lead: &Lead) -> Option<String> {
        let mut candidates: Vec<String> = Vec::new();
        if let Some(v) = &lead.vehicle_of_interest {
            candidates.push(v.to_lowercase());
        }
        if let Some(memory) = &lead.customer_memory {
            candidates.extend(memory.preferences.models.iter().map(|m| m.to_lowercase()));
        }

        self.weights
            .premium_keywords
            .iter()
            .find(|kw| {
                let kw = kw.to_lowercase();
                candidates.iter().any(|c| c.contains(&kw))
            })
            .cloned()
    }
}

/// Whole days since the last contact, or since creation for never-contacted leads.
fn days_without_contact(lead: &Lead, now: i64) -> Option<i64> {
    let since = lead.last_contacted.unwrap_or(lead.created_at);
    if since <= 0 || since > now {
        return None;
    }
    Some((now - since) / MS_PER_DAY)
}

/// A lead together with its current score, as listed on the board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredLead {
    pub lead: Lead,
    pub scoring: ScoringResult,
}

/// Score every lead and order them: priority first, then score, both descending.
///
/// `health_by_vehicle` maps a vehicle id to its latest classification; leads without
/// a linked vehicle (or whose vehicle has not reported) score without health context.
pub fn sort_by_priority(
    scorer: &LeadScorer,
    leads: Vec<Lead>,
    health_by_vehicle: &HashMap<String, HealthStatus>,
    now: i64,
) -> Vec<ScoredLead> {
    let mut scored: Vec<ScoredLead> = leads
        .into_iter()
        .map(|lead| {
            let health = lead
                .vehicle_id
                .as_ref()
                .and_then(|v| health_by_vehicle.get(v));
            let scoring = scorer.score_at(&lead, health, now);
            ScoredLead { lead, scoring }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.scoring
            .priority
            .cmp(&a.scoring.priority)
            .then_with(|| b.scoring.score.total_cmp(&a.scoring.score))
            .then_with(|| a.lead.id.cmp(&b.lead.id))
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Alert, AlertCategory, AlertType, CustomerMemory, Preferences};

    const NOW: i64 = 1_700_000_000_000;

    fn lead(base: f64) -> Lead {
        Lead {
            id: "lead-1".to_string(),
            name: "Ana".to_string(),
            status: LeadStatus::Contacted,
            ai_score: Some(base),
            ..Lead::default()
        }
    }

    fn health(state: HealthState) -> HealthStatus {
        let alerts = match state {
            HealthState::Healthy => vec![],
            HealthState::Warning => vec![alert(AlertType::Warning)],
            HealthState::Critical => vec![alert(AlertType::Critical)],
        };
        HealthStatus {
            overall_status: state,
            alerts,
            last_check: NOW,
        }
    }

    fn alert(alert_type: AlertType) -> Alert {
        Alert {
            id: "veh-1-temp-crit".to_string(),
            alert_type,
            category: AlertCategory::Engine,
            message: "Critical temperature".to_string(),
            timestamp: NOW,
        }
    }

    #[test]
    fn baseline_only() {
        let result = LeadScorer::default().score_at(&lead(40.0), None, NOW);
        assert_eq!(result.score, 40.0);
        assert_eq!(result.priority, Priority::Normal);
        assert!(result.factors.is_empty());
    }

    #[test]
    fn missing_ai_score_uses_configured_base() {
        let mut l = lead(0.0);
        l.ai_score = None;
        let result = LeadScorer::default().score_at(&l, None, NOW);
        assert_eq!(result.score, 50.0);
    }

    #[test]
    fn critical_health_forces_urgent() {
        let scorer = LeadScorer::default();
        let result = scorer.score_at(&lead(40.0), Some(&health(HealthState::Critical)), NOW);
        assert_eq!(result.score, 75.0);
        assert_eq!(result.priority, Priority::Urgent);

        // Even from a zero baseline
        let result = scorer.score_at(&lead(0.0), Some(&health(HealthState::Critical)), NOW);
        assert_eq!(result.priority, Priority::Urgent);
    }

    #[test]
    fn warning_health_adds_but_never_urgent() {
        let result =
            LeadScorer::default().score_at(&lead(90.0), Some(&health(HealthState::Warning)), NOW);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.priority, Priority::High);
    }

    #[test]
    fn healthy_vehicle_adds_nothing() {
        let with = LeadScorer::default().score_at(&lead(55.0), Some(&health(HealthState::Healthy)), NOW);
        let without = LeadScorer::default().score_at(&lead(55.0), None, NOW);
        assert_eq!(with, without);
    }

    #[test]
    fn score_is_clamped() {
        let scorer = LeadScorer::default();
        let mut hot = lead(100.0);
        hot.identity_verified = true;
        hot.engagement_events = 5;
        hot.channel = LeadChannel::TradeIn;
        let result = scorer.score_at(&hot, Some(&health(HealthState::Critical)), NOW);
        assert_eq!(result.score, 100.0);

        let mut cold = lead(-40.0);
        cold.last_contacted = Some(NOW - 30 * MS_PER_DAY);
        let result = scorer.score_at(&cold, None, NOW);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn each_positive_factor_is_monotonic() {
        let scorer = LeadScorer::default();
        let base = scorer.score_at(&lead(40.0), None, NOW).score;

        let mut verified = lead(40.0);
        verified.identity_verified = true;
        assert!(scorer.score_at(&verified, None, NOW).score > base);

        let mut engaged = lead(40.0);
        engaged.engagement_events = 2;
        assert!(scorer.score_at(&engaged, None, NOW).score > base);

        let mut single = lead(40.0);
        single.engagement_events = 1;
        assert_eq!(scorer.score_at(&single, None, NOW).score, base);

        let mut fresh = lead(40.0);
        fresh.status = LeadStatus::New;
        assert!(scorer.score_at(&fresh, None, NOW).score > base);

        let mut finance = lead(40.0);
        finance.channel = LeadChannel::Finance;
        assert!(scorer.score_at(&finance, None, NOW).score > base);
    }

    #[test]
    fn premium_interest_from_vehicle_or_memory() {
        let scorer = LeadScorer::default();

        let mut by_vehicle = lead(40.0);
        by_vehicle.vehicle_of_interest = Some("Lexus RX 350".to_string());
        let result = scorer.score_at(&by_vehicle, None, NOW);
        assert_eq!(result.score, 50.0);
        assert!(result.factors.iter().any(|f| f.contains("lexus")));

        let mut by_memory = lead(40.0);
        by_memory.customer_memory = Some(CustomerMemory {
            preferences: Preferences {
                models: vec!["Tesla Model Y".to_string()],
                ..Preferences::default()
            },
            ..CustomerMemory::default()
        });
        assert_eq!(scorer.score_at(&by_memory, None, NOW).score, 50.0);

        let mut economy = lead(40.0);
        economy.vehicle_of_interest = Some("Corolla".to_string());
        assert_eq!(scorer.score_at(&economy, None, NOW).score, 40.0);
    }

    #[test]
    fn stale_contact_is_penalised() {
        let scorer = LeadScorer::default();

        let mut stale = lead(60.0);
        stale.last_contacted = Some(NOW - 15 * MS_PER_DAY);
        assert_eq!(scorer.score_at(&stale, None, NOW).score, 50.0);

        let mut recent = lead(60.0);
        recent.last_contacted = Some(NOW - 3 * MS_PER_DAY);
        assert_eq!(scorer.score_at(&recent, None, NOW).score, 60.0);

        // Never contacted: measured from creation
        let mut forgotten = lead(60.0);
        forgotten.created_at = NOW - 20 * MS_PER_DAY;
        assert_eq!(scorer.score_at(&forgotten, None, NOW).score, 50.0);
    }

    #[test]
    fn high_priority_threshold_is_inclusive() {
        let result = LeadScorer::default().score_at(&lead(70.0), None, NOW);
        assert_eq!(result.priority, Priority::High);
        let result = LeadScorer::default().score_at(&lead(69.9), None, NOW);
        assert_eq!(result.priority, Priority::Normal);
    }

    #[test]
    fn custom_weights_are_honoured() {
        let scorer = LeadScorer::new(ScoringWeights {
            critical_health: 10.0,
            ..ScoringWeights::default()
        });
        let result = scorer.score_at(&lead(40.0), Some(&health(HealthState::Critical)), NOW);
        assert_eq!(result.score, 50.0);
        assert_eq!(result.priority, Priority::Urgent);
    }

    #[test]
    fn sort_puts_urgent_first_then_by_score() {
        let scorer = LeadScorer::default();

        let mut broken_down = lead(10.0);
        broken_down.id = "broken".to_string();
        broken_down.vehicle_id = Some("veh-1".to_string());

        let mut hot = lead(95.0);
        hot.id = "hot".to_string();

        let mut warm = lead(60.0);
        warm.id = "warm".to_string();

        let mut health_map = HashMap::new();
        health_map.insert("veh-1".to_string(), health(HealthState::Critical));

        let sorted = sort_by_priority(&scorer, vec![warm, broken_down, hot], &health_map, NOW);
        let ids: Vec<&str> = sorted.iter().map(|s| s.lead.id.as_str()).collect();
        assert_eq!(ids, vec!["broken", "hot", "warm"]);
        assert_eq!(sorted[0].scoring.priority, Priority::Urgent);
    }
}
