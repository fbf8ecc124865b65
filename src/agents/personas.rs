//! Agent personas and assignment
//!
//! ## Default Roster
//!
//! 1. **ricardo** - sales consultant (default)
//! 2. **sofia** - finance specialist: credit, payments, trade-in appraisal
//! 3. **jordan** - executive closer for very hot leads
//! 4. **mateo** - service technician, takes over when the vehicle is failing
//!
//! ## Assignment Rules (`DefaultSelector`)
//!
//! - Critical vehicle health overrides everything: technician first
//! - Trade-in lead scoring above 70: finance
//! - Any lead scoring above 90: closer
//! - Otherwise: sales

use regex::Regex;
use std::sync::OnceLock;

use crate::types::{HealthStatus, Lead, LeadChannel, ScoringResult};

/// Score above which a trade-in lead is handed to finance.
pub const FINANCE_HANDOFF_SCORE: f64 = 70.0;

/// Score above which any lead goes to the closer.
pub const CLOSER_SCORE: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentPersona {
    pub id: &'static str,
    pub name: &'static str,
    pub role: &'static str,
    /// Tone guidance passed to text generators
    pub style: &'static str,
}

pub const SALES: AgentPersona = AgentPersona {
    id: "ricardo",
    name: "Ricardo",
    role: "Sales Consultant",
    style: "Enthusiastic, persuasive car expert. Focus on features, design and lifestyle.",
};

pub const FINANCE: AgentPersona = AgentPersona {
    id: "sofia",
    name: "Sofia",
    role: "Finance Specialist",
    style: "Professional, precise and empathetic. Explain payment, credit and trade-in options clearly.",
};

pub const CLOSER: AgentPersona = AgentPersona {
    id: "jordan",
    name: "Jordan",
    role: "Executive Closer",
    style: "Direct and confident. Qualify quickly and move to an appointment or a close.",
};

pub const TECHNICIAN: AgentPersona = AgentPersona {
    id: "mateo",
    name: "Mateo",
    role: "Service Technician",
    style: "Calm and explanatory. Explain technical issues simply and suggest preventive service.",
};

/// All built-in personas
pub static ROSTER: [AgentPersona; 4] = [SALES, FINANCE, CLOSER, TECHNICIAN];

/// Look up a built-in persona by id.
pub fn persona(id: &str) -> Option<&'static AgentPersona> {
    ROSTER.iter().find(|p| p.id == id)
}

/// Who handles a lead and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub agent_id: String,
    pub reasoning: String,
    pub suggested_action: String,
}

impl Assignment {
    fn new(agent: &AgentPersona, reasoning: &str, suggested_action: &str) -> Self {
        Self {
            agent_id: agent.id.to_string(),
            reasoning: reasoning.to_string(),
            suggested_action: suggested_action.to_string(),
        }
    }
}

/// Pluggable agent assignment policy
pub trait AgentSelector: Send + Sync {
    /// Selector name for logging
    fn name(&self) -> &str;

    fn select(
        &self,
        lead: &Lead,
        scoring: &ScoringResult,
        health: Option<&HealthStatus>,
    ) -> Assignment;
}

/// Rule-based selector over the default roster
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSelector;

impl AgentSelector for DefaultSelector {
    fn name(&self) -> &str {
        "default"
    }

    fn select(
        &self,
        lead: &Lead,
        scoring: &ScoringResult,
        health: Option<&HealthStatus>,
    ) -> Assignment {
        if health.is_some_and(HealthStatus::is_critical) {
            Assignment::new(
                &TECHNICIAN,
                "Vehicle reports a critical fault. Technical intervention is needed before any sale.",
                "Offer a priority service appointment and a repair or trade-in discount.",
            )
        } else if lead.channel == LeadChannel::TradeIn && scoring.score > FINANCE_HANDOFF_SCORE {
            Assignment::new(
                &FINANCE,
                "High-intent lead interested in a trade-in. Lead with financing.",
                "Present pre-qualification and a trade-in offer.",
            )
        } else if scoring.score > CLOSER_SCORE {
            Assignment::new(
                &CLOSER,
                "Very hot lead. Needs an immediate close.",
                "Closing call with a same-day reservation bonus.",
            )
        } else {
            Assignment::new(
                &SALES,
                "Standard sales follow-up.",
                "Send the updated catalogue.",
            )
        }
    }
}

// ============================================================================
// Intent routing for inbound messages
// ============================================================================

struct IntentRule {
    agent: &'static AgentPersona,
    pattern: &'static str,
}

static INTENT_RULES: [IntentRule; 3] = [
    IntentRule {
        agent: &CLOSER,
        pattern: r"(trato|descuento|cuanto es lo menos|cash|efectivo|compro ya|jefe|gerente|oferta final|decision)",
    },
    IntentRule {
        agent: &FINANCE,
        pattern: r"(precio|mensualidad|pago|credito|banco|interes|financiamiento|dinero|cuota|trade-in|valor|costo)",
    },
    IntentRule {
        agent: &TECHNICIAN,
        pattern: r"(motor|taller|servicio|mantenimiento|aceite|frenos|llantas|bateria|ruido|falla|garantia)",
    },
];

fn intent_patterns() -> &'static [(Regex, &'static AgentPersona)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static AgentPersona)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        INTENT_RULES
            .iter()
            .filter_map(|rule| {
                Regex::new(&format!("(?i){}", rule.pattern))
                    .ok()
                    .map(|re| (re, rule.agent))
            })
            .collect()
    })
}

/// Route an inbound customer message to the persona best placed to answer it.
///
/// Closing language wins over finance, finance over service; anything else goes
/// to sales.
pub fn detect_intent(message: &str) -> &'static AgentPersona {
    intent_patterns()
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map_or(&SALES, |(_, agent)| *agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HealthState, Priority};

    fn scoring(score: f64) -> ScoringResult {
        ScoringResult {
            score,
            priority: Priority::Normal,
            factors: vec![],
        }
    }

    fn health(state: HealthState) -> HealthStatus {
        HealthStatus {
            overall_status: state,
            alerts: vec![],
            last_check: 0,
        }
    }

    fn lead(channel: LeadChannel) -> Lead {
        Lead {
            id: "l1".to_string(),
            name: "Ana".to_string(),
            channel,
            ..Lead::default()
        }
    }

    #[test]
    fn critical_health_goes_to_technician() {
        let a = DefaultSelector.select(
            &lead(LeadChannel::TradeIn),
            &scoring(99.0),
            Some(&health(HealthState::Critical)),
        );
        assert_eq!(a.agent_id, "mateo");
    }

    #[test]
    fn hot_trade_in_goes_to_finance() {
        let a = DefaultSelector.select(&lead(LeadChannel::TradeIn), &scoring(75.0), None);
        assert_eq!(a.agent_id, "sofia");

        let a = DefaultSelector.select(&lead(LeadChannel::TradeIn), &scoring(70.0), None);
        assert_eq!(a.agent_id, "ricardo");
    }

    #[test]
    fn very_hot_lead_goes_to_closer() {
        let a = DefaultSelector.select(
            &lead(LeadChannel::Whatsapp),
            &scoring(95.0),
            Some(&health(HealthState::Warning)),
        );
        assert_eq!(a.agent_id, "jordan");
    }

    #[test]
    fn default_is_sales() {
        let a = DefaultSelector.select(&lead(LeadChannel::Form), &scoring(50.0), None);
        assert_eq!(a.agent_id, "ricardo");
        assert!(persona(&a.agent_id).is_some());
    }

    #[test]
    fn intent_routing() {
        assert_eq!(detect_intent("¿Cuál es la mensualidad?").id, "sofia");
        assert_eq!(detect_intent("Quiero un DESCUENTO y pago cash").id, "jordan");
        assert_eq!(detect_intent("Hace un ruido raro el motor").id, "mateo");
        assert_eq!(detect_intent("Me gusta el color rojo").id, "ricardo");
    }
}
