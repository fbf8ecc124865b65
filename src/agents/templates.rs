//! Outreach strategy templates
//!
//! A strategy is picked from the lead's priority, whether its vehicle is in
//! critical health, and its pipeline stage. The template is then rendered with
//! the lead's context. Placeholders:
//!
//! | Placeholder    | Value                                                   |
//! |----------------|---------------------------------------------------------|
//! | `{name}`       | lead name                                               |
//! | `{agent}`      | assigned persona name                                   |
//! | `{dealership}` | dealership name                                         |
//! | `{memory}`     | customer-memory nudge (preferred models, lifestyle)     |
//! | `{health}`     | vehicle health summary with alert messages              |
//! | `{vehicle}`    | vehicle of interest, or a generic "next car"            |
//!
//! Drafts are customer-facing and written in Spanish.

use crate::types::{CustomerMemory, HealthState, HealthStatus, Lead, LeadStatus, Priority};

/// Lookup key for a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrategyKey {
    pub priority: Priority,
    pub critical_health: bool,
    pub status: LeadStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub name: &'static str,
    pub template: &'static str,
}

const SERVICE_FIRST: Strategy = Strategy {
    name: "service_first",
    template: "Hola {name}, soy {agent} de {dealership}. {memory}{health} \
               Podemos darte una cita prioritaria en el taller y revisar contigo las opciones \
               de reparación o de trade-in.",
};

const FAST_FIRST_CONTACT: Strategy = Strategy {
    name: "fast_first_contact",
    template: "Hola {name}, soy {agent} de {dealership}. {memory}{health} \
               Tengo disponibilidad hoy para mostrarte el {vehicle}. ¿Te reservo una cita?",
};

const FIRST_CONTACT: Strategy = Strategy {
    name: "first_contact",
    template: "Hola {name}, soy {agent} de {dealership}. {memory}{health} \
               Quisiera conversar sobre cómo podemos ayudarte y las opciones para tu {vehicle}.",
};

const HOT_FOLLOW_UP: Strategy = Strategy {
    name: "hot_follow_up",
    template: "Hola {name}, soy {agent} de {dealership}. {memory}{health} \
               Preparé una propuesta especial para el {vehicle}. ¿Cuándo podemos revisarla?",
};

const FOLLOW_UP: Strategy = Strategy {
    name: "follow_up",
    template: "Hola {name}, soy {agent} de {dealership}. {memory}{health} \
               Te comparto el catálogo actualizado por si quieres ver más opciones para tu {vehicle}.",
};

const CLOSE_NEGOTIATION: Strategy = Strategy {
    name: "close_negotiation",
    template: "Hola {name}, soy {agent} de {dealership}. {memory}{health} \
               Tengo una oferta final para cerrar tu {vehicle} hoy mismo.",
};

const AFTER_SALE: Strategy = Strategy {
    name: "after_sale",
    template: "Hola {name}, soy {agent} de {dealership}. {health} \
               Gracias por tu compra. Estamos a tu disposición para el primer mantenimiento.",
};

const WIN_BACK: Strategy = Strategy {
    name: "win_back",
    template: "Hola {name}, soy {agent} de {dealership}. {memory}\
               Tenemos nuevas unidades y opciones de financiamiento que podrían interesarte.",
};

/// Generic message used when drafting fails.
pub const FALLBACK_TEMPLATE: &str = "Hola {name}, soy {agent} de {dealership}. \
    Quisiera conversar sobre las opciones para tu próximo auto.";

/// Pick the strategy for a lead.
pub fn select_strategy(key: StrategyKey) -> Strategy {
    if key.critical_health && !key.status.is_terminal() {
        return SERVICE_FIRST;
    }
    let hot = key.priority >= Priority::High;
    match key.status {
        LeadStatus::New if hot => FAST_FIRST_CONTACT,
        LeadStatus::New => FIRST_CONTACT,
        LeadStatus::Contacted if hot => HOT_FOLLOW_UP,
        LeadStatus::Contacted => FOLLOW_UP,
        LeadStatus::Negotiation => CLOSE_NEGOTIATION,
        LeadStatus::Sold => AFTER_SALE,
        LeadStatus::Lost => WIN_BACK,
    }
}

/// Values substituted into a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    pub name: String,
    pub agent: String,
    pub dealership: String,
    pub memory: String,
    pub health: String,
    pub vehicle: String,
}

impl RenderContext {
    pub fn new(lead: &Lead, agent_name: &str, dealership: &str, health: Option<&HealthStatus>) -> Self {
        Self {
            name: lead.name.clone(),
            agent: agent_name.to_string(),
            dealership: dealership.to_string(),
            memory: lead
                .customer_memory
                .as_ref()
                .map(memory_nudge)
                .unwrap_or_default(),
            health: health.map(health_context).unwrap_or_default(),
            vehicle: lead
                .vehicle_of_interest
                .clone()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "próximo auto".to_string()),
        }
    }
}

/// Substitute placeholders and tidy whitespace.
pub fn render(template: &str, ctx: &RenderContext) -> String {
    let text = template
        .replace("{name}", &ctx.name)
        .replace("{agent}", &ctx.agent)
        .replace("{dealership}", &ctx.dealership)
        .replace("{memory}", &ctx.memory)
        .replace("{health}", &ctx.health)
        .replace("{vehicle}", &ctx.vehicle);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "I remember you liked ..." sentence from customer memory.
pub fn memory_nudge(memory: &CustomerMemory) -> String {
    let mut nudge = String::new();
    if !memory.preferences.models.is_empty() {
        nudge.push_str(&format!(
            "Recuerdo que te interesaban modelos como {}. ",
            memory.preferences.models.join(", ")
        ));
    }
    if let Some(lifestyle) = &memory.lifestyle {
        nudge.push_str(&format!("Teniendo en cuenta tu perfil de {lifestyle}, "));
    }
    nudge
}

/// Health sentence with the alert messages. Empty for a healthy vehicle.
pub fn health_context(health: &HealthStatus) -> String {
    if health.alerts.is_empty() {
        return String::new();
    }
    let state = match health.overall_status {
        HealthState::Healthy => "óptimo",
        HealthState::Warning => "advertencia",
        HealthState::Critical => "crítico",
    };
    format!(
        "Su vehículo tiene un estado {state} con alertas: {}.",
        health.alert_summary().trim_end_matches('.')
    )
}
