//! Agents: who follows up with a lead, with what message
//!
//! - **Orchestrator**: next-best action per lead (score, persona, strategy, draft)
//! - **Personas**: default roster and the pluggable `AgentSelector`
//! - **Templates**: outreach strategies keyed by priority, health and stage
//! - **Memory**: customer preference extraction from inbound messages

pub mod memory;
pub mod orchestrator;
pub mod personas;
pub mod templates;

pub use memory::extract_preferences;
pub use orchestrator::Orchestrator;
pub use personas::{detect_intent, AgentPersona, AgentSelector, Assignment, DefaultSelector};
