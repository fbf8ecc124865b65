//! Orchestrator - next-best action for a lead
//!
//! Composes scoring, agent assignment, strategy selection and draft generation
//! into one `OrchestrationAction`:
//!
//! 1. Score the lead against its vehicle's health
//! 2. Assign a persona through the configured `AgentSelector`
//! 3. Pick a strategy template from {priority, critical health, stage} and render it
//! 4. Ask the `TextGenerator` for the final message under a deadline
//!
//! ## Failure Handling
//!
//! Orchestration never fails. If the generator errors or misses the deadline the
//! action carries a generic fallback message (`MessageSource::Fallback`) and the
//! priority computed in step 1, unchanged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::personas::{self, AgentSelector, DefaultSelector};
use super::templates::{self, RenderContext, StrategyKey, FALLBACK_TEMPLATE};
use crate::config::{defaults, EngineConfig};
use crate::llm::{DraftContext, GenerationError, TextGenerator};
use crate::scoring::LeadScorer;
use crate::types::{now_ms, HealthStatus, Lead, MessageSource, OrchestrationAction};

pub struct Orchestrator {
    scorer: LeadScorer,
    selector: Arc<dyn AgentSelector>,
    generator: Arc<dyn TextGenerator>,
    dealership: String,
    generation_timeout: Duration,
    /// Actions produced so far
    actions_generated: AtomicU64,
    /// Actions that fell back to the generic message
    fallbacks: AtomicU64,
}

impl Orchestrator {
    /// Orchestrator with the default selector, dealership and deadline.
    pub fn new(scorer: LeadScorer, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            scorer,
            selector: Arc::new(DefaultSelector),
            generator,
            dealership: defaults::DEALERSHIP_NAME.to_string(),
            generation_timeout: Duration::from_millis(defaults::GENERATION_TIMEOUT_MS),
            actions_generated: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &EngineConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self::new(LeadScorer::new(config.scoring.clone()), generator)
            .with_dealership(&config.engine.dealership)
            .with_timeout(Duration::from_millis(config.orchestration.generation_timeout_ms))
    }

    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn AgentSelector>) -> Self {
        self.selector = selector;
        self
    }

    #[must_use]
    pub fn with_dealership(mut self, dealership: &str) -> Self {
        self.dealership = dealership.to_string();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn scorer(&self) -> &LeadScorer {
        &self.scorer
    }

    fn timeout_error(&self) -> GenerationError {
        GenerationError::Timeout(u64::try_from(self.generation_timeout.as_millis()).unwrap_or(u64::MAX))
    }

    /// (actions generated, fallbacks)
    pub fn stats(&self) -> (u64, u64) {
        (
            self.actions_generated.load(Ordering::Relaxed),
            self.fallbacks.load(Ordering::Relaxed),
        )
    }

    pub async fn orchestrate(&self, lead: &Lead, health: Option<&HealthStatus>) -> OrchestrationAction {
        self.orchestrate_at(lead, health, now_ms()).await
    }

    /// Orchestrate with an explicit "now" (epoch ms) for scoring.
    pub async fn orchestrate_at(
        &self,
        lead: &Lead,
        health: Option<&HealthStatus>,
        now: i64,
    ) -> OrchestrationAction {
        self.actions_generated.fetch_add(1, Ordering::Relaxed);

        let scoring = self.scorer.score_at(lead, health, now);
        let assignment = self.selector.select(lead, &scoring, health);
        let (agent_name, agent_style) = personas::persona(&assignment.agent_id)
            .map_or_else(
                || (assignment.agent_id.clone(), String::new()),
                |p| (p.name.to_string(), p.style.to_string()),
            );

        let strategy = templates::select_strategy(StrategyKey {
            priority: scoring.priority,
            critical_health: health.is_some_and(HealthStatus::is_critical),
            status: lead.status,
        });
        let render_ctx = RenderContext::new(lead, &agent_name, &self.dealership, health);
        let template_draft = templates::render(strategy.template, &render_ctx);

        let draft_ctx = DraftContext {
            lead_id: lead.id.clone(),
            lead_name: lead.name.clone(),
            agent_id: assignment.agent_id.clone(),
            agent_name: agent_name.clone(),
            agent_style,
            dealership: self.dealership.clone(),
            priority: scoring.priority,
            health: health.map(|h| h.overall_status),
            alert_summary: health.map(HealthStatus::alert_summary).unwrap_or_default(),
            suggested_action: assignment.suggested_action.clone(),
            template_draft,
        };

        let generated =
            tokio::time::timeout(self.generation_timeout, self.generator.generate(&draft_ctx)).await;
        let generated = generated.unwrap_or_else(|_| Err(self.timeout_error()));
        let (message, message_source) = match generated {
            Ok(text) => (text, MessageSource::Generated),
            Err(e) => {
                warn!(lead_id = %lead.id, backend = self.generator.backend_name(), error = %e, "Draft generation failed, using fallback");
                (self.fallback_message(&render_ctx), MessageSource::Fallback)
            }
        };
        if message_source == MessageSource::Fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
        }

        let reasoning = format!(
            "{} Strategy {} at score {:.0}{}",
            assignment.reasoning,
            strategy.name,
            scoring.score,
            if scoring.factors.is_empty() {
                String::new()
            } else {
                format!(" ({})", scoring.factors.join(", "))
            }
        );

        info!(
            lead_id = %lead.id,
            agent = %assignment.agent_id,
            priority = %scoring.priority,
            score = scoring.score,
            strategy = strategy.name,
            source = ?message_source,
            "Orchestration complete"
        );

        OrchestrationAction {
            lead_id: lead.id.clone(),
            agent_id: assignment.agent_id,
            priority: scoring.priority,
            score: scoring.score,
            suggested_action: assignment.suggested_action,
            reasoning,
            message,
            message_source,
        }
    }

    fn fallback_message(&self, ctx: &RenderContext) -> String {
        let generic = RenderContext {
            name: ctx.name.clone(),
            agent: ctx.agent.clone(),
            dealership: ctx.dealership.clone(),
            ..RenderContext::default()
        };
        templates::render(FALLBACK_TEMPLATE, &generic)
    }
}

// ============================================================================
// Tests
// ============================================================================
