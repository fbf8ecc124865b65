//! Customer memory extraction
//!
//! Keyword heuristics that update a lead's `CustomerMemory` from an inbound
//! message: models mentioned, preferred colours, lifestyle profile and a short
//! summary of the last interaction. Never removes anything already remembered.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::{CustomerMemory, Lead};

/// Models recognised in free text (lowercase)
pub const MODEL_KEYWORDS: [&str; 7] = ["tucson", "tacoma", "civic", "corolla", "rav4", "f150", "mustang"];

/// Spanish colour words and the name stored in preferences
const COLOR_KEYWORDS: [(&str, &str); 6] = [
    ("rojo", "red"),
    ("negro", "black"),
    ("blanco", "white"),
    ("azul", "blue"),
    ("gris", "grey"),
    ("plata", "silver"),
];

/// Lifestyle rules, first match wins
const LIFESTYLE_RULES: [(&str, &str); 3] = [
    (r"\b(familia|hijos)\b", "Family-oriented"),
    (r"\b(trabajo|carga)\b", "Professional/Work"),
    (r"(\bmonte\b|\b4x4\b)", "Off-road enthusiast"),
];

/// Characters of the message kept in the interaction summary
const SUMMARY_CHARS: usize = 50;

fn lifestyle_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        LIFESTYLE_RULES
            .iter()
            .filter_map(|(pattern, label)| {
                Regex::new(&format!("(?i){pattern}"))
                    .ok()
                    .map(|re| (re, *label))
            })
            .collect()
    })
}

/// Merge what `message` reveals into the lead's memory and return the result.
pub fn extract_preferences(lead: &Lead, message: &str) -> CustomerMemory {
    let mut memory = lead.customer_memory.clone().unwrap_or_default();
    let lower = message.to_lowercase();

    for model in MODEL_KEYWORDS {
        if lower.contains(model) && !memory.preferences.models.iter().any(|m| m == model) {
            memory.preferences.models.push(model.to_string());
        }
    }

    for (word, color) in COLOR_KEYWORDS {
        if lower.contains(word) && !memory.preferences.colors.iter().any(|c| c == color) {
            memory.preferences.colors.push(color.to_string());
        }
    }

    if let Some((_, label)) = lifestyle_patterns().iter().find(|(re, _)| re.is_match(&lower)) {
        memory.lifestyle = Some((*label).to_string());
    }

    let excerpt: String = message.chars().take(SUMMARY_CHARS).collect();
    let ellipsis = if message.chars().count() > SUMMARY_CHARS { "..." } else { "" };
    memory.last_interaction_summary =
        Some(format!("Interest detected in message: \"{excerpt}{ellipsis}\""));

    memory
}
