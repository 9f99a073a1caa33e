pub mod evaluate;
pub mod orchestrator;
pub mod rubric;
pub mod synthesize;

pub use evaluate::{CriterionReply, CriterionResult, EvaluationContext, parse_criterion_reply};
pub use orchestrator::{AuditRequest, Report, average_score, generate_report};
pub use rubric::{Criterion, Locale, Rubric};

use crate::config::Config;

/// Model parameters shared by every call of one audit.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm_model.clone(),
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
        }
    }
}
