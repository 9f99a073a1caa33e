use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::llm::{GenerateRequest, ImageAttachment, LlmClient};

use super::GenerationSettings;
use super::rubric::{Criterion, PromptText};

/// Operator-supplied conditions the screen is judged under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationContext {
    pub system_type: String,
    pub criticality_level: String,
    pub user_profile: String,
    pub operating_environment: String,
}

impl EvaluationContext {
    pub fn render(&self, text: &PromptText) -> String {
        format!(
            "{}\n- {}: {}\n- {}: {}\n- {}: {}\n- {}: {}",
            text.context_heading,
            text.system_type_label,
            self.system_type,
            text.criticality_label,
            self.criticality_level,
            text.user_profile_label,
            self.user_profile,
            text.environment_label,
            self.operating_environment,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionResult {
    pub title: String,
    pub score: u8,
    pub summary: String,
}

/// What could be read out of one free-text evaluation reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CriterionReply {
    pub score: Option<u8>,
    pub summary: String,
}

// Integer part before "/10", not preceded by another digit. Decimals are dropped.
static SCORE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{1,2})(?:\.[0-9]+)?\s*/\s*10").expect("valid score pattern")
});

const SUMMARY_MARKERS: [&str; 2] = ["SUMMARY", "RESUMEN"];

pub fn parse_criterion_reply(text: &str) -> CriterionReply {
    let score = SCORE_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok());

    let mut summary = String::new();
    for line in text.lines() {
        let upper = line.to_uppercase();
        if !SUMMARY_MARKERS.iter().any(|marker| upper.contains(marker)) {
            continue;
        }
        if let Some((_, rest)) = line.split_once(':') {
            summary = rest.trim().to_string();
        }
    }

    CriterionReply { score, summary }
}

pub fn build_evaluation_prompt(
    criterion: &Criterion,
    context: &EvaluationContext,
    text: &PromptText,
) -> String {
    format!(
        "{} {}.\n\n{}\n\n{}\n\n{}\n\n{}",
        text.evaluate_lead,
        criterion.title,
        criterion.description,
        context.render(text),
        text.instructions,
        text.reply_format,
    )
}

/// Scores one criterion. Transport failures and unparseable replies both yield `None`.
#[tracing::instrument(
    name = "pipeline_stage evaluate",
    skip(llm_client, settings, text, context, image),
    fields(
        pipeline.stage = "evaluate",
        criterion.title = %criterion.title,
        criterion.score,
    )
)]
pub async fn evaluate_criterion(
    llm_client: &LlmClient,
    settings: &GenerationSettings,
    text: &PromptText,
    criterion: &Criterion,
    context: &EvaluationContext,
    image: Arc<ImageAttachment>,
) -> Option<CriterionResult> {
    let resp = llm_client
        .generate(&GenerateRequest {
            model: settings.model.clone(),
            system: text.auditor_system.to_string(),
            prompt: build_evaluation_prompt(criterion, context, text),
            image: Some(image),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            stage: "evaluate".to_string(),
        })
        .await;

    let content = match resp {
        Ok(resp) => resp.content,
        Err(err) => {
            tracing::warn!(
                criterion = %criterion.title,
                error = %err,
                "Evaluation call failed, criterion dropped"
            );
            return None;
        }
    };

    let reply = parse_criterion_reply(&content);
    let Some(score) = reply.score else {
        tracing::warn!(
            criterion = %criterion.title,
            reply = %content.chars().take(200).collect::<String>(),
            "No score found in reply, criterion dropped"
        );
        return None;
    };

    tracing::Span::current().record("criterion.score", score);

    Some(CriterionResult {
        title: criterion.title.clone(),
        score,
        summary: reply.summary,
    })
}
