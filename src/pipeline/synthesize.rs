use crate::error::AppError;
use crate::llm::{GenerateRequest, LlmClient};

use super::GenerationSettings;
use super::evaluate::CriterionResult;
use super::rubric::PromptText;

pub fn build_synthesis_prompt(results: &[CriterionResult], text: &PromptText) -> String {
    let lines: Vec<String> = results
        .iter()
        .map(|r| format!("{}: {}", r.title, r.summary))
        .collect();

    format!(
        "{}\n\n{}\n\n{}",
        text.synthesis_lead,
        lines.join("\n"),
        text.synthesis_format
    )
}

/// Condenses the per-bridge summaries into the three-section narrative. The reply is
/// returned verbatim; a failed call fails the report.
#[tracing::instrument(
    name = "pipeline_stage synthesize",
    skip_all,
    fields(
        pipeline.stage = "synthesize",
        synthesis.inputs = results.len(),
        synthesis.chars,
    )
)]
pub async fn synthesize(
    llm_client: &LlmClient,
    settings: &GenerationSettings,
    text: &PromptText,
    results: &[CriterionResult],
) -> Result<String, AppError> {
    let resp = llm_client
        .generate(&GenerateRequest {
            model: settings.model.clone(),
            system: text.synthesis_system.to_string(),
            prompt: build_synthesis_prompt(results, text),
            image: None,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            stage: "synthesize".to_string(),
        })
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    tracing::Span::current().record("synthesis.chars", resp.content.chars().count());

    Ok(resp.content)
}
