use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::error::AppError;
use crate::llm::{ImageAttachment, LlmClient};
use crate::telemetry::metrics::{
    AUDIT_AVERAGE_SCORE, AUDIT_CRITERIA_DROPPED, AUDIT_CRITERIA_SCORED, AUDIT_DURATION,
};

use super::GenerationSettings;
use super::evaluate::{CriterionResult, EvaluationContext, evaluate_criterion};
use super::rubric::Rubric;
use super::synthesize::synthesize;

#[derive(Debug, Clone)]
pub struct AuditRequest {
    pub image: ImageAttachment,
    pub context: EvaluationContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub bridges: Vec<CriterionResult>,
    pub average: f64,
    pub synthesis: String,
}

/// Mean of the scores rounded to one decimal, or `None` when nothing was scored.
pub fn average_score(scores: &[u8]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: u32 = scores.iter().map(|&s| u32::from(s)).sum();
    let mean = f64::from(sum) / scores.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[tracing::instrument(
    name = "pipeline audit",
    skip_all,
    fields(
        audit.criteria = rubric.criteria.len(),
        audit.media_type = %request.image.media_type,
        audit.scored,
        audit.average,
        audit.duration_ms,
    )
)]
pub async fn generate_report(
    llm_client: &LlmClient,
    rubric: &Rubric,
    settings: &GenerationSettings,
    request: AuditRequest,
) -> Result<Report, AppError> {
    let start = std::time::Instant::now();
    let text = rubric.text();
    let image = Arc::new(request.image);

    // Stage 1: score every bridge; independent calls, results kept in rubric order
    let evaluations = rubric.criteria.iter().map(|criterion| {
        evaluate_criterion(
            llm_client,
            settings,
            text,
            criterion,
            &request.context,
            Arc::clone(&image),
        )
    });
    let bridges: Vec<CriterionResult> = join_all(evaluations).await.into_iter().flatten().collect();

    let dropped = rubric.criteria.len() - bridges.len();
    if dropped > 0 {
        AUDIT_CRITERIA_DROPPED.add(dropped as u64, &[]);
    }

    // Stage 2: aggregate
    let scores: Vec<u8> = bridges.iter().map(|b| b.score).collect();
    let Some(average) = average_score(&scores) else {
        return Err(AppError::NoScores(text.no_scores.to_string()));
    };

    // Stage 3: narrative over the surviving bridges
    let synthesis = synthesize(llm_client, settings, text, &bridges).await?;

    let duration = start.elapsed();
    AUDIT_DURATION.record(duration.as_secs_f64(), &[]);
    AUDIT_CRITERIA_SCORED.record(bridges.len() as f64, &[]);
    AUDIT_AVERAGE_SCORE.record(average, &[]);

    let span = tracing::Span::current();
    span.record("audit.scored", bridges.len());
    span.record("audit.average", average);
    span.record("audit.duration_ms", duration.as_millis() as u64);

    tracing::info!(
        scored = bridges.len(),
        dropped,
        average,
        "Audit report generated"
    );

    Ok(Report {
        bridges,
        average,
        synthesis,
    })
}
