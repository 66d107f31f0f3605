//! Typed wrappers over the raw model contracts.
//!
//! Each wrapper drives one model call through the retry policy, then
//! strips markdown fencing, applies structured-output recovery, and
//! shapes the result leniently. Malformed model output therefore never
//! propagates as an error; the documented fallback shapes apply instead.

use crate::core::{
    BudgetEvaluation, CritiqueReport, Decision, DecisionOutcome, DimensionCritique,
    ScoreBundle, SectionScore, SectionSummary, SectionedSummary,
};
use crate::errors::EvalError;
use crate::recovery::{parse_or_repair, strip_wrapper};
use crate::scoring::{all_domains, CRITIQUE_DIMENSIONS, DEFAULT_DOMAIN};
use serde_json::Value;
use tracing::{info, warn};

use super::{call_with_retries, AnalystModel, BudgetInput, ModelSettings, RetrievalIndex, RetryPolicy};

/// Maximum characters of proposal text sent to domain classification.
const MAX_CLASSIFY_CHARS: usize = 5000;

/// Section names that mark a bare (unenveloped) score map: the six
/// weighted sections plus the auxiliary sections some responses carry.
const SECTION_MARKERS: [&str; 10] = [
    "Objectives",
    "Methodology",
    "Innovation",
    "Feasibility",
    "Budget",
    "Sustainability",
    "Impact",
    "Background",
    "Timeline",
    "Team",
];

/// Everything the decision call needs to see.
#[derive(Debug, Clone)]
pub struct DecisionInputs<'a> {
    /// The structured summary.
    pub summary: &'a SectionedSummary,
    /// Raw section scores.
    pub scores: &'a ScoreBundle,
    /// The critique report.
    pub critique: &'a CritiqueReport,
    /// The budget evaluation.
    pub budget: &'a BudgetEvaluation,
    /// The blended final score.
    pub final_score: f64,
    /// The classified domain.
    pub domain: &'a str,
}

/// Classifies the proposal's domain, substituting the documented default
/// on any failure or out-of-catalog label.
///
/// Input is truncated to avoid oversized classification calls.
pub async fn classify_domain(
    analyst: &dyn AnalystModel,
    full_text: &str,
    settings: &ModelSettings,
) -> String {
    let mut truncated: String = full_text.chars().take(MAX_CLASSIFY_CHARS).collect();
    if full_text.chars().count() > MAX_CLASSIFY_CHARS {
        truncated.push_str("\n\n[... content truncated for classification ...]");
    }

    let label = match analyst.classify_domain(&truncated, settings).await {
        Ok(response) => first_line(&response),
        Err(err) => {
            warn!(error = %err, "domain classification failed, using default");
            return DEFAULT_DOMAIN.to_string();
        }
    };

    if all_domains().contains(&label.as_str()) {
        label
    } else {
        info!(label = %label, "classifier returned unknown domain, using default");
        DEFAULT_DOMAIN.to_string()
    }
}

fn first_line(text: &str) -> String {
    strip_wrapper(text)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Runs summarization and shapes the response into a sectioned summary.
///
/// Sections whose value is not an object are dropped; an unrecoverable
/// response yields an empty summary rather than an error.
pub async fn summarize(
    analyst: &dyn AnalystModel,
    index: &dyn RetrievalIndex,
    domain: &str,
    settings: &ModelSettings,
    policy: &RetryPolicy,
) -> Result<SectionedSummary, EvalError> {
    let raw = call_with_retries("summarize", policy, || {
        analyst.summarize(index, domain, settings)
    })
    .await?;
    let recovered = parse_or_repair(&strip_wrapper(&raw), serde_json::json!({}));

    let mut summary = SectionedSummary::new();
    if let Some(object) = recovered.value.as_object() {
        for (name, section) in object {
            if let Ok(parsed) = serde_json::from_value::<SectionSummary>(section.clone()) {
                summary.insert(name.clone(), parsed);
            }
        }
    }
    Ok(summary)
}

/// Runs scoring and shapes the response into a clamped score bundle.
///
/// Handles both the `{"scores": {...}}` envelope and the bare
/// section-map shape some responses use. The caller decides whether an
/// empty bundle is fatal.
pub async fn score_sections(
    analyst: &dyn AnalystModel,
    summary: &SectionedSummary,
    domain: &str,
    settings: &ModelSettings,
    policy: &RetryPolicy,
) -> Result<ScoreBundle, EvalError> {
    let raw = call_with_retries("score", policy, || {
        analyst.score_sections(summary, domain, settings)
    })
    .await?;
    let recovered = parse_or_repair(
        &strip_wrapper(&raw),
        serde_json::json!({ "scores": {}, "overall_summary": "" }),
    );

    let overall_summary = recovered
        .value
        .get("overall_summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let sections = match recovered.value.get("scores").and_then(Value::as_object) {
        Some(scores) => Some(scores),
        // Bare shape: section names at the top level
        None => recovered.value.as_object().filter(|object| {
            SECTION_MARKERS
                .iter()
                .any(|section| object.contains_key(*section))
        }),
    };

    let mut bundle = ScoreBundle {
        overall_summary,
        ..ScoreBundle::default()
    };
    if let Some(sections) = sections {
        for (name, value) in sections {
            if let Ok(score) = serde_json::from_value::<SectionScore>(value.clone()) {
                bundle.scores.insert(name.clone(), score);
            }
        }
    }
    Ok(bundle.clamped())
}

/// Runs critique and shapes the response into a critique report.
pub async fn critique(
    analyst: &dyn AnalystModel,
    scores: &ScoreBundle,
    summary: &SectionedSummary,
    domain: &str,
    settings: &ModelSettings,
    policy: &RetryPolicy,
) -> Result<CritiqueReport, EvalError> {
    let raw = call_with_retries("critique", policy, || {
        analyst.critique(scores, summary, domain, settings)
    })
    .await?;
    let recovered = parse_or_repair(&strip_wrapper(&raw), serde_json::json!({}));

    let mut report = CritiqueReport {
        overall_feedback: recovered
            .value
            .get("overall_feedback")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        ..CritiqueReport::default()
    };

    for (key, _) in CRITIQUE_DIMENSIONS {
        if let Some(dimension) = recovered.value.get(key).filter(|v| v.is_object()) {
            report.dimensions.insert(
                key.to_string(),
                DimensionCritique {
                    issues: string_list(dimension.get("issues")),
                    recommendations: string_list(dimension.get("recommendations")),
                },
            );
        }
    }
    Ok(report)
}

/// Runs budget analysis and coerces the untrusted response.
pub async fn evaluate_budget(
    analyst: &dyn AnalystModel,
    input: &BudgetInput,
    max_budget: f64,
    domain: &str,
    settings: &ModelSettings,
    policy: &RetryPolicy,
) -> Result<BudgetEvaluation, EvalError> {
    let raw = call_with_retries("budget", policy, || {
        analyst.evaluate_budget(input, max_budget, domain, settings)
    })
    .await?;
    let recovered = parse_or_repair(&strip_wrapper(&raw), serde_json::json!({}));
    Ok(BudgetEvaluation::from_untrusted(&recovered.value))
}

/// Runs the final decision call and shapes the response leniently.
pub async fn decide(
    analyst: &dyn AnalystModel,
    inputs: &DecisionInputs<'_>,
    settings: &ModelSettings,
    policy: &RetryPolicy,
) -> Result<Decision, EvalError> {
    let raw = call_with_retries("finalize", policy, || analyst.decide(inputs, settings)).await?;
    let recovered = parse_or_repair(&strip_wrapper(&raw), serde_json::json!({}));
    Ok(shape_decision(&recovered.value))
}

fn shape_decision(value: &Value) -> Decision {
    let outcome = match value.get("decision").and_then(Value::as_str) {
        Some("ACCEPT") => DecisionOutcome::Accept,
        Some("REJECT") => DecisionOutcome::Reject,
        _ => DecisionOutcome::ConditionallyAccept,
    };
    Decision {
        decision: outcome,
        rationale: value
            .get("rationale")
            .and_then(Value::as_str)
            .unwrap_or("No rationale provided.")
            .to_string(),
        key_strengths: string_list(value.get("key_strengths")),
        key_weaknesses: string_list(value.get("key_weaknesses")),
        next_steps: string_list(value.get("next_steps")),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
