//! Final report assembly.

use crate::core::{
    BudgetEvaluation, CritiqueIssue, CritiqueRecommendation, CritiqueReport, Decision,
    DimensionScore, EvaluationReport, FullCritique, PlagiarismResult, ScoreBundle,
    ScoreDetail, SectionScoreEntry, SectionedSummary, spaced_section_name,
};
use crate::scoring::CRITIQUE_DIMENSIONS;

/// Combines every stage's artifacts into the caller-facing report.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn assemble_report(
    summary: SectionedSummary,
    scores: &ScoreBundle,
    critique: &CritiqueReport,
    dimension_scores: Vec<DimensionScore>,
    budget: BudgetEvaluation,
    decision: Decision,
    final_score: f64,
    domain: String,
    plagiarism: Option<PlagiarismResult>,
) -> EvaluationReport {
    let mut score_details = Vec::with_capacity(scores.scores.len());
    let mut section_scores = Vec::with_capacity(scores.scores.len());
    for (name, score) in &scores.scores {
        let display = spaced_section_name(name);
        section_scores.push(SectionScoreEntry {
            section: display.clone(),
            score: score.score,
        });
        score_details.push(ScoreDetail {
            category: display,
            score: score.score,
            max_score: 10.0,
            strengths: score.strengths.clone(),
            weaknesses: score.weaknesses.clone(),
        });
    }

    EvaluationReport {
        decision,
        overall_score: final_score,
        domain,
        scores: score_details,
        critique_dimensions: dimension_scores,
        full_critique: flatten_critique(critique),
        budget_analysis: budget,
        section_scores,
        summary,
        plagiarism_check: plagiarism,
    }
}

/// Flattens the per-dimension critique into render-ready issue and
/// recommendation lists, tagged with their dimension display names.
fn flatten_critique(critique: &CritiqueReport) -> FullCritique {
    let summary = if critique.overall_feedback.is_empty() {
        "No overall feedback provided.".to_string()
    } else {
        critique.overall_feedback.clone()
    };

    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    for (key, display) in CRITIQUE_DIMENSIONS {
        if let Some(dimension) = critique.dimensions.get(key) {
            for issue in &dimension.issues {
                issues.push(CritiqueIssue {
                    severity: "high".to_string(),
                    dimension: display.to_string(),
                    description: issue.clone(),
                });
            }
            for rec in &dimension.recommendations {
                recommendations.push(CritiqueRecommendation {
                    priority: "medium".to_string(),
                    dimension: display.to_string(),
                    recommendation: rec.clone(),
                });
            }
        }
    }

    FullCritique {
        summary,
        issues,
        recommendations,
    }
}
