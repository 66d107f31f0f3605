//! Evaluation result types: scores, critiques, budget analysis, and the
//! final report shape.
//!
//! Several of these types are built from untrusted model output, so their
//! constructors coerce and clamp aggressively rather than trusting the
//! incoming shape.

use crate::core::summary::SectionedSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The documented neutral score substituted for missing sections.
pub const NEUTRAL_SECTION_SCORE: f64 = 5.0;

/// Score ceiling for every section and dimension.
pub const MAX_SCORE: f64 = 10.0;

/// Per-section content score with rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    /// Numeric score, clamped to [0, 10].
    #[serde(default)]
    pub score: f64,
    /// Textual rationale for the score.
    #[serde(default)]
    pub summary: String,
    /// Identified strengths.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Identified weaknesses.
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

impl Default for SectionScore {
    fn default() -> Self {
        Self::neutral()
    }
}

impl SectionScore {
    /// The neutral placeholder for a section the scorer omitted.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            score: NEUTRAL_SECTION_SCORE,
            summary: "Section not scored".to_string(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        }
    }

    /// Returns a copy with the score clamped to [0, 10].
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.score = self.score.clamp(0.0, MAX_SCORE);
        self
    }
}

/// Mapping from section name to its content score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBundle {
    /// Per-section scores, ordered by section name.
    #[serde(default)]
    pub scores: BTreeMap<String, SectionScore>,
    /// The scorer's overall narrative summary.
    #[serde(default)]
    pub overall_summary: String,
}

impl ScoreBundle {
    /// Returns a copy with every section score clamped to [0, 10].
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.scores = self
            .scores
            .into_iter()
            .map(|(name, score)| (name, score.clamped()))
            .collect();
        self
    }

    /// Looks up a section, substituting the neutral default when missing.
    #[must_use]
    pub fn section_or_neutral(&self, name: &str) -> SectionScore {
        self.scores.get(name).cloned().unwrap_or_else(SectionScore::neutral)
    }

    /// True when no section produced a usable score.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// One line of the budget breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    /// Spending category.
    pub category: String,
    /// Requested amount.
    pub amount: f64,
    /// Share of the total budget.
    pub percentage: f64,
}

/// A warning or observation raised by budget analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetFlag {
    /// Flag kind (e.g., "warning").
    #[serde(rename = "type")]
    pub flag_type: String,
    /// Flag description.
    pub message: String,
}

impl BudgetFlag {
    /// Creates a warning flag.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            flag_type: "warning".to_string(),
            message: message.into(),
        }
    }
}

/// The budget analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetEvaluation {
    /// Total requested budget.
    #[serde(rename = "totalBudget", default)]
    pub total_budget: f64,
    /// Per-category breakdown.
    #[serde(default)]
    pub breakdown: Vec<BudgetLine>,
    /// Warnings and observations.
    #[serde(default)]
    pub flags: Vec<BudgetFlag>,
    /// Narrative summary of the budget.
    #[serde(default)]
    pub summary: String,
}

impl BudgetEvaluation {
    /// The deterministic result substituted when the proposal carries no
    /// usable budget information. Skips the external analysis call.
    #[must_use]
    pub fn insufficient() -> Self {
        Self {
            total_budget: 0.0,
            breakdown: Vec::new(),
            flags: vec![BudgetFlag::warning(
                "No detailed budget information found in the proposal document.",
            )],
            summary: "The proposal does not contain a detailed budget section. \
                      Budget information may be missing or in a separate document."
                .to_string(),
        }
    }

    /// Builds a budget evaluation from untrusted model output.
    ///
    /// Amounts and percentages arriving as strings (`"$12,000"`, `"35%"`)
    /// are coerced to numbers; unparseable values become 0.0. Breakdown
    /// entries with a missing or "Unclear" category are dropped.
    #[must_use]
    pub fn from_untrusted(value: &serde_json::Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self {
                summary: "Budget analysis failed".to_string(),
                ..Self::default()
            };
        };

        let total_budget = object
            .get("totalBudget")
            .map(coerce_number)
            .unwrap_or(0.0);

        let breakdown = object
            .get("breakdown")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let entry = item.as_object()?;
                        let category = entry
                            .get("category")
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or("Unspecified");
                        if category.is_empty() || category == "Unclear" {
                            return None;
                        }
                        Some(BudgetLine {
                            category: category.to_string(),
                            amount: entry.get("amount").map(coerce_number).unwrap_or(0.0),
                            percentage: entry
                                .get("percentage")
                                .map(coerce_number)
                                .unwrap_or(0.0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let flags = object
            .get("flags")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let entry = item.as_object()?;
                        Some(BudgetFlag {
                            flag_type: entry
                                .get("type")
                                .and_then(serde_json::Value::as_str)
                                .unwrap_or("warning")
                                .to_string(),
                            message: entry
                                .get("message")
                                .and_then(serde_json::Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let summary = object
            .get("summary")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("No budget summary available")
            .to_string();

        Self {
            total_budget,
            breakdown,
            flags,
            summary,
        }
    }
}

/// Coerces an untrusted JSON value to a number.
///
/// Strings are stripped of `$`, `%`, and thousands separators first.
fn coerce_number(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s
            .replace(['$', '%', ','], "")
            .trim()
            .parse()
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Critique findings for one quality dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionCritique {
    /// Identified issues.
    #[serde(default)]
    pub issues: Vec<String>,
    /// Suggested improvements.
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// The full critique returned by the critique collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritiqueReport {
    /// Overall narrative feedback.
    #[serde(default)]
    pub overall_feedback: String,
    /// Per-dimension findings, keyed by dimension id
    /// (e.g., "scientific_critique").
    #[serde(default)]
    pub dimensions: BTreeMap<String, DimensionCritique>,
}

/// The final decision outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionOutcome {
    /// Fund the proposal as submitted.
    #[serde(rename = "ACCEPT")]
    Accept,
    /// Fund subject to revisions.
    #[serde(rename = "CONDITIONALLY ACCEPT")]
    ConditionallyAccept,
    /// Decline the proposal.
    #[serde(rename = "REJECT")]
    Reject,
}

impl Default for DecisionOutcome {
    fn default() -> Self {
        Self::ConditionallyAccept
    }
}

impl DecisionOutcome {
    /// Returns the wire-format label for the outcome.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::ConditionallyAccept => "CONDITIONALLY ACCEPT",
            Self::Reject => "REJECT",
        }
    }
}

impl std::fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The final decision with supporting rationale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The verdict.
    #[serde(default)]
    pub decision: DecisionOutcome,
    /// Why the verdict was reached.
    #[serde(default)]
    pub rationale: String,
    /// Key strengths supporting the decision.
    #[serde(default)]
    pub key_strengths: Vec<String>,
    /// Key weaknesses weighing against the proposal.
    #[serde(default)]
    pub key_weaknesses: Vec<String>,
    /// Suggested next steps for the applicant.
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// Result of the optional plagiarism/compliance check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismResult {
    /// Assessed risk level (e.g., "LOW", "HIGH", "UNKNOWN").
    pub risk_level: String,
    /// Detector-specific detail payload.
    #[serde(default)]
    pub report: serde_json::Value,
}

impl PlagiarismResult {
    /// The degraded result used when the detector itself failed.
    #[must_use]
    pub fn unknown(error: impl Into<String>) -> Self {
        Self {
            risk_level: "UNKNOWN".to_string(),
            report: serde_json::json!({ "error": error.into() }),
        }
    }
}

/// A per-section score entry with full detail, for report rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetail {
    /// Display name of the section.
    pub category: String,
    /// Numeric score.
    pub score: f64,
    /// Score ceiling (always 10).
    #[serde(rename = "maxScore")]
    pub max_score: f64,
    /// Identified strengths.
    pub strengths: Vec<String>,
    /// Identified weaknesses.
    pub weaknesses: Vec<String>,
}

/// A compact (section, score) pair for chart rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScoreEntry {
    /// Display name of the section.
    pub section: String,
    /// Numeric score.
    pub score: f64,
}

/// A derived score for one critique dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Display name of the dimension.
    pub dimension: String,
    /// Derived score, 0-10.
    pub score: f64,
}

/// A single critique issue tagged with its dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritiqueIssue {
    /// Severity label.
    pub severity: String,
    /// Dimension display name this issue belongs to.
    pub dimension: String,
    /// The issue text.
    pub description: String,
}

/// A single critique recommendation tagged with its dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritiqueRecommendation {
    /// Priority label.
    pub priority: String,
    /// Dimension display name this recommendation belongs to.
    pub dimension: String,
    /// The recommendation text.
    pub recommendation: String,
}

/// Flattened critique shape for report rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullCritique {
    /// Overall narrative feedback.
    pub summary: String,
    /// All issues across dimensions.
    pub issues: Vec<CritiqueIssue>,
    /// All recommendations across dimensions.
    pub recommendations: Vec<CritiqueRecommendation>,
}

/// The complete evaluation report returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// The final decision with rationale.
    pub decision: Decision,
    /// Blended overall score, 0-10, two decimal places.
    pub overall_score: f64,
    /// The classified (or overridden) research domain.
    pub domain: String,
    /// Per-section score details.
    pub scores: Vec<ScoreDetail>,
    /// Derived critique dimension scores.
    pub critique_dimensions: Vec<DimensionScore>,
    /// Flattened critique for rendering.
    pub full_critique: FullCritique,
    /// Budget analysis.
    pub budget_analysis: BudgetEvaluation,
    /// Compact section scores for charts.
    pub section_scores: Vec<SectionScoreEntry>,
    /// The structured summary the evaluation was based on.
    pub summary: SectionedSummary,
    /// Optional plagiarism check result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plagiarism_check: Option<PlagiarismResult>,
}

/// Inserts spaces into camelCase section names for display
/// (`"ExpectedOutcomes"` becomes `"Expected Outcomes"`).
#[must_use]
pub fn spaced_section_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = ch.is_lowercase();
        out.push(ch);
    }
    out
}
