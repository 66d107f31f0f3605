//! The score aggregator: blends section and critique contributions.
//!
//! Deterministic and side-effect-free; identical inputs always yield
//! identical output regardless of upstream model non-determinism.

use crate::core::{CritiqueReport, DimensionScore, ScoreBundle};
use std::collections::BTreeMap;

use super::weights::section_weighted_score;

const SECTION_WEIGHT: f64 = 0.60;
const CRITIQUE_WEIGHT: f64 = 0.40;

/// Score assigned to a critique dimension with no data.
const DIMENSION_DEFAULT_SCORE: f64 = 6.0;

/// The seven critique dimensions: internal key and display name, in
/// fixed order.
pub const CRITIQUE_DIMENSIONS: [(&str, &str); 7] = [
    ("scientific_critique", "Scientific"),
    ("practical_critique", "Practical"),
    ("language_critique", "Language"),
    ("context_critique", "Context"),
    ("persuasiveness_critique", "Persuasiveness"),
    ("ethical_critique", "Ethical"),
    ("innovation_critique", "Innovation"),
];

/// Arithmetic mean of critique dimension scores; 0.0 when empty.
#[must_use]
pub fn critique_average(critique_scores: &BTreeMap<String, f64>) -> f64 {
    if critique_scores.is_empty() {
        return 0.0;
    }
    critique_scores.values().sum::<f64>() / critique_scores.len() as f64
}

/// Blends section and critique contributions into the final score.
///
/// `0.6 × section + 0.4 × critique-mean`, clamped to [0, 10] and rounded
/// to two decimal places. With no critique scores at all, the blended
/// score equals the section contribution alone; critique scores that are
/// present but zero flow through the formula unchanged.
#[must_use]
pub fn blend(
    section_scores: &ScoreBundle,
    domain: &str,
    critique_scores: &BTreeMap<String, f64>,
) -> f64 {
    let section = section_weighted_score(section_scores, domain);

    let combined = if critique_scores.is_empty() {
        section
    } else {
        SECTION_WEIGHT * section + CRITIQUE_WEIGHT * critique_average(critique_scores)
    };

    round2(combined.clamp(0.0, 10.0))
}

/// Derives a score for each critique dimension from the issue and
/// recommendation counts.
///
/// Starting from the section-score baseline, each issue subtracts 0.4 and
/// each recommendation 0.1, with a fixed per-dimension variation of
/// `index × 0.15 − 0.5`. Results clamp to [0, 10] and round to one
/// decimal. Dimensions absent from the critique default to 6.0.
#[must_use]
pub fn derive_dimension_scores(critique: &CritiqueReport, baseline: f64) -> Vec<DimensionScore> {
    CRITIQUE_DIMENSIONS
        .iter()
        .enumerate()
        .map(|(index, (key, display))| {
            let score = match critique.dimensions.get(*key) {
                Some(dimension) => {
                    let issue_penalty = dimension.issues.len() as f64 * 0.4;
                    let rec_penalty = dimension.recommendations.len() as f64 * 0.1;
                    let variation = index as f64 * 0.15 - 0.5;
                    round1((baseline - issue_penalty - rec_penalty + variation).clamp(0.0, 10.0))
                }
                None => DIMENSION_DEFAULT_SCORE,
            };
            DimensionScore {
                dimension: (*display).to_string(),
                score,
            }
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
