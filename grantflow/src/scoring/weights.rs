//! Per-domain section weight tables.
//!
//! Weights for each domain sum to 1.0 across the six standard sections.
//! Unknown domains fall back to equal weighting over present sections.
//! The tables are static configuration data; the blend formula lives in
//! [`super::blend`].

use crate::core::{ScoreBundle, SectionScore};
use std::collections::BTreeMap;

/// The default domain substituted when classification fails or returns a
/// label outside the catalog.
pub const DEFAULT_DOMAIN: &str = "Social Sciences / Policy";

type WeightRow = &'static [(&'static str, f64)];

const DOMAIN_WEIGHTS: &[(&str, WeightRow)] = &[
    (
        "AI / Computer Science",
        &[
            ("Objectives", 0.15),
            ("Methodology", 0.25),
            ("Innovation", 0.30),
            ("Feasibility", 0.15),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Biotechnology / Life Sciences",
        &[
            ("Objectives", 0.10),
            ("Methodology", 0.30),
            ("Innovation", 0.20),
            ("Feasibility", 0.25),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Healthcare / Medicine",
        &[
            ("Objectives", 0.15),
            ("Methodology", 0.25),
            ("Innovation", 0.15),
            ("Feasibility", 0.30),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Education / Learning Sciences",
        &[
            ("Objectives", 0.25),
            ("Methodology", 0.20),
            ("Innovation", 0.10),
            ("Feasibility", 0.25),
            ("Budget", 0.10),
            ("Sustainability", 0.10),
        ],
    ),
    (
        "Environment / Climate / Sustainability",
        &[
            ("Objectives", 0.20),
            ("Methodology", 0.20),
            ("Innovation", 0.15),
            ("Feasibility", 0.20),
            ("Budget", 0.10),
            ("Sustainability", 0.15),
        ],
    ),
    (
        "Social Sciences / Policy",
        &[
            ("Objectives", 0.30),
            ("Methodology", 0.20),
            ("Innovation", 0.10),
            ("Feasibility", 0.20),
            ("Budget", 0.10),
            ("Sustainability", 0.10),
        ],
    ),
    (
        "Engineering / Technology",
        &[
            ("Objectives", 0.15),
            ("Methodology", 0.25),
            ("Innovation", 0.25),
            ("Feasibility", 0.20),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Physics / Materials Science",
        &[
            ("Objectives", 0.10),
            ("Methodology", 0.30),
            ("Innovation", 0.25),
            ("Feasibility", 0.20),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Chemistry / Chemical Engineering",
        &[
            ("Objectives", 0.10),
            ("Methodology", 0.30),
            ("Innovation", 0.20),
            ("Feasibility", 0.25),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Agriculture / Food Science",
        &[
            ("Objectives", 0.15),
            ("Methodology", 0.25),
            ("Innovation", 0.15),
            ("Feasibility", 0.25),
            ("Budget", 0.10),
            ("Sustainability", 0.10),
        ],
    ),
    (
        "Energy / Renewable Resources",
        &[
            ("Objectives", 0.20),
            ("Methodology", 0.20),
            ("Innovation", 0.20),
            ("Feasibility", 0.20),
            ("Budget", 0.10),
            ("Sustainability", 0.10),
        ],
    ),
    (
        "Economics / Business",
        &[
            ("Objectives", 0.25),
            ("Methodology", 0.20),
            ("Innovation", 0.10),
            ("Feasibility", 0.25),
            ("Budget", 0.15),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Arts / Humanities",
        &[
            ("Objectives", 0.30),
            ("Methodology", 0.15),
            ("Innovation", 0.20),
            ("Feasibility", 0.20),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Psychology / Behavioral Sciences",
        &[
            ("Objectives", 0.20),
            ("Methodology", 0.30),
            ("Innovation", 0.10),
            ("Feasibility", 0.25),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Urban Planning / Architecture",
        &[
            ("Objectives", 0.20),
            ("Methodology", 0.20),
            ("Innovation", 0.15),
            ("Feasibility", 0.25),
            ("Budget", 0.10),
            ("Sustainability", 0.10),
        ],
    ),
    (
        "Data Science / Statistics",
        &[
            ("Objectives", 0.15),
            ("Methodology", 0.30),
            ("Innovation", 0.20),
            ("Feasibility", 0.20),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Cybersecurity / Information Security",
        &[
            ("Objectives", 0.15),
            ("Methodology", 0.25),
            ("Innovation", 0.25),
            ("Feasibility", 0.20),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Public Health / Epidemiology",
        &[
            ("Objectives", 0.20),
            ("Methodology", 0.25),
            ("Innovation", 0.10),
            ("Feasibility", 0.30),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Space Science / Astronomy",
        &[
            ("Objectives", 0.15),
            ("Methodology", 0.30),
            ("Innovation", 0.25),
            ("Feasibility", 0.15),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
    (
        "Marine Biology / Oceanography",
        &[
            ("Objectives", 0.15),
            ("Methodology", 0.25),
            ("Innovation", 0.15),
            ("Feasibility", 0.25),
            ("Budget", 0.10),
            ("Sustainability", 0.10),
        ],
    ),
    (
        "Neuroscience / Cognitive Science",
        &[
            ("Objectives", 0.10),
            ("Methodology", 0.35),
            ("Innovation", 0.20),
            ("Feasibility", 0.20),
            ("Budget", 0.10),
            ("Sustainability", 0.05),
        ],
    ),
];

/// Returns the closed set of recognized domains, in catalog order.
#[must_use]
pub fn all_domains() -> Vec<&'static str> {
    DOMAIN_WEIGHTS.iter().map(|(domain, _)| *domain).collect()
}

/// Looks up the weight row for a domain.
#[must_use]
pub fn domain_weights(domain: &str) -> Option<WeightRow> {
    DOMAIN_WEIGHTS
        .iter()
        .find(|(name, _)| *name == domain)
        .map(|(_, weights)| *weights)
}

/// Computes the domain-weighted section score (content contribution).
///
/// This is also the legacy section-only scoring formula, used on its own
/// when no critique data exists. The weighted sum is normalized by the
/// total weight actually matched, so missing sections do not drag the
/// score down. When no weighted section matches at all, the plain average
/// of present sections is used instead.
#[must_use]
pub fn section_weighted_score(bundle: &ScoreBundle, domain: &str) -> f64 {
    let weights: BTreeMap<&str, f64> = match domain_weights(domain) {
        Some(row) => row.iter().copied().collect(),
        None => {
            // Unknown domain: equal weighting across present sections
            let count = bundle.scores.len();
            if count == 0 {
                return 0.0;
            }
            bundle
                .scores
                .keys()
                .map(|name| (name.as_str(), 1.0 / count as f64))
                .collect()
        }
    };

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (section, score) in &bundle.scores {
        if let Some(weight) = weights.get(section.as_str()) {
            weighted_sum += score.score * weight;
            total_weight += weight;
        }
    }

    if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        plain_average(&bundle.scores)
    }
}

fn plain_average(scores: &BTreeMap<String, SectionScore>) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.values().map(|s| s.score).sum::<f64>() / scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bundle(entries: &[(&str, f64)]) -> ScoreBundle {
        ScoreBundle {
            scores: entries
                .iter()
                .map(|(name, score)| {
                    (
                        (*name).to_string(),
                        SectionScore {
                            score: *score,
                            ..SectionScore::default()
                        },
                    )
                })
                .collect(),
            overall_summary: String::new(),
        }
    }

    #[test]
    fn test_catalog_size() {
        assert_eq!(all_domains().len(), 21);
        assert!(all_domains().contains(&DEFAULT_DOMAIN));
    }

    #[test]
    fn test_weights_sum_to_one() {
        for domain in all_domains() {
            let total: f64 = domain_weights(domain)
                .unwrap()
                .iter()
                .map(|(_, w)| w)
                .sum();
            assert!(
                (total - 1.0).abs() < 1e-9,
                "weights for {domain} sum to {total}"
            );
        }
    }

    #[test]
    fn test_weighted_score_full_sections() {
        let scores = bundle(&[
            ("Objectives", 8.0),
            ("Methodology", 6.0),
            ("Innovation", 9.0),
            ("Feasibility", 7.0),
            ("Budget", 5.0),
            ("Sustainability", 6.0),
        ]);
        let result = section_weighted_score(&scores, "AI / Computer Science");
        let expected = 8.0 * 0.15 + 6.0 * 0.25 + 9.0 * 0.30 + 7.0 * 0.15 + 5.0 * 0.10 + 6.0 * 0.05;
        assert!((result - expected).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_score_normalizes_missing_sections() {
        let scores = bundle(&[("Objectives", 8.0), ("Methodology", 6.0)]);
        // AI weights: Objectives 0.15, Methodology 0.25
        let result = section_weighted_score(&scores, "AI / Computer Science");
        let expected = (8.0 * 0.15 + 6.0 * 0.25) / 0.40;
        assert!((result - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_domain_equal_weighting() {
        let scores = bundle(&[("Objectives", 8.0), ("Methodology", 6.0)]);
        let result = section_weighted_score(&scores, "Basket Weaving");
        assert!((result - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_matching_sections_falls_back_to_average() {
        let scores = bundle(&[("NovelSection", 4.0), ("OtherSection", 8.0)]);
        let result = section_weighted_score(&scores, "AI / Computer Science");
        assert!((result - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_bundle_scores_zero() {
        let scores = bundle(&[]);
        assert_eq!(section_weighted_score(&scores, "AI / Computer Science"), 0.0);
        assert_eq!(section_weighted_score(&scores, "Unknown"), 0.0);
    }
}
