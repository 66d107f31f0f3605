//! Budget text assembly.
//!
//! Proposals rarely put their budget where the summarizer expects it, so
//! the budget stage applies a four-tier fallback extraction strategy:
//!
//! 1. the dedicated Budget section from summarization;
//! 2. raw source pages with a density of budget keywords or currency
//!    symbols, when tier 1 came up short;
//! 3. a targeted retrieval query for budget content;
//! 4. the remaining summary sections, scanned for budget keyword
//!    co-occurrence.
//!
//! Non-empty tiers are concatenated with explicit separators, never
//! replaced. When the combined text still lacks both a minimum length
//! and a budget-indicative keyword, the stage short-circuits with a
//! deterministic "insufficient budget information" result instead of
//! spending an external call.

use crate::collaborators::{BudgetInput, Page, RetrievalIndex};
use crate::core::{ScoreBundle, SectionedSummary};
use tracing::{debug, warn};

/// Below this length the dedicated Budget section is considered short
/// and tier 2 kicks in.
pub const MIN_BUDGET_SECTION_LEN: usize = 20;

/// Tiers 3 and 4 keep running until the combined text reaches this
/// length.
pub const BUDGET_TEXT_TARGET_LEN: usize = 200;

/// The combined text must reach this length (and carry a keyword) to
/// justify the external budget call.
pub const MIN_COMBINED_LEN: usize = 50;

/// Keywords and currency markers that indicate budget content.
pub const BUDGET_KEYWORDS: [&str; 8] = [
    "budget", "cost", "funding", "financial", "expense", "$", "€", "£",
];

/// A raw page qualifies for tier 2 with at least this many keyword hits.
const PAGE_HIT_THRESHOLD: usize = 2;

/// Cap on raw pages merged by tier 2.
const MAX_FALLBACK_PAGES: usize = 3;

/// Cap on retrieval fragments merged by tier 3.
const MAX_RETRIEVED_CHUNKS: usize = 5;

const TIER_SEPARATOR: &str = "\n---\n";

const BUDGET_RETRIEVAL_QUERY: &str =
    "budget cost breakdown funding request total expenses personnel equipment";

/// True when the text contains at least one budget-indicative keyword.
#[must_use]
pub fn has_budget_signal(text: &str) -> bool {
    let lowered = text.to_lowercase();
    BUDGET_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

fn keyword_hits(text: &str) -> usize {
    let lowered = text.to_lowercase();
    BUDGET_KEYWORDS
        .iter()
        .map(|keyword| lowered.matches(keyword).count())
        .sum()
}

/// True when the assembled text justifies the external budget call.
#[must_use]
pub fn is_sufficient(text: &str) -> bool {
    text.len() >= MIN_COMBINED_LEN && has_budget_signal(text)
}

/// Assembles budget text from the four extraction tiers.
pub async fn assemble_budget_text(
    summary: &SectionedSummary,
    pages: &[Page],
    index: &dyn RetrievalIndex,
) -> String {
    let mut tiers: Vec<String> = Vec::new();

    // Tier 1: dedicated Budget section
    let section_text = summary
        .get("Budget")
        .map(|section| section.text.trim().to_string())
        .unwrap_or_default();
    if !section_text.is_empty() {
        tiers.push(section_text);
    }

    let combined_len = |tiers: &[String]| tiers.iter().map(String::len).sum::<usize>();

    // Tier 2: raw pages dense in budget keywords
    if combined_len(&tiers) < MIN_BUDGET_SECTION_LEN {
        debug!("budget section short, scanning raw pages");
        let mut merged = Vec::new();
        for page in pages {
            if keyword_hits(&page.content) >= PAGE_HIT_THRESHOLD {
                merged.push(page.content.trim());
                if merged.len() >= MAX_FALLBACK_PAGES {
                    break;
                }
            }
        }
        if !merged.is_empty() {
            tiers.push(merged.join("\n"));
        }
    }

    // Tier 3: targeted retrieval
    if combined_len(&tiers) < BUDGET_TEXT_TARGET_LEN {
        match index.query(BUDGET_RETRIEVAL_QUERY).await {
            Ok(chunks) => {
                let merged: Vec<&str> = chunks
                    .iter()
                    .filter(|chunk| has_budget_signal(&chunk.content))
                    .take(MAX_RETRIEVED_CHUNKS)
                    .map(|chunk| chunk.content.trim())
                    .collect();
                if !merged.is_empty() {
                    tiers.push(merged.join("\n"));
                }
            }
            Err(err) => {
                // Retrieval is best-effort here; later tiers still run
                warn!(error = %err, "budget retrieval query failed");
            }
        }
    }

    // Tier 4: other summary sections mentioning budget terms
    if combined_len(&tiers) < BUDGET_TEXT_TARGET_LEN {
        let mut merged = Vec::new();
        for (name, section) in summary {
            if name != "Budget" && has_budget_signal(&section.text) {
                merged.push(section.text.trim());
            }
        }
        if !merged.is_empty() {
            tiers.push(merged.join("\n"));
        }
    }

    tiers.join(TIER_SEPARATOR)
}

/// Builds the bundle handed to the budget analysis call.
#[must_use]
pub fn build_budget_input(
    summary: &SectionedSummary,
    scores: &ScoreBundle,
    text: String,
) -> BudgetInput {
    let section = summary.get("Budget").cloned().unwrap_or_default();
    let score = scores.section_or_neutral("Budget");
    BudgetInput {
        text,
        notes: section.notes,
        references: section.references,
        score: score.score,
        summary: score.summary,
        strengths: score.strengths,
        weaknesses: score.weaknesses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SectionSummary;
    use crate::testing::mocks::RecordingIndexState;
    use pretty_assertions::assert_eq;

    fn summary_with(sections: &[(&str, &str)]) -> SectionedSummary {
        sections
            .iter()
            .map(|(name, text)| {
                (
                    (*name).to_string(),
                    SectionSummary {
                        text: (*text).to_string(),
                        ..SectionSummary::default()
                    },
                )
            })
            .collect()
    }

    fn page(content: &str) -> Page {
        Page {
            content: content.to_string(),
            page_number: 1,
            metadata: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn test_budget_signal() {
        assert!(has_budget_signal("Total cost is $40,000"));
        assert!(has_budget_signal("The BUDGET covers personnel"));
        assert!(!has_budget_signal("A study of coral reefs"));
    }

    #[tokio::test]
    async fn test_long_budget_section_skips_other_tiers() {
        let budget_text = "The total budget of $48,000 covers personnel costs, \
                           equipment expenses, and travel funding over two years \
                           with detailed quarterly breakdowns for every category."
            .repeat(2);
        let summary = summary_with(&[("Budget", &budget_text)]);
        let state = RecordingIndexState::new(Vec::new());
        let index = state.index();

        let text = assemble_budget_text(&summary, &[], index.as_ref()).await;
        assert!(text.starts_with("The total budget"));
        // Target length already met, so retrieval never runs
        assert!(state.queries().is_empty());
    }

    #[tokio::test]
    async fn test_short_section_triggers_page_scan_and_retrieval() {
        let summary = summary_with(&[("Budget", "See below.")]);
        let pages = vec![
            page("Introduction to the research problem."),
            page("The budget allocates $30,000 for staff and equipment cost."),
        ];
        let state = RecordingIndexState::new(Vec::new());
        let index = state.index();

        let text = assemble_budget_text(&summary, &pages, index.as_ref()).await;
        assert!(text.contains("See below."));
        assert!(text.contains("$30,000"));
        assert!(text.contains(TIER_SEPARATOR));
        assert_eq!(state.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_other_sections_scanned_last() {
        let summary = summary_with(&[
            ("Budget", ""),
            ("Methodology", "We apply survey methods."),
            (
                "Feasibility",
                "Funding of $12,000 covers the pilot; remaining cost is in-kind.",
            ),
        ]);
        let state = RecordingIndexState::new(Vec::new());
        let index = state.index();

        let text = assemble_budget_text(&summary, &[], index.as_ref()).await;
        assert!(text.contains("$12,000"));
        assert!(!text.contains("survey methods"));
    }

    #[tokio::test]
    async fn test_no_budget_anywhere_yields_insufficient_text() {
        let summary = summary_with(&[("Objectives", "Study reefs.")]);
        let state = RecordingIndexState::new(Vec::new());
        let index = state.index();

        let text = assemble_budget_text(&summary, &[page("Coral reefs are fascinating.")], index.as_ref()).await;
        assert!(!is_sufficient(&text));
    }

    #[test]
    fn test_is_sufficient_needs_length_and_keyword() {
        assert!(!is_sufficient(""));
        assert!(!is_sufficient("budget"));
        let long_no_keyword = "x".repeat(100);
        assert!(!is_sufficient(&long_no_keyword));
        let good = format!("{} budget", "x".repeat(100));
        assert!(is_sufficient(&good));
    }

    #[test]
    fn test_build_budget_input_defaults() {
        let summary = SectionedSummary::new();
        let scores = ScoreBundle::default();
        let input = build_budget_input(&summary, &scores, "text".to_string());
        assert_eq!(input.score, 5.0);
        assert_eq!(input.text, "text");
        assert!(input.notes.is_empty());
    }
}
