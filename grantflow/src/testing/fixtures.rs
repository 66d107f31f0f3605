//! Canned collaborator responses for a well-behaved evaluation run.

use crate::collaborators::{Page, RetryPolicy};
use crate::pipeline::RunConfig;
use std::collections::BTreeMap;

use super::mocks::ScriptedAnalyst;

/// A bare domain label, as the classifier returns it.
pub const CLASSIFY_RESPONSE: &str = "AI / Computer Science\n";

/// A sectioned summary with a budget section rich enough that budget
/// text assembly stops at tier 1.
pub const SUMMARY_RESPONSE: &str = r#"{
  "Objectives": {
    "text": "Build an open benchmark suite for code models.",
    "pages": [1],
    "references": [],
    "notes": []
  },
  "Methodology": {
    "text": "Curate tasks, run baselines, publish leaderboards.",
    "pages": [1, 2],
    "references": ["Chen et al. 2021"],
    "notes": []
  },
  "Budget": {
    "text": "The total requested budget of $45,000 covers personnel costs of $30,000, compute expenses of $10,000, and dissemination funding of $5,000.",
    "pages": [2],
    "references": [],
    "notes": ["Figures are annual."]
  }
}"#;

/// Section scores in the enveloped shape.
pub const SCORES_RESPONSE: &str = r#"{
  "scores": {
    "Objectives": {
      "score": 8.0,
      "summary": "Clear and measurable.",
      "strengths": ["well scoped"],
      "weaknesses": []
    },
    "Methodology": {
      "score": 7.0,
      "summary": "Sound but conventional.",
      "strengths": ["reproducible"],
      "weaknesses": ["limited novelty"]
    },
    "Budget": {
      "score": 6.5,
      "summary": "Reasonable allocation.",
      "strengths": [],
      "weaknesses": ["compute line underspecified"]
    }
  },
  "overall_summary": "A solid, executable proposal."
}"#;

/// A critique covering two of the seven dimensions.
pub const CRITIQUE_RESPONSE: &str = r#"{
  "overall_feedback": "Competent proposal with moderate ambition.",
  "scientific_critique": {
    "issues": ["No ablation plan"],
    "recommendations": ["Add an ablation study"]
  },
  "practical_critique": {
    "issues": [],
    "recommendations": ["Name the compute provider"]
  }
}"#;

/// A budget analysis with string-typed amounts, as models emit them.
pub const BUDGET_RESPONSE: &str = r#"{
  "totalBudget": "$45,000",
  "breakdown": [
    {"category": "Personnel", "amount": "$30,000", "percentage": "66.7%"},
    {"category": "Compute", "amount": "$10,000", "percentage": "22.2%"},
    {"category": "Dissemination", "amount": "$5,000", "percentage": "11.1%"}
  ],
  "flags": [],
  "summary": "Within limits and plausibly allocated."
}"#;

/// An accepting final decision.
pub const DECISION_RESPONSE: &str = r#"{
  "decision": "ACCEPT",
  "rationale": "Strong objectives and a credible plan.",
  "key_strengths": ["clear scope", "reasonable budget"],
  "key_weaknesses": ["limited novelty"],
  "next_steps": ["Confirm compute provider"]
}"#;

/// Two pages of proposal text, including budget keywords.
#[must_use]
pub fn make_pages() -> Vec<Page> {
    vec![
        Page {
            content: "We propose an open benchmark suite for code models. \
                      Objectives and methodology follow."
                .to_string(),
            page_number: 1,
            metadata: BTreeMap::new(),
        },
        Page {
            content: "Budget: the total cost is $45,000, covering personnel, \
                      compute, and dissemination."
                .to_string(),
            page_number: 2,
            metadata: BTreeMap::new(),
        },
    ]
}

/// An analyst scripted for a complete successful run.
#[must_use]
pub fn happy_analyst() -> ScriptedAnalyst {
    ScriptedAnalyst::new()
        .with_response("classify", CLASSIFY_RESPONSE)
        .with_response("summarize", SUMMARY_RESPONSE)
        .with_response("score", SCORES_RESPONSE)
        .with_response("critique", CRITIQUE_RESPONSE)
        .with_response("budget", BUDGET_RESPONSE)
        .with_response("decide", DECISION_RESPONSE)
}

/// A run config with retry backoff disabled, for fast tests.
#[must_use]
pub fn immediate_config() -> RunConfig {
    RunConfig::new().with_retry(RetryPolicy::immediate())
}
