//! Structured summary types produced by the summarization collaborator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One section of the structured summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    /// The summarized section text.
    #[serde(default)]
    pub text: String,
    /// Source page numbers the section draws from.
    #[serde(default)]
    pub pages: Vec<usize>,
    /// Referenced material cited in the section.
    #[serde(default)]
    pub references: Vec<String>,
    /// Reviewer notes attached to the section.
    #[serde(default)]
    pub notes: Vec<String>,
}

/// A mapping from section name to its summary.
///
/// Ordered so reports render sections deterministically.
pub type SectionedSummary = BTreeMap<String, SectionSummary>;
