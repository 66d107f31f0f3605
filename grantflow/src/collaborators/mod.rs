//! External collaborator contracts.
//!
//! The pipeline core treats text extraction, retrieval, the model calls,
//! and plagiarism detection as narrow functional interfaces. Their
//! internals (prompts, embeddings, parsers) live outside this crate;
//! mock implementations for tests live in [`crate::testing`].

mod calls;
mod retry;

pub use calls::{
    classify_domain, critique, decide, evaluate_budget, score_sections, summarize,
    DecisionInputs,
};
pub use retry::{call_with_retries, RetryPolicy};

use crate::errors::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One extracted page of the proposal document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// The page's extracted text.
    pub content: String,
    /// 1-based page number.
    pub page_number: usize,
    /// Extractor-specific metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A text fragment returned by a retrieval query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The fragment text.
    pub content: String,
    /// Page the fragment came from.
    pub page_number: usize,
    /// Source identifier (e.g., the document name).
    pub source: String,
}

/// Configuration for building a run's retrieval index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Chunk size in characters.
    pub chunk_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { chunk_size: 1000 }
    }
}

/// Per-run generation settings forwarded to every model call.
///
/// Explicitly passed rather than set as ambient mode on the shared
/// model handle, so concurrent runs with different settings never
/// interfere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Deterministic generation (temperature zero, single candidate).
    pub deterministic: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            deterministic: true,
        }
    }
}

/// The budget text bundle handed to the budget analysis call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetInput {
    /// Assembled budget text (possibly from several extraction tiers).
    pub text: String,
    /// Notes attached to the budget section.
    pub notes: Vec<String>,
    /// References cited by the budget section.
    pub references: Vec<String>,
    /// The scorer's budget section score.
    pub score: f64,
    /// The scorer's budget rationale.
    pub summary: String,
    /// Budget strengths from scoring.
    pub strengths: Vec<String>,
    /// Budget weaknesses from scoring.
    pub weaknesses: Vec<String>,
}

/// Extracts ordered pages from a proposal document.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extracts the document at `path` into ordered pages.
    ///
    /// Failure is fatal for the run.
    async fn extract(&self, path: &Path) -> Result<Vec<Page>, CollaboratorError>;
}

/// A retrieval index scoped to one run's document.
///
/// Supports repeated queries within the run; dropped (explicitly) once
/// the stages that consume it have finished.
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Returns the fragments most relevant to `text`.
    async fn query(&self, text: &str) -> Result<Vec<RetrievedChunk>, CollaboratorError>;
}

/// Builds a fresh retrieval index for one run.
///
/// The builder itself is the create-once shared handle (it may hold a
/// cached embedding model); each run borrows it to build an isolated
/// index so no retrieval state leaks across runs.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    /// Builds an index over the given pages.
    async fn build(
        &self,
        pages: &[Page],
        config: &IndexConfig,
    ) -> Result<Box<dyn RetrievalIndex>, CollaboratorError>;
}

/// The language-model boundary.
///
/// Every method returns the model's raw text response; parsing, repair,
/// and shaping happen on this side of the boundary (see
/// [`crate::recovery`] and [`calls`]), so malformed output never
/// propagates as an error from these contracts' callers.
#[async_trait]
pub trait AnalystModel: Send + Sync {
    /// Classifies the proposal's research domain. Returns a bare label.
    async fn classify_domain(
        &self,
        full_text: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError>;

    /// Produces the structured section-wise summary as JSON text.
    async fn summarize(
        &self,
        index: &dyn RetrievalIndex,
        domain: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError>;

    /// Scores the summary's sections. Returns JSON text.
    async fn score_sections(
        &self,
        summary: &crate::core::SectionedSummary,
        domain: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError>;

    /// Critiques the proposal across quality dimensions. Returns JSON text.
    async fn critique(
        &self,
        scores: &crate::core::ScoreBundle,
        summary: &crate::core::SectionedSummary,
        domain: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError>;

    /// Analyzes the assembled budget text. Returns JSON text.
    async fn evaluate_budget(
        &self,
        budget: &BudgetInput,
        max_budget: f64,
        domain: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError>;

    /// Produces the final decision. Returns JSON text.
    async fn decide(
        &self,
        inputs: &DecisionInputs<'_>,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError>;
}

/// Optional plagiarism/compliance detector.
#[async_trait]
pub trait PlagiarismDetector: Send + Sync {
    /// Assesses plagiarism risk over the full proposal text.
    async fn detect(
        &self,
        full_text: &str,
    ) -> Result<crate::core::PlagiarismResult, CollaboratorError>;
}
