//! In-memory implementations of the collaborator contracts.

use crate::collaborators::{
    AnalystModel, BudgetInput, DecisionInputs, DocumentExtractor, IndexBuilder, IndexConfig,
    ModelSettings, Page, PlagiarismDetector, RetrievalIndex, RetrievedChunk,
};
use crate::core::{PlagiarismResult, ScoreBundle, SectionedSummary};
use crate::errors::CollaboratorError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Extractor that returns a fixed page list, or a scripted failure.
pub struct StaticExtractor {
    result: Result<Vec<Page>, CollaboratorError>,
}

impl StaticExtractor {
    /// Always returns the given pages.
    #[must_use]
    pub fn new(pages: Vec<Page>) -> Self {
        Self { result: Ok(pages) }
    }

    /// Always fails with the given message.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(CollaboratorError::permanent(message)),
        }
    }
}

#[async_trait]
impl DocumentExtractor for StaticExtractor {
    async fn extract(&self, _path: &Path) -> Result<Vec<Page>, CollaboratorError> {
        self.result.clone()
    }
}

/// Shared state behind a recording retrieval index: the chunks it
/// serves and the queries it has seen.
///
/// The state handle stays with the test while [`Self::index`] hands a
/// boxed index (sharing the same query log) to the code under test.
#[derive(Clone, Default)]
pub struct RecordingIndexState {
    chunks: Vec<RetrievedChunk>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl RecordingIndexState {
    /// Creates state serving the given chunks for every query.
    #[must_use]
    pub fn new(chunks: Vec<RetrievedChunk>) -> Self {
        Self {
            chunks,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a boxed index view over this state.
    #[must_use]
    pub fn index(&self) -> Box<dyn RetrievalIndex> {
        Box::new(self.clone())
    }

    /// Returns the queries issued so far, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl RetrievalIndex for RecordingIndexState {
    async fn query(&self, text: &str) -> Result<Vec<RetrievedChunk>, CollaboratorError> {
        self.queries.lock().push(text.to_string());
        Ok(self.chunks.clone())
    }
}

/// Builder that hands out indexes over one shared [`RecordingIndexState`].
pub struct StaticIndexBuilder {
    state: RecordingIndexState,
    failure: Option<CollaboratorError>,
}

impl StaticIndexBuilder {
    /// Builds indexes over the given state.
    #[must_use]
    pub fn new(state: RecordingIndexState) -> Self {
        Self {
            state,
            failure: None,
        }
    }

    /// Always fails with the given message.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            state: RecordingIndexState::default(),
            failure: Some(CollaboratorError::permanent(message)),
        }
    }
}

#[async_trait]
impl IndexBuilder for StaticIndexBuilder {
    async fn build(
        &self,
        _pages: &[Page],
        _config: &IndexConfig,
    ) -> Result<Box<dyn RetrievalIndex>, CollaboratorError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.state.index()),
        }
    }
}

/// Analyst double that replays scripted raw-text responses per method
/// and counts calls.
///
/// Methods with no scripted response return `"{}"`, which the lenient
/// shaping layers turn into the documented fallback shapes.
#[derive(Default)]
pub struct ScriptedAnalyst {
    responses: Mutex<HashMap<&'static str, String>>,
    failures: Mutex<HashMap<&'static str, CollaboratorError>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    observed_settings: Mutex<Vec<ModelSettings>>,
}

impl ScriptedAnalyst {
    /// Creates an analyst with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the raw text returned by a method
    /// (`classify` / `summarize` / `score` / `critique` / `budget` /
    /// `decide`).
    #[must_use]
    pub fn with_response(self, method: &'static str, text: impl Into<String>) -> Self {
        self.responses.lock().insert(method, text.into());
        self
    }

    /// Scripts a failure for a method instead of a response.
    #[must_use]
    pub fn fail_at(self, method: &'static str, error: CollaboratorError) -> Self {
        self.failures.lock().insert(method, error);
        self
    }

    /// Returns how many times a method has been called.
    #[must_use]
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    /// Returns the settings each call arrived with, in call order.
    #[must_use]
    pub fn observed_settings(&self) -> Vec<ModelSettings> {
        self.observed_settings.lock().clone()
    }

    fn invoke(
        &self,
        method: &'static str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError> {
        *self.calls.lock().entry(method).or_insert(0) += 1;
        self.observed_settings.lock().push(*settings);
        if let Some(err) = self.failures.lock().get(method) {
            return Err(err.clone());
        }
        Ok(self
            .responses
            .lock()
            .get(method)
            .cloned()
            .unwrap_or_else(|| "{}".to_string()))
    }
}

#[async_trait]
impl AnalystModel for ScriptedAnalyst {
    async fn classify_domain(
        &self,
        _full_text: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError> {
        self.invoke("classify", settings)
    }

    async fn summarize(
        &self,
        _index: &dyn RetrievalIndex,
        _domain: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError> {
        self.invoke("summarize", settings)
    }

    async fn score_sections(
        &self,
        _summary: &SectionedSummary,
        _domain: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError> {
        self.invoke("score", settings)
    }

    async fn critique(
        &self,
        _scores: &ScoreBundle,
        _summary: &SectionedSummary,
        _domain: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError> {
        self.invoke("critique", settings)
    }

    async fn evaluate_budget(
        &self,
        _budget: &BudgetInput,
        _max_budget: f64,
        _domain: &str,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError> {
        self.invoke("budget", settings)
    }

    async fn decide(
        &self,
        _inputs: &DecisionInputs<'_>,
        settings: &ModelSettings,
    ) -> Result<String, CollaboratorError> {
        self.invoke("decide", settings)
    }
}

/// Detector returning a fixed result, or a scripted failure.
pub struct StubDetector {
    result: Result<PlagiarismResult, CollaboratorError>,
}

impl StubDetector {
    /// Always returns the given result.
    #[must_use]
    pub fn new(result: PlagiarismResult) -> Self {
        Self { result: Ok(result) }
    }

    /// Always fails with the given message.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(CollaboratorError::permanent(message)),
        }
    }
}

#[async_trait]
impl PlagiarismDetector for StubDetector {
    async fn detect(&self, _full_text: &str) -> Result<PlagiarismResult, CollaboratorError> {
        self.result.clone()
    }
}
