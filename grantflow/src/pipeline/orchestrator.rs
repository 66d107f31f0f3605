//! The eight-stage evaluation orchestrator.
//!
//! One `run` call drives a single proposal through the fixed stage
//! sequence. Stage transitions are published to the status broadcaster
//! as they happen; the first fatal error aborts the run, emits an
//! `errored` event at the failing stage, and sends the terminal error
//! message before the session closes.

use crate::broadcast::StatusBroadcaster;
use crate::collaborators::{
    classify_domain, critique, decide, evaluate_budget, score_sections, summarize,
    AnalystModel, DecisionInputs, DocumentExtractor, IndexBuilder, ModelSettings,
    PlagiarismDetector,
};
use crate::core::{
    BudgetEvaluation, EvaluationReport, PlagiarismResult, SessionId, SessionMessage,
    StageEvent, StageRegistry, StageStatus,
};
use crate::errors::EvalError;
use crate::scoring::{blend, derive_dimension_scores, section_weighted_score};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::budget::{assemble_budget_text, build_budget_input, is_sufficient};
use super::{assemble_report, RunConfig};

const INGEST: usize = 0;
const DOMAIN_DETECT: usize = 1;
const SUMMARIZE: usize = 2;
const SCORE: usize = 3;
const CRITIQUE: usize = 4;
const BUDGET: usize = 5;
const COMPLIANCE: usize = 6;
const FINALIZE: usize = 7;

/// Drives evaluation runs through the fixed stage sequence.
///
/// Holds the shared collaborator handles; cheap to clone behind an
/// `Arc` and safe to use from concurrent runs, since all per-run state
/// lives on the `run` stack.
pub struct Orchestrator {
    extractor: Arc<dyn DocumentExtractor>,
    indexer: Arc<dyn IndexBuilder>,
    analyst: Arc<dyn AnalystModel>,
    plagiarism: Option<Arc<dyn PlagiarismDetector>>,
    broadcaster: Arc<StatusBroadcaster>,
}

impl Orchestrator {
    /// Creates an orchestrator over the given collaborators.
    #[must_use]
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        indexer: Arc<dyn IndexBuilder>,
        analyst: Arc<dyn AnalystModel>,
        broadcaster: Arc<StatusBroadcaster>,
    ) -> Self {
        Self {
            extractor,
            indexer,
            analyst,
            plagiarism: None,
            broadcaster,
        }
    }

    /// Attaches an optional plagiarism detector.
    #[must_use]
    pub fn with_plagiarism_detector(mut self, detector: Arc<dyn PlagiarismDetector>) -> Self {
        self.plagiarism = Some(detector);
        self
    }

    /// Returns the broadcaster runs publish to.
    #[must_use]
    pub fn broadcaster(&self) -> &Arc<StatusBroadcaster> {
        &self.broadcaster
    }

    /// Evaluates one proposal document end to end.
    ///
    /// On success the assembled report is both returned and published as
    /// the session's terminal `complete` message. On failure the session
    /// receives an `errored` stage event followed by the terminal error
    /// message. Either way the session is closed afterwards.
    pub async fn run(
        &self,
        session: &SessionId,
        document: &Path,
        config: &RunConfig,
    ) -> Result<EvaluationReport, EvalError> {
        info!(session = %session, document = %document.display(), "evaluation run starting");
        match self.run_stages(session, document, config).await {
            Ok(report) => match serde_json::to_value(&report) {
                Ok(payload) => {
                    self.broadcaster
                        .publish(session, SessionMessage::Complete { payload })
                        .await;
                    self.broadcaster.close(session);
                    info!(session = %session, score = report.overall_score, "evaluation run complete");
                    Ok(report)
                }
                Err(err) => {
                    let err = EvalError::from(err);
                    self.publish_failure(session, FINALIZE, &err).await;
                    Err(err)
                }
            },
            Err((ordinal, err)) => {
                self.publish_failure(session, ordinal, &err).await;
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn run_stages(
        &self,
        session: &SessionId,
        document: &Path,
        config: &RunConfig,
    ) -> Result<EvaluationReport, (usize, EvalError)> {
        let emitter = StageEmitter {
            broadcaster: &self.broadcaster,
            session,
            total: StageRegistry::count(),
        };
        let retry = &config.retry;
        let settings = ModelSettings {
            deterministic: config.deterministic,
        };

        // ingest
        emitter.started(INGEST).await;
        let pages = self
            .extractor
            .extract(document)
            .await
            .map_err(|err| (INGEST, EvalError::Extraction(err.message)))?;
        if pages.is_empty() {
            return Err((INGEST, EvalError::EmptyDocument));
        }
        let full_text = pages
            .iter()
            .map(|page| page.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let index = self
            .indexer
            .build(&pages, &config.index)
            .await
            .map_err(|err| (INGEST, EvalError::collaborator("ingest", err.message)))?;
        emitter
            .completed(INGEST, format!("Loaded {} pages", pages.len()))
            .await;

        // domain-detect
        emitter.started(DOMAIN_DETECT).await;
        let domain = match &config.domain_override {
            Some(domain) => {
                debug!(domain = %domain, "domain override set, skipping classification");
                domain.clone()
            }
            None => classify_domain(self.analyst.as_ref(), &full_text, &settings).await,
        };
        emitter
            .completed(DOMAIN_DETECT, format!("Domain: {domain}"))
            .await;

        // summarize
        emitter.started(SUMMARIZE).await;
        let summary = summarize(self.analyst.as_ref(), index.as_ref(), &domain, &settings, retry)
            .await
            .map_err(|err| (SUMMARIZE, err))?;
        emitter
            .completed(SUMMARIZE, format!("Summarized {} sections", summary.len()))
            .await;

        // score
        emitter.started(SCORE).await;
        let scores = score_sections(self.analyst.as_ref(), &summary, &domain, &settings, retry)
            .await
            .map_err(|err| (SCORE, err))?;
        if scores.is_empty() {
            return Err((SCORE, EvalError::NoUsableScores));
        }
        let section_score = section_weighted_score(&scores, &domain);
        emitter
            .completed(SCORE, format!("Scored {} sections", scores.scores.len()))
            .await;

        // critique
        emitter.started(CRITIQUE).await;
        let critique_report = critique(
            self.analyst.as_ref(),
            &scores,
            &summary,
            &domain,
            &settings,
            retry,
        )
        .await
        .map_err(|err| (CRITIQUE, err))?;
        let dimension_scores = derive_dimension_scores(&critique_report, section_score);
        emitter
            .completed(
                CRITIQUE,
                format!(
                    "Critiqued {} dimensions",
                    critique_report.dimensions.len()
                ),
            )
            .await;

        // budget
        emitter.started(BUDGET).await;
        let budget_text = assemble_budget_text(&summary, &pages, index.as_ref()).await;
        let budget = if is_sufficient(&budget_text) {
            let input = build_budget_input(&summary, &scores, budget_text);
            evaluate_budget(
                self.analyst.as_ref(),
                &input,
                config.max_budget,
                &domain,
                &settings,
                retry,
            )
            .await
            .map_err(|err| (BUDGET, err))?
        } else {
            debug!("insufficient budget text, skipping budget analysis call");
            BudgetEvaluation::insufficient()
        };
        // No stage after this one queries the index
        drop(index);
        emitter
            .completed(BUDGET, format!("Total budget: {:.2}", budget.total_budget))
            .await;

        // compliance
        emitter.started(COMPLIANCE).await;
        let plagiarism = if config.check_plagiarism {
            Some(self.detect_plagiarism(&full_text).await)
        } else {
            None
        };
        let compliance_message = plagiarism.as_ref().map_or_else(
            || "Compliance checks skipped".to_string(),
            |result| format!("Plagiarism risk: {}", result.risk_level),
        );
        emitter.completed(COMPLIANCE, compliance_message).await;

        // finalize
        emitter.started(FINALIZE).await;
        let critique_map: BTreeMap<String, f64> = if critique_report.dimensions.is_empty() {
            BTreeMap::new()
        } else {
            dimension_scores
                .iter()
                .map(|d| (d.dimension.clone(), d.score))
                .collect()
        };
        let final_score = blend(&scores, &domain, &critique_map);
        let decision = decide(
            self.analyst.as_ref(),
            &DecisionInputs {
                summary: &summary,
                scores: &scores,
                critique: &critique_report,
                budget: &budget,
                final_score,
                domain: &domain,
            },
            &settings,
            retry,
        )
        .await
        .map_err(|err| (FINALIZE, err))?;
        let report = assemble_report(
            summary,
            &scores,
            &critique_report,
            dimension_scores,
            budget,
            decision,
            final_score,
            domain,
            plagiarism,
        );
        emitter
            .completed(FINALIZE, format!("Decision: {}", report.decision.decision))
            .await;

        Ok(report)
    }

    /// Runs the detector when configured; degrades to an UNKNOWN result
    /// instead of failing the run.
    async fn detect_plagiarism(&self, full_text: &str) -> PlagiarismResult {
        match &self.plagiarism {
            Some(detector) => match detector.detect(full_text).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(error = %err, "plagiarism detection failed");
                    PlagiarismResult::unknown(err.message)
                }
            },
            None => PlagiarismResult::unknown("No plagiarism detector configured."),
        }
    }

    async fn publish_failure(&self, session: &SessionId, ordinal: usize, err: &EvalError) {
        error!(session = %session, ordinal, error = %err, "evaluation run failed");
        let stage = StageRegistry::stage_or_synthetic(ordinal);
        let progress = progress_at(ordinal, StageRegistry::count());
        self.broadcaster
            .publish(
                session,
                SessionMessage::Stage(StageEvent::errored(
                    stage.key,
                    ordinal,
                    progress,
                    err.to_string(),
                )),
            )
            .await;
        self.broadcaster
            .publish(
                session,
                SessionMessage::Error {
                    message: err.to_string(),
                },
            )
            .await;
        self.broadcaster.close(session);
    }
}

struct StageEmitter<'a> {
    broadcaster: &'a StatusBroadcaster,
    session: &'a SessionId,
    total: usize,
}

impl StageEmitter<'_> {
    async fn started(&self, ordinal: usize) {
        let stage = StageRegistry::stage_or_synthetic(ordinal);
        debug!(session = %self.session, stage = %stage.key, "stage started");
        let event = StageEvent::new(
            stage.key,
            ordinal,
            StageStatus::Started,
            progress_at(ordinal, self.total),
            stage.label,
        );
        self.broadcaster
            .publish(self.session, SessionMessage::Stage(event))
            .await;
    }

    async fn completed(&self, ordinal: usize, message: impl Into<String>) {
        let stage = StageRegistry::stage_or_synthetic(ordinal);
        debug!(session = %self.session, stage = %stage.key, "stage completed");
        let event = StageEvent::completed(
            stage.key,
            ordinal,
            progress_at(ordinal + 1, self.total),
            message,
        );
        self.broadcaster
            .publish(self.session, SessionMessage::Stage(event))
            .await;
    }
}

/// Overall progress after `steps` of `total` stages, floor-rounded.
fn progress_at(steps: usize, total: usize) -> u8 {
    u8::try_from(steps * 100 / total.max(1)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_floor_rounded() {
        assert_eq!(progress_at(0, 8), 0);
        assert_eq!(progress_at(1, 8), 12);
        assert_eq!(progress_at(2, 8), 25);
        assert_eq!(progress_at(7, 8), 87);
        assert_eq!(progress_at(8, 8), 100);
    }

    #[test]
    fn test_progress_never_divides_by_zero() {
        assert_eq!(progress_at(0, 0), 0);
    }
}
