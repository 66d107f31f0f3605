//! Session-oriented facade over the orchestrator.
//!
//! Transport handlers (HTTP upload, socket subscribe) talk to the
//! [`Evaluator`]: it assigns session ids, spawns runs as background
//! tasks, records outcomes for polling, and hands out subscription
//! channels for live stage events.

use crate::broadcast::{ChannelObserver, EventObserver};
use crate::core::{EvaluationReport, SessionId};
use crate::pipeline::{Orchestrator, RunConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info_span, Instrument};

/// The recorded outcome of one evaluation run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The run is still executing.
    Pending,
    /// The run finished with a report.
    Complete(Box<EvaluationReport>),
    /// The run failed; the message is caller-facing.
    Failed(String),
}

/// Owns the orchestrator and the per-session outcome table.
pub struct Evaluator {
    orchestrator: Arc<Orchestrator>,
    results: Arc<Mutex<HashMap<SessionId, RunOutcome>>>,
}

impl Evaluator {
    /// Wraps an orchestrator.
    #[must_use]
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            results: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the underlying orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Starts an evaluation run in the background and returns its
    /// session id.
    ///
    /// Callers subscribe to the session for live events (events emitted
    /// before the first subscriber arrives are buffered) and poll
    /// [`Self::result`] for the outcome.
    pub fn start_run(&self, document: PathBuf, config: RunConfig) -> SessionId {
        let session = SessionId::new();
        self.results
            .lock()
            .insert(session.clone(), RunOutcome::Pending);

        let orchestrator = Arc::clone(&self.orchestrator);
        let results = Arc::clone(&self.results);
        let task_session = session.clone();
        let span = info_span!("evaluation_run", session = %session);
        tokio::spawn(
            async move {
                let outcome = match orchestrator
                    .run(&task_session, &document, &config)
                    .await
                {
                    Ok(report) => RunOutcome::Complete(Box::new(report)),
                    Err(err) => RunOutcome::Failed(err.to_string()),
                };
                results.lock().insert(task_session, outcome);
            }
            .instrument(span),
        );

        session
    }

    /// Returns the current outcome for a session, if known.
    #[must_use]
    pub fn result(&self, session: &SessionId) -> Option<RunOutcome> {
        self.results.lock().get(session).cloned()
    }

    /// Opens a line-oriented subscription channel for a session.
    ///
    /// Each received string is one newline-terminated JSON message.
    pub async fn open_channel(&self, session: &SessionId) -> mpsc::UnboundedReceiver<String> {
        let (observer, rx) = ChannelObserver::new();
        self.orchestrator
            .broadcaster()
            .subscribe(session, Arc::new(observer) as Arc<dyn EventObserver>)
            .await;
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::StatusBroadcaster;
    use crate::testing::fixtures::{happy_analyst, immediate_config, make_pages};
    use crate::testing::mocks::{RecordingIndexState, StaticExtractor, StaticIndexBuilder};
    use std::path::Path;
    use std::time::Duration;

    fn evaluator() -> Evaluator {
        Evaluator::new(Orchestrator::new(
            Arc::new(StaticExtractor::new(make_pages())),
            Arc::new(StaticIndexBuilder::new(RecordingIndexState::new(Vec::new()))),
            Arc::new(happy_analyst()),
            Arc::new(StatusBroadcaster::new()),
        ))
    }

    async fn settled(evaluator: &Evaluator, session: &SessionId) -> RunOutcome {
        for _ in 0..200 {
            match evaluator.result(session) {
                Some(RunOutcome::Pending) | None => {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Some(outcome) => return outcome,
            }
        }
        panic!("run never settled");
    }

    #[tokio::test]
    async fn test_start_run_records_completion() {
        let evaluator = evaluator();
        let session = evaluator.start_run("proposal.pdf".into(), immediate_config());

        assert!(matches!(
            evaluator.result(&session),
            Some(RunOutcome::Pending | RunOutcome::Complete(_))
        ));

        match settled(&evaluator, &session).await {
            RunOutcome::Complete(report) => {
                assert_eq!(report.domain, "AI / Computer Science");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_run_records_message() {
        let evaluator = Evaluator::new(Orchestrator::new(
            Arc::new(StaticExtractor::failing("corrupt file")),
            Arc::new(StaticIndexBuilder::new(RecordingIndexState::new(Vec::new()))),
            Arc::new(happy_analyst()),
            Arc::new(StatusBroadcaster::new()),
        ));
        let session = evaluator.start_run("bad.pdf".into(), immediate_config());

        match settled(&evaluator, &session).await {
            RunOutcome::Failed(message) => assert!(message.contains("corrupt file")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_session_has_no_result() {
        let evaluator = evaluator();
        assert!(evaluator.result(&SessionId::new()).is_none());
    }

    #[tokio::test]
    async fn test_open_channel_streams_session_messages() {
        let evaluator = evaluator();
        let session = SessionId::new();
        let mut rx = evaluator.open_channel(&session).await;

        evaluator
            .orchestrator()
            .run(&session, Path::new("proposal.pdf"), &immediate_config())
            .await
            .unwrap();

        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        assert_eq!(lines.len(), 17);
        assert!(lines[16].contains(r#""type":"complete""#));
    }
}
