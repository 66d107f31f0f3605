//! # Grantflow
//!
//! A grant proposal evaluation pipeline with live stage broadcasting.
//!
//! Grantflow drives an ordered multi-stage evaluation workflow over an
//! uploaded proposal document, routing extracted text through a sequence of
//! external model calls and aggregating their outputs into a single report:
//!
//! - **Stage-based execution**: a fixed eight-stage pipeline from ingest to
//!   final decision
//! - **Live status broadcasting**: per-session publish/subscribe with
//!   buffering for late subscribers
//! - **Structured-output recovery**: bounded repair of malformed JSON
//!   returned by untrusted model calls
//! - **Adaptive scoring**: domain-weighted section scores blended with
//!   critique dimension scores
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use grantflow::prelude::*;
//!
//! let evaluator = Evaluator::new(orchestrator);
//! let session = evaluator.start_run("proposal.pdf".into(), RunConfig::new());
//!
//! let mut rx = evaluator.open_channel(&session).await;
//! while let Some(line) = rx.recv().await {
//!     println!("{line}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod broadcast;
pub mod collaborators;
pub mod core;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod recovery;
pub mod scoring;
pub mod service;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::broadcast::{ChannelObserver, EventObserver, StatusBroadcaster};
    pub use crate::collaborators::{
        AnalystModel, DocumentExtractor, IndexBuilder, ModelSettings, Page,
        PlagiarismDetector, RetrievalIndex, RetrievedChunk, RetryPolicy,
    };
    pub use crate::core::{
        BudgetEvaluation, CritiqueReport, Decision, DecisionOutcome,
        EvaluationReport, ScoreBundle, SectionedSummary, SessionId,
        SessionMessage, Stage, StageEvent, StageRegistry, StageStatus,
    };
    pub use crate::errors::EvalError;
    pub use crate::pipeline::{Orchestrator, RunConfig};
    pub use crate::recovery::{parse_or_repair, strip_wrapper, Recovered};
    pub use crate::scoring::{blend, section_weighted_score};
    pub use crate::service::{Evaluator, RunOutcome};
    pub use crate::utils::{generate_uuid, iso_timestamp};
}
