//! Core domain model types for grantflow.
//!
//! This module contains the fundamental types used throughout the pipeline:
//! - The fixed stage registry and stage records
//! - Stage status and event types, session identifiers
//! - Report types: score bundles, critiques, budget evaluations, decisions

mod event;
mod report;
mod stage;
mod summary;

pub use event::{SessionId, SessionMessage, StageEvent, StageStatus};
pub use report::{
    BudgetEvaluation, BudgetFlag, BudgetLine, CritiqueIssue,
    CritiqueRecommendation, CritiqueReport, Decision, DecisionOutcome,
    DimensionCritique, DimensionScore, EvaluationReport, FullCritique,
    PlagiarismResult, ScoreBundle, ScoreDetail, SectionScore,
    SectionScoreEntry, spaced_section_name,
};
pub use stage::{Stage, StageRegistry};
pub use summary::{SectionSummary, SectionedSummary};
