//! The fixed stage registry.
//!
//! The pipeline always advances through the same eight stages in order.
//! The registry is pure data, defined once at process start and shared
//! read-only across runs.

use crate::errors::StageOutOfRange;
use serde::{Deserialize, Serialize};

/// An immutable record describing one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Unique short identifier (e.g., "summarize").
    pub key: String,
    /// Human-readable display label.
    pub label: String,
    /// 0-based position within the pipeline.
    pub ordinal: usize,
}

impl Stage {
    fn new(key: &str, label: &str, ordinal: usize) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            ordinal,
        }
    }
}

const STAGE_TABLE: [(&str, &str); 8] = [
    ("ingest", "Loading document"),
    ("domain-detect", "Detecting research domain"),
    ("summarize", "Generating structured summary"),
    ("score", "Scoring proposal sections"),
    ("critique", "Generating critique"),
    ("budget", "Analyzing budget"),
    ("compliance", "Running compliance checks"),
    ("finalize", "Finalizing decision"),
];

/// The ordered, fixed set of pipeline stages.
///
/// Read-only shared state; requires no locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageRegistry;

impl StageRegistry {
    /// Returns the number of stages.
    #[must_use]
    pub fn count() -> usize {
        STAGE_TABLE.len()
    }

    /// Returns the stage at the given ordinal.
    ///
    /// Out-of-range ordinals yield a [`StageOutOfRange`] error; callers
    /// substitute [`Self::synthetic`] rather than propagating it.
    pub fn stage_at(ordinal: usize) -> Result<Stage, StageOutOfRange> {
        STAGE_TABLE
            .get(ordinal)
            .map(|(key, label)| Stage::new(key, label, ordinal))
            .ok_or(StageOutOfRange {
                ordinal,
                count: STAGE_TABLE.len(),
            })
    }

    /// Returns a placeholder stage for an ordinal outside the registry.
    #[must_use]
    pub fn synthetic(ordinal: usize) -> Stage {
        Stage::new(&format!("stage-{ordinal}"), "Unknown stage", ordinal)
    }

    /// Returns the stage at the given ordinal, or a synthetic placeholder.
    #[must_use]
    pub fn stage_or_synthetic(ordinal: usize) -> Stage {
        Self::stage_at(ordinal).unwrap_or_else(|_| Self::synthetic(ordinal))
    }

    /// Returns all stages in pipeline order.
    #[must_use]
    pub fn all() -> Vec<Stage> {
        STAGE_TABLE
            .iter()
            .enumerate()
            .map(|(ordinal, (key, label))| Stage::new(key, label, ordinal))
            .collect()
    }
}
