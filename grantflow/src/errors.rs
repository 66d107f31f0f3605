//! Error types for the grantflow evaluation pipeline.
//!
//! Only fatal errors unwind out of a pipeline run. Recoverable conditions
//! (malformed model output, missing budget data, delivery failures) are
//! absorbed and represented as data in the result.

use thiserror::Error;

/// The main error type for evaluation runs.
///
/// Every variant is fatal from the caller's perspective: a run that
/// surfaces an `EvalError` produced no decision payload.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The proposal document could not be extracted.
    #[error("Document extraction failed: {0}")]
    Extraction(String),

    /// Extraction succeeded but yielded no pages.
    #[error("Document extraction produced no pages")]
    EmptyDocument,

    /// The scoring collaborator returned a structure with no usable
    /// section keys at all.
    #[error("Scoring returned no usable section scores")]
    NoUsableScores,

    /// A collaborator call failed fatally (non-retryable, or retries
    /// exhausted) at the named stage.
    #[error("Collaborator failure at stage '{stage}': {message}")]
    Collaborator {
        /// The stage key where the failure occurred.
        stage: String,
        /// A human-readable failure message.
        message: String,
    },

    /// The run result could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EvalError {
    /// Creates a collaborator failure error for a stage.
    #[must_use]
    pub fn collaborator(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Error raised when an external collaborator call fails.
///
/// Carries a retryability marker so the retry wrapper can distinguish
/// transient failures (rate limits, temporary server errors) from
/// permanent ones.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    /// Human-readable failure description.
    pub message: String,
    /// Whether the failure is worth retrying.
    pub retryable: bool,
}

impl CollaboratorError {
    /// Creates a permanent (non-retryable) collaborator error.
    #[must_use]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a transient (retryable) collaborator error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }
}

/// Error raised when a stage ordinal falls outside the registry.
///
/// Callers substitute a synthetic stage rather than propagating this.
#[derive(Debug, Clone, Error)]
#[error("Stage ordinal {ordinal} out of range (registry holds {count} stages)")]
pub struct StageOutOfRange {
    /// The requested ordinal.
    pub ordinal: usize,
    /// The registry size.
    pub count: usize,
}

/// Error raised when delivery to a single observer fails.
///
/// Always swallowed by the broadcaster; the failing observer is dropped.
#[derive(Debug, Clone, Error)]
#[error("Observer delivery failed: {0}")]
pub struct DeliveryError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_markers() {
        let err = CollaboratorError::transient("rate limited");
        assert!(err.retryable);

        let err = CollaboratorError::permanent("bad request");
        assert!(!err.retryable);
    }

    #[test]
    fn test_eval_error_display() {
        let err = EvalError::collaborator("critique", "model unavailable");
        assert!(err.to_string().contains("critique"));
        assert!(err.to_string().contains("model unavailable"));
    }

    #[test]
    fn test_stage_out_of_range_display() {
        let err = StageOutOfRange { ordinal: 9, count: 8 };
        assert!(err.to_string().contains('9'));
        assert!(err.to_string().contains('8'));
    }
}
