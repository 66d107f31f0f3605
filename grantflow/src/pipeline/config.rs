//! Per-run configuration.

use crate::collaborators::{IndexConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Configuration for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum allowed requested budget.
    pub max_budget: f64,
    /// Optional user-specified domain; bypasses auto-detection entirely.
    pub domain_override: Option<String>,
    /// Whether to run the plagiarism/compliance check.
    pub check_plagiarism: bool,
    /// Whether collaborators should use deterministic generation
    /// settings (temperature zero, single candidate).
    pub deterministic: bool,
    /// Retry policy for model calls.
    pub retry: RetryPolicy,
    /// Retrieval index configuration.
    pub index: IndexConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_budget: 50_000.0,
            domain_override: None,
            check_plagiarism: false,
            deterministic: true,
            retry: RetryPolicy::default(),
            index: IndexConfig::default(),
        }
    }
}

impl RunConfig {
    /// Creates a config with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum budget.
    #[must_use]
    pub fn with_max_budget(mut self, max_budget: f64) -> Self {
        self.max_budget = max_budget;
        self
    }

    /// Sets a user-specified domain override.
    #[must_use]
    pub fn with_domain_override(mut self, domain: impl Into<String>) -> Self {
        self.domain_override = Some(domain.into());
        self
    }

    /// Enables the plagiarism check.
    #[must_use]
    pub fn with_plagiarism_check(mut self, enabled: bool) -> Self {
        self.check_plagiarism = enabled;
        self
    }

    /// Sets whether model calls use deterministic generation settings.
    #[must_use]
    pub fn with_deterministic(mut self, enabled: bool) -> Self {
        self.deterministic = enabled;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::new();
        assert_eq!(config.max_budget, 50_000.0);
        assert!(config.domain_override.is_none());
        assert!(!config.check_plagiarism);
        assert!(config.deterministic);
    }

    #[test]
    fn test_builder_chain() {
        let config = RunConfig::new()
            .with_max_budget(75_000.0)
            .with_domain_override("AI / Computer Science")
            .with_plagiarism_check(true)
            .with_deterministic(false);
        assert_eq!(config.max_budget, 75_000.0);
        assert_eq!(config.domain_override.as_deref(), Some("AI / Computer Science"));
        assert!(config.check_plagiarism);
        assert!(!config.deterministic);
    }
}
