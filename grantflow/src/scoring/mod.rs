//! Adaptive scoring: domain weight tables and the score aggregator.

mod blend;
mod weights;

pub use blend::{blend, critique_average, derive_dimension_scores, CRITIQUE_DIMENSIONS};
pub use weights::{all_domains, domain_weights, section_weighted_score, DEFAULT_DOMAIN};
