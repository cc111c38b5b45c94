//! Enrichment statistics: running-sum scores, permutation nulls and
//! normalization.

pub mod normalize;
pub mod null;
pub mod score;

pub use normalize::{normalize_and_test, normalize_score, NormalizedScore, ObservedScore};
pub use null::{
    build_null, build_null_with_config, null_for_contrast, CancellationToken, NullConfig,
    NullDistributions, PermutationType,
};
pub use score::{enrichment_score, running_sum, EnrichmentCurve, EnrichmentScore};
