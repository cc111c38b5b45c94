//! Composable Gene Set Enrichment Analysis (GSEA) Library
//!
//! This library provides modular primitives for pathway-level enrichment
//! analysis of feature abundance tables (KO, EC or gene abundances across
//! samples), and for comparing enrichment results with differential
//! abundance analysis (DAA) results.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (AbundanceMatrix, Metadata, PathwayDatabase, Results)
//! - **rank**: Two-group feature ranking metrics
//! - **filter**: Pathway size filtering
//! - **enrich**: Running-sum enrichment scores, permutation nulls, normalization
//! - **correct**: Multiple testing correction (Benjamini-Hochberg and friends)
//! - **annotate**: Human-readable pathway names
//! - **compare**: GSEA versus DAA classification and set summaries
//! - **pipeline**: Configuration and end-to-end runs
//!
//! # Example
//!
//! ```no_run
//! use composable_gsea::prelude::*;
//!
//! // Load data
//! let abundance = AbundanceMatrix::from_tsv("abundance.tsv").unwrap();
//! let metadata = Metadata::from_tsv("metadata.tsv").unwrap();
//! let (pathways, names) = PathwayDatabase::from_gmt("pathways.gmt").unwrap();
//!
//! // Run enrichment
//! let config = GseaConfig::new("group")
//!     .with_rank_method(RankMethod::Signal2Noise)
//!     .with_permutations(1000)
//!     .with_seed(42);
//! let results = run_gsea(&abundance, &metadata, &pathways, &config).unwrap();
//! let annotated = annotate(&results.results, &names);
//!
//! // Compare against a DAA table
//! let daa = DaaResultSet::from_tsv("daa.tsv").unwrap();
//! let comparison = compare(&annotated, &daa.results, 0.05, ComparisonMode::Pairwise).unwrap();
//! println!("{}", comparison.summary);
//! ```

pub mod annotate;
pub mod compare;
pub mod correct;
pub mod data;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod rank;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::annotate::annotate;
    pub use crate::compare::{
        compare, Classification, ComparisonMode, ComparisonRecord, ComparisonResult,
        ComparisonSummary, IdentifierScheme, PathwayRecord, SchemeDetector, SchemeMismatch,
        SetIntersection, SetSummary,
    };
    pub use crate::correct::{correct, correct_bh, correct_bonferroni, correct_by, CorrectionMethod};
    pub use crate::data::{
        read_results_tsv, sort_by_significance, write_results_tsv, AbundanceMatrix,
        AnnotatedResult, Confidence, DaaResult, DaaResultSet, EffectDirection, GseaResult,
        GseaResultSet, Metadata, Pathway, PathwayAnnotation, PathwayAnnotations, PathwayDatabase,
        ResultSummary, RunInfo, Variable,
    };
    pub use crate::enrich::{
        build_null, build_null_with_config, enrichment_score, normalize_and_test,
        normalize_score, running_sum, CancellationToken, EnrichmentCurve, EnrichmentScore,
        NullConfig, NullDistributions, ObservedScore, PermutationType,
    };
    pub use crate::error::{GseaError, Result};
    pub use crate::filter::{
        filter_pathways, ExcludedPathway, ExclusionReason, PathwayFilterResult, TestablePathway,
    };
    pub use crate::pipeline::{run_gsea, run_gsea_with_cancel, GseaConfig};
    pub use crate::rank::{rank, rank_with_contrast, GroupContrast, RankMethod, RankedFeature, RankedList};
}
