//! Data structures for pathway enrichment analysis.

mod abundance_matrix;
mod daa;
mod metadata;
mod pathway;
mod result;

pub use abundance_matrix::AbundanceMatrix;
pub use daa::{DaaResult, DaaResultSet, EffectDirection};
pub use metadata::{Metadata, Variable, VariableType};
pub use pathway::{Pathway, PathwayAnnotation, PathwayAnnotations, PathwayDatabase};
pub use result::{
    read_results_tsv, sort_by_significance, write_results_tsv, AnnotatedResult, Confidence,
    GseaResult, GseaResultSet, ResultSummary, RunInfo,
};
