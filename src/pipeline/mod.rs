//! Configuration and execution of complete enrichment analyses.

mod config;
mod runner;

pub use config::GseaConfig;
pub use runner::{run_gsea, run_gsea_with_cancel};
