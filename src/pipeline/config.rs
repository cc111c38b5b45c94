//! Analysis configuration.

use crate::correct::CorrectionMethod;
use crate::enrich::{NullConfig, PermutationType};
use crate::error::{GseaError, Result};
use crate::rank::RankMethod;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every option of an enrichment run, with defaults.
///
/// Missing YAML keys take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GseaConfig {
    /// Metadata column holding the two groups.
    pub group_column: String,
    /// Group treated as the baseline; defaults to the alphabetically first level.
    pub reference_group: Option<String>,
    pub rank_method: RankMethod,
    /// Minimum testable members per pathway (inclusive).
    pub min_size: usize,
    /// Maximum testable members per pathway (inclusive).
    pub max_size: usize,
    pub n_permutations: usize,
    pub p_adjust_method: CorrectionMethod,
    /// Exponent applied to |score| for hit weights.
    pub weight_exponent: f64,
    pub seed: u64,
    pub permutation_type: PermutationType,
    /// Whether permutation rounds run in parallel.
    pub parallel: bool,
    /// Worker bound for permutation rounds; `None` uses all cores.
    pub threads: Option<usize>,
}

impl Default for GseaConfig {
    fn default() -> Self {
        Self {
            group_column: "group".to_string(),
            reference_group: None,
            rank_method: RankMethod::Signal2Noise,
            min_size: 10,
            max_size: 500,
            n_permutations: 1000,
            p_adjust_method: CorrectionMethod::BenjaminiHochberg,
            weight_exponent: 1.0,
            seed: 42,
            permutation_type: PermutationType::Phenotype,
            parallel: true,
            threads: None,
        }
    }
}

impl GseaConfig {
    /// Create a default configuration for a grouping column.
    pub fn new(group_column: &str) -> Self {
        Self {
            group_column: group_column.to_string(),
            ..Default::default()
        }
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(GseaError::from)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(GseaError::from)
    }

    /// Set the grouping column.
    pub fn with_group_column(mut self, column: &str) -> Self {
        self.group_column = column.to_string();
        self
    }

    /// Set the reference group.
    pub fn with_reference_group(mut self, group: &str) -> Self {
        self.reference_group = Some(group.to_string());
        self
    }

    /// Set the ranking metric.
    pub fn with_rank_method(mut self, method: RankMethod) -> Self {
        self.rank_method = method;
        self
    }

    /// Set pathway size bounds.
    pub fn with_size_bounds(mut self, min_size: usize, max_size: usize) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Set the number of permutations.
    pub fn with_permutations(mut self, n: usize) -> Self {
        self.n_permutations = n;
        self
    }

    /// Set the multiple-testing correction.
    pub fn with_p_adjust_method(mut self, method: CorrectionMethod) -> Self {
        self.p_adjust_method = method;
        self
    }

    /// Set the hit weight exponent.
    pub fn with_weight_exponent(mut self, p: f64) -> Self {
        self.weight_exponent = p;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the permutation type.
    pub fn with_permutation_type(mut self, permutation_type: PermutationType) -> Self {
        self.permutation_type = permutation_type;
        self
    }

    /// Bound the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Run permutation rounds sequentially.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check every option once before an analysis starts.
    pub fn validate(&self) -> Result<()> {
        if self.group_column.trim().is_empty() {
            return Err(GseaError::InvalidParameter(
                "group_column must not be empty".to_string(),
            ));
        }
        if self.min_size < 1 {
            return Err(GseaError::InvalidParameter(
                "min_size must be at least 1".to_string(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(GseaError::InvalidParameter(format!(
                "min_size ({}) must not exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }
        if self.n_permutations < 1 {
            return Err(GseaError::InsufficientPermutations(self.n_permutations));
        }
        if !self.weight_exponent.is_finite() || self.weight_exponent < 0.0 {
            return Err(GseaError::InvalidParameter(format!(
                "weight_exponent must be finite and non-negative, got {}",
                self.weight_exponent
            )));
        }
        if self.threads == Some(0) {
            return Err(GseaError::InvalidParameter(
                "threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Permutation settings for the null engine.
    pub fn null_config(&self) -> NullConfig {
        NullConfig {
            rank_method: self.rank_method,
            n_permutations: self.n_permutations,
            seed: self.seed,
            weight_exponent: self.weight_exponent,
            permutation_type: self.permutation_type,
            parallel: self.parallel,
            threads: self.threads,
        }
    }
}
