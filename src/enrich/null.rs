//! Permutation null distributions of enrichment scores.
//!
//! # Algorithm
//!
//! 1. Seed a `ChaCha8Rng` per round from `(seed, stream = round)`
//! 2. Shuffle the sample group labels (or draw random same-size feature sets)
//! 3. Re-rank features and recompute ES for every testable pathway
//! 4. Merge rounds by permutation index
//!
//! A round's randomness depends only on the seed and its index, so the null
//! is bit-identical for any worker count.

use super::score::walk_peak;
use crate::data::{AbundanceMatrix, Metadata};
use crate::error::{GseaError, Result};
use crate::filter::TestablePathway;
use crate::rank::{feature_scores, id_order, rank_order, GroupContrast, RankMethod};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// What is randomized in each permutation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermutationType {
    /// Shuffle group labels across samples and re-rank.
    #[default]
    Phenotype,
    /// Keep the observed ranking and draw random same-size member sets.
    FeatureSet,
}

impl PermutationType {
    /// Get the configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Phenotype => "phenotype",
            Self::FeatureSet => "feature_set",
        }
    }
}

impl fmt::Display for PermutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PermutationType {
    type Err = GseaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "phenotype" => Ok(Self::Phenotype),
            "feature_set" | "gene_set" => Ok(Self::FeatureSet),
            other => Err(GseaError::InvalidParameter(format!(
                "Unknown permutation type '{}' (expected phenotype or feature_set)",
                other
            ))),
        }
    }
}

/// Cooperative cancellation flag shared with a running analysis.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; rounds already running finish first.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Configuration for null distribution construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullConfig {
    pub rank_method: RankMethod,
    /// Number of permutation rounds.
    pub n_permutations: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
    pub weight_exponent: f64,
    pub permutation_type: PermutationType,
    /// Whether to run rounds in parallel.
    pub parallel: bool,
    /// Worker bound; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            rank_method: RankMethod::default(),
            n_permutations: 1000,
            seed: 42,
            weight_exponent: 1.0,
            permutation_type: PermutationType::default(),
            parallel: true,
            threads: None,
        }
    }
}

impl NullConfig {
    /// Create a quick configuration for testing (fewer permutations).
    pub fn quick() -> Self {
        Self {
            n_permutations: 100,
            ..Default::default()
        }
    }
}

/// Null ES values per pathway, ordered by permutation index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NullDistributions {
    n_permutations: usize,
    values: BTreeMap<String, Vec<f64>>,
}

impl NullDistributions {
    /// Build from per-pathway value vectors of equal length.
    pub fn new(n_permutations: usize, values: BTreeMap<String, Vec<f64>>) -> Result<Self> {
        if let Some(v) = values.values().find(|v| v.len() != n_permutations) {
            return Err(GseaError::DimensionMismatch {
                expected: n_permutations,
                actual: v.len(),
            });
        }
        Ok(Self {
            n_permutations,
            values,
        })
    }

    /// Number of permutation rounds.
    pub fn n_permutations(&self) -> usize {
        self.n_permutations
    }

    /// Null values of one pathway.
    pub fn get(&self, pathway_id: &str) -> Option<&[f64]> {
        self.values.get(pathway_id).map(Vec::as_slice)
    }

    /// Number of pathways.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(pathway_id, null values)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Build phenotype-permutation null distributions.
///
/// # Arguments
/// * `abundance` - Abundance matrix
/// * `metadata` - Sample metadata
/// * `group_column` - Two-group column to permute
/// * `pathways` - Testable pathways (see [`crate::filter::filter_pathways`])
/// * `rank_method` - Ranking metric
/// * `n_permutations` - Number of rounds (at least 1)
/// * `seed` - Random seed
pub fn build_null(
    abundance: &AbundanceMatrix,
    metadata: &Metadata,
    group_column: &str,
    pathways: &[TestablePathway],
    rank_method: RankMethod,
    n_permutations: usize,
    seed: u64,
) -> Result<NullDistributions> {
    let config = NullConfig {
        rank_method,
        n_permutations,
        seed,
        ..Default::default()
    };
    build_null_with_config(
        abundance,
        metadata,
        group_column,
        pathways,
        &config,
        &CancellationToken::new(),
    )
}

/// Build null distributions with full control over the permutation run.
pub fn build_null_with_config(
    abundance: &AbundanceMatrix,
    metadata: &Metadata,
    group_column: &str,
    pathways: &[TestablePathway],
    config: &NullConfig,
    cancel: &CancellationToken,
) -> Result<NullDistributions> {
    let contrast = GroupContrast::resolve(abundance, metadata, group_column, None)?;
    null_for_contrast(abundance, &contrast, pathways, config, cancel)
}

/// Build null distributions against an already resolved contrast.
pub fn null_for_contrast(
    abundance: &AbundanceMatrix,
    contrast: &GroupContrast,
    pathways: &[TestablePathway],
    config: &NullConfig,
    cancel: &CancellationToken,
) -> Result<NullDistributions> {
    let n_permutations = config.n_permutations;
    if n_permutations < 1 {
        return Err(GseaError::InsufficientPermutations(n_permutations));
    }
    if contrast.is_case.len() != abundance.n_samples() {
        return Err(GseaError::DimensionMismatch {
            expected: abundance.n_samples(),
            actual: contrast.is_case.len(),
        });
    }

    info!(
        "Building {} null with {} permutations over {} pathways",
        config.permutation_type,
        n_permutations,
        pathways.len()
    );

    let rounds = Rounds::new(abundance, contrast, pathways, config);
    let completed = AtomicUsize::new(0);
    let run_round = |k: usize| -> Result<Vec<f64>> {
        if cancel.is_cancelled() {
            return Err(GseaError::Cancelled {
                completed: completed.load(Ordering::Relaxed),
                requested: n_permutations,
            });
        }
        let es = rounds.run(k);
        completed.fetch_add(1, Ordering::Relaxed);
        Ok(es)
    };

    let per_round: Vec<Vec<f64>> = match (config.parallel, config.threads) {
        (false, _) => (0..n_permutations).map(run_round).collect::<Result<_>>()?,
        (true, None) => (0..n_permutations)
            .into_par_iter()
            .map(run_round)
            .collect::<Result<_>>()?,
        (true, Some(threads)) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| {
                    GseaError::InvalidParameter(format!("Cannot build thread pool: {}", e))
                })?;
            pool.install(|| {
                (0..n_permutations)
                    .into_par_iter()
                    .map(run_round)
                    .collect::<Result<_>>()
            })?
        }
    };

    let mut values = BTreeMap::new();
    for (i, pathway) in pathways.iter().enumerate() {
        let null: Vec<f64> = per_round.iter().map(|round| round[i]).collect();
        values.insert(pathway.id.clone(), null);
    }
    debug!("Null distributions complete for {} pathways", values.len());

    NullDistributions::new(n_permutations, values)
}

/// Read-only state shared by all rounds.
struct Rounds<'a> {
    abundance: &'a AbundanceMatrix,
    contrast: &'a GroupContrast,
    pathways: &'a [TestablePathway],
    config: &'a NullConfig,
    id_order: Vec<usize>,
    /// Observed scores in rank order (feature-set permutation only).
    observed_ranked_scores: Vec<f64>,
}

impl<'a> Rounds<'a> {
    fn new(
        abundance: &'a AbundanceMatrix,
        contrast: &'a GroupContrast,
        pathways: &'a [TestablePathway],
        config: &'a NullConfig,
    ) -> Self {
        let id_order = id_order(abundance.feature_ids());
        let observed_ranked_scores = match config.permutation_type {
            PermutationType::Phenotype => Vec::new(),
            PermutationType::FeatureSet => {
                let scores =
                    feature_scores(abundance.data(), &contrast.is_case, config.rank_method);
                rank_order(&scores, &id_order)
                    .into_iter()
                    .map(|f| scores[f])
                    .collect()
            }
        };
        Self {
            abundance,
            contrast,
            pathways,
            config,
            id_order,
            observed_ranked_scores,
        }
    }

    fn rng(&self, round: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(round as u64);
        rng
    }

    fn run(&self, round: usize) -> Vec<f64> {
        match self.config.permutation_type {
            PermutationType::Phenotype => self.phenotype_round(round),
            PermutationType::FeatureSet => self.feature_set_round(round),
        }
    }

    fn phenotype_round(&self, round: usize) -> Vec<f64> {
        let mut labels = self.contrast.is_case.clone();
        labels.shuffle(&mut self.rng(round));

        let scores = feature_scores(self.abundance.data(), &labels, self.config.rank_method);
        let order = rank_order(&scores, &self.id_order);
        let mut position = vec![0; order.len()];
        for (pos, &feature) in order.iter().enumerate() {
            position[feature] = pos;
        }

        let n = order.len();
        let mut hits: Vec<(usize, f64)> = Vec::new();
        let mut hit_positions = Vec::new();
        let mut hit_scores = Vec::new();
        self.pathways
            .iter()
            .map(|pathway| {
                hits.clear();
                hits.extend(
                    pathway
                        .member_indices
                        .iter()
                        .map(|&f| (position[f], scores[f])),
                );
                hits.sort_unstable_by_key(|&(pos, _)| pos);
                hit_positions.clear();
                hit_scores.clear();
                for &(pos, score) in &hits {
                    hit_positions.push(pos);
                    hit_scores.push(score);
                }
                walk_peak(&hit_positions, &hit_scores, n, self.config.weight_exponent).es
            })
            .collect()
    }

    fn feature_set_round(&self, round: usize) -> Vec<f64> {
        let n = self.observed_ranked_scores.len();
        let mut positions: Vec<usize> = (0..n).collect();
        positions.shuffle(&mut self.rng(round));

        // Every pathway of size k shares the pseudo-set positions[..k]
        let mut by_size: HashMap<usize, f64> = HashMap::new();
        self.pathways
            .iter()
            .map(|pathway| {
                let k = pathway.size().min(n);
                *by_size.entry(k).or_insert_with(|| {
                    let mut hits = positions[..k].to_vec();
                    hits.sort_unstable();
                    let scores: Vec<f64> =
                        hits.iter().map(|&p| self.observed_ranked_scores[p]).collect();
                    walk_peak(&hits, &scores, n, self.config.weight_exponent).es
                })
            })
            .collect()
    }
}
