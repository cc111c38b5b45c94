//! Feature ranking by a two-group contrast.
//!
//! Every method scores `case − reference`, so positive scores mark features
//! more abundant in the case group. The reference group defaults to the
//! alphabetically first level of the grouping column.

mod metric;

pub use metric::RankMethod;
pub(crate) use metric::feature_scores;

use crate::data::{AbundanceMatrix, Metadata};
use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// One entry of a ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    pub feature_id: String,
    pub score: f64,
}

/// Features sorted by descending score, ties broken by feature id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankedList {
    entries: Vec<RankedFeature>,
}

impl RankedList {
    /// Build a ranked list from unordered `(feature_id, score)` pairs.
    pub fn from_scores<I, S>(scores: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut entries: Vec<RankedFeature> = scores
            .into_iter()
            .map(|(id, score)| RankedFeature {
                feature_id: id.into(),
                score,
            })
            .collect();
        entries.sort_by(|a, b| compare_ranked(a.score, &a.feature_id, b.score, &b.feature_id));
        Self { entries }
    }

    /// Number of ranked features.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &RankedFeature> {
        self.entries.iter()
    }

    /// Entry at a rank position.
    pub fn get(&self, position: usize) -> Option<&RankedFeature> {
        self.entries.get(position)
    }

    /// Feature ids in rank order.
    pub fn feature_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.feature_id.as_str()).collect()
    }

    /// Scores in rank order.
    pub fn scores(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.score).collect()
    }

    /// Rank position of a feature.
    pub fn position(&self, feature_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.feature_id == feature_id)
    }
}

fn compare_ranked(score_a: f64, id_a: &str, score_b: f64, id_b: &str) -> Ordering {
    score_b.total_cmp(&score_a).then_with(|| id_a.cmp(id_b))
}

/// Two resolved groups and the per-sample assignment in matrix column order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupContrast {
    pub group_column: String,
    pub case_group: String,
    pub reference_group: String,
    /// `true` for samples in the case group, aligned with the matrix columns.
    pub is_case: Vec<bool>,
}

impl GroupContrast {
    /// Resolve the two groups of `group_column` for the samples in `abundance`.
    ///
    /// Fails with `MissingSample` if a matrix sample has no label, and with
    /// `InvalidGroup` unless exactly two labels are present.
    pub fn resolve(
        abundance: &AbundanceMatrix,
        metadata: &Metadata,
        group_column: &str,
        reference_group: Option<&str>,
    ) -> Result<Self> {
        let labels = metadata.group_labels(abundance.sample_ids(), group_column)?;
        let levels: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if levels.len() != 2 {
            return Err(GseaError::InvalidGroup {
                column: group_column.to_string(),
                found: levels.len(),
                levels,
            });
        }

        let reference = match reference_group {
            Some(r) if levels.iter().any(|l| l == r) => r.to_string(),
            Some(r) => {
                return Err(GseaError::InvalidParameter(format!(
                    "Reference group '{}' not found in column '{}' (levels: {})",
                    r,
                    group_column,
                    levels.join(", ")
                )))
            }
            None => levels[0].clone(),
        };
        let case = levels
            .into_iter()
            .find(|l| *l != reference)
            .unwrap_or_default();

        let is_case: Vec<bool> = labels.iter().map(|l| *l == case).collect();
        debug!(
            "Contrast on '{}': {} (n={}) vs reference {} (n={})",
            group_column,
            case,
            is_case.iter().filter(|&&c| c).count(),
            reference,
            is_case.iter().filter(|&&c| !c).count()
        );

        Ok(Self {
            group_column: group_column.to_string(),
            case_group: case,
            reference_group: reference,
            is_case,
        })
    }
}

/// Rank features by group contrast using the default reference group.
pub fn rank(
    abundance: &AbundanceMatrix,
    metadata: &Metadata,
    group_column: &str,
    method: RankMethod,
) -> Result<RankedList> {
    let contrast = GroupContrast::resolve(abundance, metadata, group_column, None)?;
    Ok(rank_with_contrast(abundance, &contrast, method))
}

/// Rank features against an already resolved contrast.
pub fn rank_with_contrast(
    abundance: &AbundanceMatrix,
    contrast: &GroupContrast,
    method: RankMethod,
) -> RankedList {
    let scores = feature_scores(abundance.data(), &contrast.is_case, method);
    RankedList::from_scores(abundance.feature_ids().iter().map(String::as_str).zip(scores))
}

/// Rank order of feature indices for precomputed scores.
///
/// `id_order[i]` is the alphabetical position of feature `i`, used for ties.
pub(crate) fn rank_order(scores: &[f64], id_order: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .total_cmp(&scores[a])
            .then_with(|| id_order[a].cmp(&id_order[b]))
    });
    order
}

/// Alphabetical position of each feature id.
pub(crate) fn id_order(feature_ids: &[String]) -> Vec<usize> {
    let mut sorted: Vec<usize> = (0..feature_ids.len()).collect();
    sorted.sort_by(|&a, &b| feature_ids[a].cmp(&feature_ids[b]));
    let mut order = vec![0; feature_ids.len()];
    for (pos, &idx) in sorted.iter().enumerate() {
        order[idx] = pos;
    }
    order
}
