//! Weighted running-sum enrichment score.
//!
//! Walking the ranked list from the top, a hit raises the running sum by
//! `|score|^p / N_R` and a miss lowers it by `1 / N_miss`. The running value
//! at position `i` is evaluated as `hit_cum(i) / N_R - miss_cum(i) / N_miss`,
//! so the walk ends at exactly 0. When every ranked feature is a member the
//! miss side becomes the uniform background over all positions.
//!
//! The enrichment score is the running value with the largest absolute
//! deviation from zero; the first occurrence wins on ties.

use crate::rank::RankedList;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Enrichment score of one pathway against a ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentScore {
    /// Signed maximum deviation; positive for a peak, negative for a trough.
    pub es: f64,
    /// Members at the enriched end of the list, in ranked order.
    pub leading_edge: Vec<String>,
    /// Rank position of the peak (or trough). `None` when the walk never
    /// leaves zero.
    pub peak_index: Option<usize>,
}

/// Running-sum curve for enrichment plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentCurve {
    /// Rank positions, `0..n`.
    pub positions: Vec<usize>,
    /// Running value after each position.
    pub running_sum: Vec<f64>,
    /// Rank positions of pathway members.
    pub hit_indices: Vec<usize>,
    pub peak_index: Option<usize>,
    pub es: f64,
}

impl EnrichmentCurve {
    /// Compute the full curve of a pathway against a ranked list.
    pub fn compute(ranked: &RankedList, members: &BTreeSet<String>, weight_exponent: f64) -> Self {
        let hits = hit_positions(ranked, members);
        let scores = ranked.scores();
        let hit_scores: Vec<f64> = hits.iter().map(|&i| scores[i]).collect();
        let peak = walk_peak(&hits, &hit_scores, ranked.len(), weight_exponent);
        Self {
            positions: (0..ranked.len()).collect(),
            running_sum: running_values(&hits, &hit_scores, ranked.len(), weight_exponent),
            hit_indices: hits,
            peak_index: peak.position,
            es: peak.es,
        }
    }
}

/// Compute the enrichment score and leading edge of a pathway.
///
/// Members absent from the ranked list are ignored. With no hits the score
/// is 0 and the leading edge is empty.
///
/// # Arguments
/// * `ranked` - Ranked feature list
/// * `members` - Pathway member identifiers
/// * `weight_exponent` - `p`; 1 is standard weighted GSEA, 0 the unweighted KS walk
pub fn enrichment_score(
    ranked: &RankedList,
    members: &BTreeSet<String>,
    weight_exponent: f64,
) -> EnrichmentScore {
    let hits = hit_positions(ranked, members);
    let hit_scores: Vec<f64> = hits
        .iter()
        .filter_map(|&i| ranked.get(i).map(|e| e.score))
        .collect();
    let peak = walk_peak(&hits, &hit_scores, ranked.len(), weight_exponent);

    let leading_edge = leading_edge_positions(&hits, &peak)
        .iter()
        .filter_map(|&i| ranked.get(i).map(|e| e.feature_id.clone()))
        .collect();

    EnrichmentScore {
        es: peak.es,
        leading_edge,
        peak_index: peak.position,
    }
}

/// Running value after every rank position.
pub fn running_sum(ranked: &RankedList, members: &BTreeSet<String>, weight_exponent: f64) -> Vec<f64> {
    let hits = hit_positions(ranked, members);
    let scores = ranked.scores();
    let hit_scores: Vec<f64> = hits.iter().map(|&i| scores[i]).collect();
    running_values(&hits, &hit_scores, ranked.len(), weight_exponent)
}

fn hit_positions(ranked: &RankedList, members: &BTreeSet<String>) -> Vec<usize> {
    ranked
        .iter()
        .enumerate()
        .filter(|(_, e)| members.contains(&e.feature_id))
        .map(|(i, _)| i)
        .collect()
}

/// Extreme point of a walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Peak {
    pub es: f64,
    pub position: Option<usize>,
}

/// Hit positions of the leading edge for a computed peak.
pub(crate) fn leading_edge_positions(hits: &[usize], peak: &Peak) -> Vec<usize> {
    match peak.position {
        Some(pos) if peak.es >= 0.0 => hits.iter().copied().filter(|&h| h <= pos).collect(),
        Some(pos) => hits.iter().copied().filter(|&h| h >= pos).collect(),
        None => Vec::new(),
    }
}

/// Cumulative hit weights in walk order; the last element is `N_R`.
fn cumulative_weights(hit_scores: &[f64], weight_exponent: f64) -> Vec<f64> {
    let weight = |s: f64| {
        if weight_exponent == 0.0 {
            1.0
        } else if weight_exponent == 1.0 {
            s.abs()
        } else {
            s.abs().powf(weight_exponent)
        }
    };

    let mut cum = Vec::with_capacity(hit_scores.len());
    let mut total = 0.0;
    for &s in hit_scores {
        total += weight(s);
        cum.push(total);
    }
    if total == 0.0 {
        // All hit weights vanish; fall back to equal weights
        cum.iter_mut()
            .enumerate()
            .for_each(|(j, c)| *c = (j + 1) as f64);
    }
    cum
}

/// Locate the extreme of the walk from hit positions only.
///
/// `hits` must be ascending rank positions in `0..n`, with `hit_scores` the
/// matching ranking scores. Between hits the walk only descends, so troughs
/// sit on the miss just before a hit and peaks sit on hits.
pub(crate) fn walk_peak(hits: &[usize], hit_scores: &[f64], n: usize, weight_exponent: f64) -> Peak {
    let mut best = Peak {
        es: 0.0,
        position: None,
    };
    if hits.is_empty() || n == 0 {
        return best;
    }

    let cum = cumulative_weights(hit_scores, weight_exponent);
    let n_r = cum[cum.len() - 1];

    let mut consider = |value: f64, position: usize| {
        if value.abs() > best.es.abs() {
            best = Peak {
                es: value,
                position: Some(position),
            };
        }
    };

    if hits.len() == n {
        // Full membership: the miss side is uniform over all positions
        let n_miss = n as f64;
        for (i, &c) in cum.iter().enumerate() {
            consider(c / n_r - (i + 1) as f64 / n_miss, i);
        }
        return best;
    }

    let n_miss = (n - hits.len()) as f64;
    let mut prev_cum = 0.0;
    for (j, (&pos, &c)) in hits.iter().zip(&cum).enumerate() {
        let misses_before = (pos - j) as f64;
        if pos > 0 && (j == 0 || hits[j - 1] + 1 < pos) {
            consider(prev_cum / n_r - misses_before / n_miss, pos - 1);
        }
        consider(c / n_r - misses_before / n_miss, pos);
        prev_cum = c;
    }
    best
}

/// Running value at every rank position.
pub(crate) fn running_values(
    hits: &[usize],
    hit_scores: &[f64],
    n: usize,
    weight_exponent: f64,
) -> Vec<f64> {
    if hits.is_empty() {
        return vec![0.0; n];
    }
    let cum = cumulative_weights(hit_scores, weight_exponent);
    let n_r = cum[cum.len() - 1];
    let full = hits.len() == n;
    let n_miss = if full { n as f64 } else { (n - hits.len()) as f64 };

    let mut values = Vec::with_capacity(n);
    let mut next_hit = 0;
    let mut hit_cum = 0.0;
    let mut misses = 0usize;
    for pos in 0..n {
        let is_hit = next_hit < hits.len() && hits[next_hit] == pos;
        if is_hit {
            hit_cum = cum[next_hit];
            next_hit += 1;
        }
        if full || !is_hit {
            misses += 1;
        }
        values.push(hit_cum / n_r - misses as f64 / n_miss);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ranked(n: usize) -> RankedList {
        // f01 has the highest score
        RankedList::from_scores((1..=n).map(|i| (format!("f{:02}", i), (n - i) as f64 + 1.0)))
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_top_members_positive_es() {
        let r = ranked(10);
        let result = enrichment_score(&r, &set(&["f01", "f02", "f03"]), 1.0);
        assert_relative_eq!(result.es, 1.0, epsilon = 1e-12);
        assert_eq!(result.peak_index, Some(2));
        assert_eq!(result.leading_edge, vec!["f01", "f02", "f03"]);
    }

    #[test]
    fn test_bottom_members_negative_es() {
        let r = ranked(10);
        let result = enrichment_score(&r, &set(&["f09", "f10"]), 0.0);
        // trough right before the first hit: all 8 misses consumed
        assert_relative_eq!(result.es, -1.0, epsilon = 1e-12);
        assert_eq!(result.peak_index, Some(7));
        assert_eq!(result.leading_edge, vec!["f09", "f10"]);
    }

    #[test]
    fn test_unweighted_known_value() {
        let r = ranked(4);
        // hits at positions 0 and 2, misses at 1 and 3
        let result = enrichment_score(&r, &set(&["f01", "f03"]), 0.0);
        assert_relative_eq!(result.es, 0.5, epsilon = 1e-12);
        assert_eq!(result.peak_index, Some(0));
        assert_eq!(result.leading_edge, vec!["f01"]);
    }

    #[test]
    fn test_full_membership_unweighted_returns_to_zero() {
        let r = ranked(7);
        let all: BTreeSet<String> = r.feature_ids().into_iter().map(String::from).collect();
        let curve = running_sum(&r, &all, 0.0);
        assert_eq!(curve.len(), 7);
        assert_eq!(*curve.last().unwrap(), 0.0);
        assert!(curve.iter().all(|&v| v == 0.0));
        assert_eq!(enrichment_score(&r, &all, 0.0).es, 0.0);
    }

    #[test]
    fn test_running_sum_ends_at_zero() {
        let r = ranked(12);
        let curve = running_sum(&r, &set(&["f02", "f05", "f11"]), 1.0);
        assert_eq!(*curve.last().unwrap(), 0.0);
    }

    #[test]
    fn test_walk_peak_matches_running_values() {
        let r = ranked(15);
        let members = set(&["f02", "f03", "f07", "f12", "f14"]);
        for p in [0.0, 1.0, 2.0] {
            let curve = running_sum(&r, &members, p);
            let (pos, extreme) = curve
                .iter()
                .enumerate()
                .fold((0, 0.0f64), |acc, (i, &v)| if v.abs() > acc.1.abs() { (i, v) } else { acc });
            let result = enrichment_score(&r, &members, p);
            assert_relative_eq!(result.es, extreme, epsilon = 1e-12);
            assert_eq!(result.peak_index, Some(pos));
        }
    }

    #[test]
    fn test_no_hits() {
        let r = ranked(5);
        let result = enrichment_score(&r, &set(&["absent"]), 1.0);
        assert_eq!(result.es, 0.0);
        assert!(result.leading_edge.is_empty());
        assert_eq!(result.peak_index, None);
    }

    #[test]
    fn test_zero_scores_fall_back_to_equal_weights() {
        let r = RankedList::from_scores([("a", 0.0), ("b", 0.0), ("c", 0.0), ("d", 0.0)]);
        let result = enrichment_score(&r, &set(&["a", "b"]), 1.0);
        assert_relative_eq!(result.es, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_fields() {
        let r = ranked(6);
        let curve = EnrichmentCurve::compute(&r, &set(&["f01", "f04"]), 1.0);
        assert_eq!(curve.positions, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(curve.hit_indices, vec![0, 3]);
        assert_eq!(curve.running_sum.len(), 6);
        let peak = curve.peak_index.unwrap();
        assert_relative_eq!(curve.running_sum[peak], curve.es, epsilon = 1e-12);
    }
}
