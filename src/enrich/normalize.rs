//! NES normalization, empirical p-values and multiple-testing correction.

use super::null::NullDistributions;
use crate::correct::{correct, CorrectionMethod};
use crate::data::{sort_by_significance, GseaResult};
use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Observed enrichment of one pathway before significance testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedScore {
    pub pathway_id: String,
    pub es: f64,
    /// Testable member count.
    pub size: usize,
    pub leading_edge: Vec<String>,
}

/// Normalized score and empirical p-value of one pathway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScore {
    pub nes: f64,
    pub p_value: f64,
    /// Null values with the same sign as the observed ES.
    pub n_same_sign: usize,
}

/// Normalize one ES against its null distribution.
///
/// Null values `>= 0` are compared with a non-negative ES and values `< 0`
/// with a negative one. With no usable same-signed null values the p-value
/// is 1 and the NES is `±1` carrying the sign of the ES.
pub fn normalize_score(es: f64, null: &[f64]) -> NormalizedScore {
    let positive = es >= 0.0;
    let same_sign: Vec<f64> = null
        .iter()
        .copied()
        .filter(|&v| if positive { v >= 0.0 } else { v < 0.0 })
        .collect();

    let mean_abs = if same_sign.is_empty() {
        0.0
    } else {
        same_sign.iter().map(|v| v.abs()).sum::<f64>() / same_sign.len() as f64
    };

    if mean_abs == 0.0 {
        let nes = if es > 0.0 {
            1.0
        } else if es < 0.0 {
            -1.0
        } else {
            0.0
        };
        return NormalizedScore {
            nes,
            p_value: 1.0,
            n_same_sign: same_sign.len(),
        };
    }

    let n_extreme = same_sign
        .iter()
        .filter(|&&v| if positive { v >= es } else { v <= es })
        .count();

    NormalizedScore {
        nes: es / mean_abs,
        p_value: (n_extreme as f64 + 1.0) / (null.len() as f64 + 1.0),
        n_same_sign: same_sign.len(),
    }
}

/// Compute NES and p-values for every pathway and correct across all of them.
///
/// # Arguments
/// * `observed` - Observed scores of the tested pathways
/// * `null` - Null distributions covering every observed pathway
/// * `method` - Multiple-testing correction
///
/// # Returns
/// Results sorted by `p_adjust` ascending, then `|nes|` descending, then id.
pub fn normalize_and_test(
    observed: &[ObservedScore],
    null: &NullDistributions,
    method: CorrectionMethod,
) -> Result<Vec<GseaResult>> {
    let normalized: Vec<NormalizedScore> = observed
        .iter()
        .map(|obs| {
            let values = null.get(&obs.pathway_id).ok_or_else(|| {
                GseaError::InvalidParameter(format!(
                    "No null distribution for pathway '{}'",
                    obs.pathway_id
                ))
            })?;
            let score = normalize_score(obs.es, values);
            if score.n_same_sign == 0 {
                warn!(
                    "Pathway {} has no same-signed null values, reporting p = 1",
                    obs.pathway_id
                );
            }
            Ok(score)
        })
        .collect::<Result<_>>()?;

    let p_values: Vec<f64> = normalized.iter().map(|n| n.p_value).collect();
    let p_adjust = correct(&p_values, method);

    let mut results: Vec<GseaResult> = observed
        .iter()
        .zip(&normalized)
        .zip(p_adjust)
        .map(|((obs, norm), q)| {
            GseaResult::new(
                obs.pathway_id.clone(),
                obs.es,
                norm.nes,
                norm.p_value,
                q.max(norm.p_value).min(1.0),
                obs.size,
                obs.leading_edge.clone(),
            )
        })
        .collect();

    sort_by_significance(&mut results);
    Ok(results)
}
