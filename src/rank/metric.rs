//! Group-contrast ranking metrics.

use crate::error::{GseaError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;
use std::str::FromStr;

/// Lower bound on metric denominators.
const MIN_DENOMINATOR: f64 = 1e-8;
/// Added to both group means before taking the log ratio.
const LOG2_PSEUDOCOUNT: f64 = 1e-6;

/// Metric used to rank features by group contrast (case vs reference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankMethod {
    /// (mean_case - mean_ref) / (sd_case + sd_ref)
    #[default]
    #[serde(rename = "signal2noise")]
    Signal2Noise,
    /// Welch t statistic.
    #[serde(rename = "t_test")]
    TTest,
    /// mean_case - mean_ref
    #[serde(rename = "diff_abundance")]
    DiffAbundance,
    /// log2(mean_case / mean_ref)
    #[serde(rename = "log2_ratio")]
    Log2Ratio,
}

impl RankMethod {
    /// Get the configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Signal2Noise => "signal2noise",
            Self::TTest => "t_test",
            Self::DiffAbundance => "diff_abundance",
            Self::Log2Ratio => "log2_ratio",
        }
    }

    /// Score one feature from its per-group values.
    ///
    /// Both slices must be non-empty. A feature whose groups have equal means
    /// scores exactly 0.
    pub fn score(&self, case: &[f64], reference: &[f64]) -> f64 {
        let (mean_case, sd_case) = mean_sd(case);
        let (mean_ref, sd_ref) = mean_sd(reference);

        if mean_case == mean_ref {
            return 0.0;
        }

        match self {
            Self::Signal2Noise => {
                (mean_case - mean_ref) / (sd_case + sd_ref).max(MIN_DENOMINATOR)
            }
            Self::TTest => {
                let se = (sd_case * sd_case / case.len() as f64
                    + sd_ref * sd_ref / reference.len() as f64)
                    .sqrt();
                (mean_case - mean_ref) / se.max(MIN_DENOMINATOR)
            }
            Self::DiffAbundance => mean_case - mean_ref,
            Self::Log2Ratio => {
                ((mean_case + LOG2_PSEUDOCOUNT) / (mean_ref + LOG2_PSEUDOCOUNT)).log2()
            }
        }
    }
}

impl fmt::Display for RankMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankMethod {
    type Err = GseaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "signal2noise" | "signal_to_noise" | "s2n" => Ok(Self::Signal2Noise),
            "t_test" | "ttest" => Ok(Self::TTest),
            "diff_abundance" | "diff_of_classes" => Ok(Self::DiffAbundance),
            "log2_ratio" | "log2_ratio_of_classes" => Ok(Self::Log2Ratio),
            other => Err(GseaError::InvalidParameter(format!(
                "Unknown rank method '{}' (expected signal2noise, t_test, diff_abundance or log2_ratio)",
                other
            ))),
        }
    }
}

/// Sample mean and standard deviation (n - 1); a single value has sd 0.
fn mean_sd(values: &[f64]) -> (f64, f64) {
    let mean = values.iter().mean();
    let sd = if values.len() > 1 {
        values.iter().std_dev()
    } else {
        0.0
    };
    (mean, sd)
}

/// Score every row of `data`, splitting columns by `is_case`.
pub(crate) fn feature_scores(data: &DMatrix<f64>, is_case: &[bool], method: RankMethod) -> Vec<f64> {
    let n_case = is_case.iter().filter(|&&c| c).count();
    let mut case = Vec::with_capacity(n_case);
    let mut reference = Vec::with_capacity(is_case.len() - n_case);

    (0..data.nrows())
        .map(|row| {
            case.clear();
            reference.clear();
            for (&value, &in_case) in data.row(row).iter().zip(is_case) {
                if in_case {
                    case.push(value);
                } else {
                    reference.push(value);
                }
            }
            method.score(&case, &reference)
        })
        .collect()
}
