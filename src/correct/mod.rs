//! Multiple testing correction across all tested pathways.

pub mod bh;

pub use bh::{correct_bh, correct_by};

use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Multiple-testing correction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrectionMethod {
    /// Benjamini-Hochberg FDR.
    #[default]
    #[serde(rename = "BH", alias = "fdr")]
    BenjaminiHochberg,
    /// Benjamini-Yekutieli FDR under dependence.
    #[serde(rename = "BY")]
    BenjaminiYekutieli,
    /// Family-wise error rate, p * n.
    #[serde(rename = "bonferroni")]
    Bonferroni,
    /// Raw p-values are reported unchanged.
    #[serde(rename = "none")]
    None,
}

impl CorrectionMethod {
    /// Get the conventional short name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BenjaminiHochberg => "BH",
            Self::BenjaminiYekutieli => "BY",
            Self::Bonferroni => "bonferroni",
            Self::None => "none",
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CorrectionMethod {
    type Err = GseaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bh" | "fdr" | "benjamini-hochberg" => Ok(Self::BenjaminiHochberg),
            "by" | "benjamini-yekutieli" => Ok(Self::BenjaminiYekutieli),
            "bonferroni" => Ok(Self::Bonferroni),
            "none" => Ok(Self::None),
            other => Err(GseaError::InvalidParameter(format!(
                "Unknown p-value adjustment method '{}' (expected BH, BY, bonferroni or none)",
                other
            ))),
        }
    }
}

/// Apply a correction method; output is in the input order.
pub fn correct(p_values: &[f64], method: CorrectionMethod) -> Vec<f64> {
    match method {
        CorrectionMethod::BenjaminiHochberg => correct_bh(p_values),
        CorrectionMethod::BenjaminiYekutieli => correct_by(p_values),
        CorrectionMethod::Bonferroni => correct_bonferroni(p_values),
        CorrectionMethod::None => p_values.to_vec(),
    }
}

/// Bonferroni correction, clamped to 1.
pub fn correct_bonferroni(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len() as f64;
    p_values.iter().map(|&p| (p * n).min(1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_methods() {
        assert_eq!("BH".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::BenjaminiHochberg);
        assert_eq!("by".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::BenjaminiYekutieli);
        assert_eq!("Bonferroni".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::Bonferroni);
        assert_eq!("none".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::None);
        assert!("holm".parse::<CorrectionMethod>().is_err());
    }

    #[test]
    fn test_bonferroni() {
        let q = correct(&[0.01, 0.2, 0.5], CorrectionMethod::Bonferroni);
        assert_relative_eq!(q[0], 0.03, epsilon = 1e-12);
        assert_relative_eq!(q[1], 0.6, epsilon = 1e-12);
        assert_relative_eq!(q[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_none_is_identity() {
        let p = [0.3, 0.01];
        assert_eq!(correct(&p, CorrectionMethod::None), p.to_vec());
    }

    #[test]
    fn test_serde_names() {
        let yaml = serde_yaml::to_string(&CorrectionMethod::BenjaminiHochberg).unwrap();
        assert_eq!(yaml.trim(), "BH");
        let parsed: CorrectionMethod = serde_yaml::from_str("bonferroni").unwrap();
        assert_eq!(parsed, CorrectionMethod::Bonferroni);
    }
}
