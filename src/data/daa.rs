//! Differential abundance results produced by an external DAA engine.
//!
//! Only the shape consumed by the comparison engine is modelled here; the
//! statistics themselves (ALDEx2, LinDA, DESeq2, ...) happen elsewhere.

use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Direction of a differential abundance effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDirection {
    Up,
    Down,
    Unchanged,
}

impl EffectDirection {
    /// Direction implied by the sign of an effect estimate.
    pub fn from_effect(effect: f64) -> Self {
        if effect > 0.0 {
            Self::Up
        } else if effect < 0.0 {
            Self::Down
        } else {
            Self::Unchanged
        }
    }

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Unchanged => "unchanged",
        }
    }
}

impl FromStr for EffectDirection {
    type Err = GseaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "increased" | "enriched" | "positive" | "+" => Ok(Self::Up),
            "down" | "decreased" | "depleted" | "negative" | "-" => Ok(Self::Down),
            "none" | "unchanged" | "0" | "" | "na" => Ok(Self::Unchanged),
            other => Err(GseaError::InvalidParameter(format!(
                "Unknown effect direction '{}'",
                other
            ))),
        }
    }
}

/// One row of a DAA result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaaResult {
    /// Pathway or feature identifier, same scheme as the GSEA pathway ids.
    pub pathway_id: String,
    pub p_value: f64,
    pub p_adjust: f64,
    pub effect_direction: EffectDirection,
    /// Effect estimate, when the producing engine reports one.
    pub log2_fold_change: Option<f64>,
    /// Name of the producing method (e.g. `ALDEx2_Welch's t test`).
    pub method: Option<String>,
}

impl DaaResult {
    /// Create a result with an explicit direction.
    pub fn new(
        pathway_id: impl Into<String>,
        p_value: f64,
        p_adjust: f64,
        effect_direction: EffectDirection,
    ) -> Self {
        Self {
            pathway_id: pathway_id.into(),
            p_value,
            p_adjust,
            effect_direction,
            log2_fold_change: None,
            method: None,
        }
    }

    /// Check if significant at a custom threshold.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.p_adjust < alpha
    }
}

/// Header names accepted for the adjusted p-value column.
const P_ADJUST_COLUMNS: [&str; 4] = ["p_adjust", "q_value", "p_adjusted", "padj"];

#[derive(Debug, Deserialize)]
struct DaaRow {
    #[serde(alias = "feature_id", alias = "feature")]
    pathway_id: String,
    #[serde(default, alias = "p_values", alias = "pvalue", deserialize_with = "csv::invalid_option")]
    p_value: Option<f64>,
    #[serde(default, alias = "q_value", alias = "p_adjusted", alias = "padj", deserialize_with = "csv::invalid_option")]
    p_adjust: Option<f64>,
    #[serde(default)]
    effect_direction: Option<String>,
    #[serde(default, alias = "log_2_fold_change", alias = "estimate", deserialize_with = "csv::invalid_option")]
    log2_fold_change: Option<f64>,
    #[serde(default)]
    method: Option<String>,
}

/// Collection of DAA results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaaResultSet {
    pub results: Vec<DaaResult>,
}

impl DaaResultSet {
    /// Create a new result set.
    pub fn new(results: Vec<DaaResult>) -> Self {
        Self { results }
    }

    /// Load a DAA result table from TSV.
    ///
    /// Recognised columns: `pathway_id` (or `feature_id`/`feature`),
    /// `p_value` (or `p_values`), `p_adjust` (or `q_value`/`p_adjusted`/`padj`),
    /// `effect_direction`, `log2_fold_change` (or `log_2_fold_change`/`estimate`)
    /// and `method`. When `effect_direction` is absent the direction is taken
    /// from the sign of the fold change. A table without any adjusted p-value
    /// column fails with `MissingColumn`; individual unparseable p-values
    /// become 1.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?;
        if !headers
            .iter()
            .any(|h| P_ADJUST_COLUMNS.iter().any(|c| *c == h.trim()))
        {
            return Err(GseaError::MissingColumn("p_adjust".to_string()));
        }

        let mut results = Vec::new();
        for (row_idx, row) in reader.deserialize().enumerate() {
            let row: DaaRow = row?;
            let effect_direction = match (&row.effect_direction, row.log2_fold_change) {
                (Some(d), _) if !d.trim().is_empty() => d.parse()?,
                (_, Some(lfc)) => EffectDirection::from_effect(lfc),
                _ => EffectDirection::Unchanged,
            };
            let p_adjust = row.p_adjust.filter(|p| p.is_finite()).unwrap_or_else(|| {
                warn!(
                    "DAA row {} ({}) has no usable adjusted p-value, treating as 1",
                    row_idx + 1,
                    row.pathway_id
                );
                1.0
            });
            results.push(DaaResult {
                pathway_id: row.pathway_id,
                p_value: row.p_value.filter(|p| p.is_finite()).unwrap_or(1.0),
                p_adjust,
                effect_direction,
                log2_fold_change: row.log2_fold_change,
                method: row.method.filter(|m| !m.is_empty()),
            });
        }

        if results.is_empty() {
            return Err(GseaError::EmptyData("No rows in DAA table".to_string()));
        }
        Ok(Self { results })
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Get significant results at a custom threshold.
    pub fn significant_at(&self, alpha: f64) -> Vec<&DaaResult> {
        self.results
            .iter()
            .filter(|r| r.is_significant_at(alpha))
            .collect()
    }

    /// Iterate over results.
    pub fn iter(&self) -> impl Iterator<Item = &DaaResult> {
        self.results.iter()
    }
}
