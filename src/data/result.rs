//! Result types for pathway enrichment analysis.

use crate::correct::CorrectionMethod;
use crate::error::Result;
use crate::rank::RankMethod;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Confidence level based on statistical evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    /// Very high confidence (q < 0.001)
    VeryHigh,
    /// High confidence (q < 0.01)
    High,
    /// Moderate confidence (q < 0.05)
    Moderate,
    /// Low confidence (q < 0.10)
    Low,
    /// Suggestive (q < 0.20)
    Suggestive,
    /// Not significant
    NotSignificant,
}

impl Confidence {
    /// Classify based on adjusted p-value.
    pub fn from_qvalue(q: f64) -> Self {
        if q < 0.001 {
            Self::VeryHigh
        } else if q < 0.01 {
            Self::High
        } else if q < 0.05 {
            Self::Moderate
        } else if q < 0.10 {
            Self::Low
        } else if q < 0.20 {
            Self::Suggestive
        } else {
            Self::NotSignificant
        }
    }

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::VeryHigh => "very_high",
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::Suggestive => "suggestive",
            Self::NotSignificant => "not_significant",
        }
    }
}

/// Enrichment result for a single testable pathway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GseaResult {
    /// Pathway identifier.
    pub pathway_id: String,
    /// Enrichment score (signed maximum running-sum deviation).
    pub es: f64,
    /// Normalized enrichment score.
    pub nes: f64,
    /// Empirical permutation p-value.
    pub p_value: f64,
    /// Multiple-testing adjusted p-value.
    pub p_adjust: f64,
    /// Number of pathway members present in the abundance matrix.
    pub size: usize,
    /// Members driving the enrichment, in ranked order.
    pub leading_edge: Vec<String>,
    /// Confidence tier derived from `p_adjust`.
    pub confidence: Confidence,
}

impl GseaResult {
    /// Create a new result; the confidence tier is derived from `p_adjust`.
    pub fn new(
        pathway_id: String,
        es: f64,
        nes: f64,
        p_value: f64,
        p_adjust: f64,
        size: usize,
        leading_edge: Vec<String>,
    ) -> Self {
        Self {
            pathway_id,
            es,
            nes,
            p_value,
            p_adjust,
            size,
            leading_edge,
            confidence: Confidence::from_qvalue(p_adjust),
        }
    }

    /// Check if this result is significant at a custom threshold.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.p_adjust < alpha
    }
}

/// Order results by `p_adjust` ascending, then `|nes|` descending, then id.
pub fn sort_by_significance(results: &mut [GseaResult]) {
    results.sort_by(|a, b| {
        a.p_adjust
            .total_cmp(&b.p_adjust)
            .then_with(|| b.nes.abs().total_cmp(&a.nes.abs()))
            .then_with(|| a.pathway_id.cmp(&b.pathway_id))
    });
}

/// GSEA result extended with optional display annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedResult {
    #[serde(flatten)]
    pub result: GseaResult,
    /// Display name; `None` when the lookup had no entry.
    pub pathway_name: Option<String>,
    pub description: Option<String>,
}

impl AnnotatedResult {
    /// Wrap a result without annotation.
    pub fn unannotated(result: GseaResult) -> Self {
        Self {
            result,
            pathway_name: None,
            description: None,
        }
    }

    /// Label for display: the pathway name, or the id when no name is known.
    pub fn display_label(&self) -> &str {
        self.pathway_name
            .as_deref()
            .unwrap_or(&self.result.pathway_id)
    }
}

/// Provenance of an enrichment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub group_column: String,
    /// Group whose higher abundance yields positive scores.
    pub case_group: String,
    pub reference_group: String,
    pub rank_method: RankMethod,
    pub n_permutations: usize,
    pub p_adjust_method: CorrectionMethod,
    pub weight_exponent: f64,
    pub seed: u64,
    /// Pathways excluded by the size filter.
    pub n_excluded: usize,
}

/// Collection of GSEA results from one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GseaResultSet {
    pub info: RunInfo,
    /// Results sorted by significance.
    pub results: Vec<GseaResult>,
}

impl GseaResultSet {
    /// Create a new result set. Results are re-sorted by significance.
    pub fn new(info: RunInfo, mut results: Vec<GseaResult>) -> Self {
        sort_by_significance(&mut results);
        Self { info, results }
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Look up a result by pathway id.
    pub fn get(&self, pathway_id: &str) -> Option<&GseaResult> {
        self.results.iter().find(|r| r.pathway_id == pathway_id)
    }

    /// Get significant results at a custom threshold.
    pub fn significant_at(&self, alpha: f64) -> Vec<&GseaResult> {
        self.results
            .iter()
            .filter(|r| r.is_significant_at(alpha))
            .collect()
    }

    /// Count significant results at various thresholds.
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            total: self.len(),
            excluded: self.info.n_excluded,
            significant_001: self.results.iter().filter(|r| r.p_adjust < 0.001).count(),
            significant_01: self.results.iter().filter(|r| r.p_adjust < 0.01).count(),
            significant_05: self.results.iter().filter(|r| r.p_adjust < 0.05).count(),
            significant_10: self.results.iter().filter(|r| r.p_adjust < 0.10).count(),
            n_positive: self.results.iter().filter(|r| r.nes > 0.0).count(),
            n_negative: self.results.iter().filter(|r| r.nes < 0.0).count(),
        }
    }

    /// Write results to a TSV file (no annotation columns filled).
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let annotated: Vec<AnnotatedResult> = self
            .results
            .iter()
            .cloned()
            .map(AnnotatedResult::unannotated)
            .collect();
        write_results_tsv(path, &annotated)
    }

    /// Iterate over results.
    pub fn iter(&self) -> impl Iterator<Item = &GseaResult> {
        self.results.iter()
    }
}

/// One line of the results table; field order is the column contract.
#[derive(Serialize)]
struct ResultRecord<'a> {
    pathway_id: &'a str,
    pathway_name: &'a str,
    description: &'a str,
    es: f64,
    nes: f64,
    p_value: f64,
    p_adjust: f64,
    size: usize,
    leading_edge: String,
    confidence: &'static str,
}

/// Write (annotated) results in the stable column layout consumed by plotting tools.
///
/// Fields containing tabs, quotes or newlines are quoted, so
/// [`read_results_tsv`] reads back exactly what was written.
pub fn write_results_tsv<P: AsRef<Path>>(path: P, results: &[AnnotatedResult]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;

    for a in results {
        let r = &a.result;
        writer.serialize(ResultRecord {
            pathway_id: &r.pathway_id,
            pathway_name: a.pathway_name.as_deref().unwrap_or(""),
            description: a.description.as_deref().unwrap_or(""),
            es: r.es,
            nes: r.nes,
            p_value: r.p_value,
            p_adjust: r.p_adjust,
            size: r.size,
            leading_edge: r.leading_edge.join(","),
            confidence: r.confidence.name(),
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    pathway_id: String,
    #[serde(default)]
    pathway_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    es: f64,
    nes: f64,
    p_value: f64,
    p_adjust: f64,
    size: usize,
    #[serde(default)]
    leading_edge: Option<String>,
}

/// Read results previously written by [`write_results_tsv`].
pub fn read_results_tsv<P: AsRef<Path>>(path: P) -> Result<Vec<AnnotatedResult>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?;

    let mut results = Vec::new();
    for row in reader.deserialize() {
        let row: ResultRow = row?;
        let leading_edge = row
            .leading_edge
            .map(|le| {
                le.split(',')
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        results.push(AnnotatedResult {
            result: GseaResult::new(
                row.pathway_id,
                row.es,
                row.nes,
                row.p_value,
                row.p_adjust,
                row.size,
                leading_edge,
            ),
            pathway_name: row.pathway_name.filter(|s| !s.is_empty()),
            description: row.description.filter(|s| !s.is_empty()),
        });
    }
    Ok(results)
}

/// Summary statistics for a result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total: usize,
    pub excluded: usize,
    pub significant_001: usize,
    pub significant_01: usize,
    pub significant_05: usize,
    pub significant_10: usize,
    pub n_positive: usize,
    pub n_negative: usize,
}

impl std::fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Pathways tested: {} ({} excluded by size)", self.total, self.excluded)?;
        writeln!(f, "Positive / negative NES: {} / {}", self.n_positive, self.n_negative)?;
        writeln!(f, "Significant at p.adj < 0.001: {}", self.significant_001)?;
        writeln!(f, "Significant at p.adj < 0.01:  {}", self.significant_01)?;
        writeln!(f, "Significant at p.adj < 0.05:  {}", self.significant_05)?;
        writeln!(f, "Significant at p.adj < 0.10:  {}", self.significant_10)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn result(id: &str, nes: f64, p: f64, q: f64) -> GseaResult {
        GseaResult::new(id.to_string(), nes / 2.0, nes, p, q, 12, vec!["K1".into(), "K2".into()])
    }

    fn info() -> RunInfo {
        RunInfo {
            group_column: "group".into(),
            case_group: "b".into(),
            reference_group: "a".into(),
            rank_method: RankMethod::Signal2Noise,
            n_permutations: 100,
            p_adjust_method: CorrectionMethod::BenjaminiHochberg,
            weight_exponent: 1.0,
            seed: 42,
            n_excluded: 3,
        }
    }

    #[test]
    fn test_confidence() {
        assert_eq!(Confidence::from_qvalue(0.0005), Confidence::VeryHigh);
        assert_eq!(Confidence::from_qvalue(0.005), Confidence::High);
        assert_eq!(Confidence::from_qvalue(0.03), Confidence::Moderate);
        assert_eq!(Confidence::from_qvalue(0.08), Confidence::Low);
        assert_eq!(Confidence::from_qvalue(0.15), Confidence::Suggestive);
        assert_eq!(Confidence::from_qvalue(0.30), Confidence::NotSignificant);
    }

    #[test]
    fn test_sort_order() {
        let set = GseaResultSet::new(
            info(),
            vec![
                result("p3", 1.2, 0.01, 0.04),
                result("p2", -2.0, 0.01, 0.02),
                result("p1", 1.5, 0.01, 0.02),
                result("p0", 1.5, 0.01, 0.02),
            ],
        );
        let ids: Vec<&str> = set.iter().map(|r| r.pathway_id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p0", "p1", "p3"]);
    }

    #[test]
    fn test_summary() {
        let set = GseaResultSet::new(
            info(),
            vec![
                result("a", 2.0, 0.0001, 0.0005),
                result("b", -1.5, 0.01, 0.02),
                result("c", 1.0, 0.1, 0.15),
            ],
        );
        let summary = set.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.excluded, 3);
        assert_eq!(summary.significant_001, 1);
        assert_eq!(summary.significant_05, 2);
        assert_eq!(summary.n_negative, 1);
    }

    #[test]
    fn test_display_label_falls_back_to_id() {
        let mut a = AnnotatedResult::unannotated(result("ko00010", 1.0, 0.1, 0.1));
        assert_eq!(a.display_label(), "ko00010");
        a.pathway_name = Some("Glycolysis".into());
        assert_eq!(a.display_label(), "Glycolysis");
    }

    #[test]
    fn test_tsv_roundtrip() {
        let set = GseaResultSet::new(info(), vec![result("ko00010", 1.8, 0.002, 0.01)]);
        let file = NamedTempFile::new().unwrap();
        set.to_tsv(file.path()).unwrap();

        let loaded = read_results_tsv(file.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].result.pathway_id, "ko00010");
        assert_eq!(loaded[0].result.leading_edge, vec!["K1", "K2"]);
        assert_eq!(loaded[0].pathway_name, None);
        assert!((loaded[0].result.nes - 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_tsv_roundtrip_keeps_quotes_and_tabs() {
        let mut a = AnnotatedResult::unannotated(result("ko00010", -1.25, 0.004, 0.02));
        a.pathway_name = Some("\"super\" pathway".into());
        a.description = Some("first part\tsecond part".into());
        let b = AnnotatedResult::unannotated(result("ko00020", 0.5, 0.3, 0.4));

        let file = NamedTempFile::new().unwrap();
        write_results_tsv(file.path(), &[a.clone(), b]).unwrap();
        let loaded = read_results_tsv(file.path()).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], a);
        assert_eq!(loaded[1].result.pathway_id, "ko00020");
        assert_eq!(loaded[1].pathway_name, None);
        assert_eq!(loaded[1].description, None);
    }
}
