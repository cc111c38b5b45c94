//! Reconciliation of GSEA results with differential abundance results.
//!
//! Both tables are joined on pathway id with an explicit full outer join.
//! Each id in the union is classified by whether it is significant
//! (`p_adjust < p_threshold`) in each table; an id absent from a table is not
//! significant there.

pub mod scheme;

pub use scheme::{IdentifierScheme, SchemeDetector};

use crate::data::{AnnotatedResult, DaaResult, EffectDirection, GseaResult};
use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// A result row keyed by pathway id.
pub trait PathwayRecord {
    fn pathway_id(&self) -> &str;
    fn p_adjust(&self) -> f64;
    fn direction(&self) -> EffectDirection;
}

impl PathwayRecord for GseaResult {
    fn pathway_id(&self) -> &str {
        &self.pathway_id
    }

    fn p_adjust(&self) -> f64 {
        self.p_adjust
    }

    fn direction(&self) -> EffectDirection {
        EffectDirection::from_effect(self.nes)
    }
}

impl PathwayRecord for AnnotatedResult {
    fn pathway_id(&self) -> &str {
        &self.result.pathway_id
    }

    fn p_adjust(&self) -> f64 {
        self.result.p_adjust
    }

    fn direction(&self) -> EffectDirection {
        self.result.direction()
    }
}

impl PathwayRecord for DaaResult {
    fn pathway_id(&self) -> &str {
        &self.pathway_id
    }

    fn p_adjust(&self) -> f64 {
        self.p_adjust
    }

    fn direction(&self) -> EffectDirection {
        self.effect_direction
    }
}

/// Shape of the set summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// Two sets: significant in GSEA, significant in DAA (Venn).
    #[default]
    Pairwise,
    /// Four directional sets: GSEA up/down, DAA up/down (UpSet).
    MultiSet,
}

impl FromStr for ComparisonMode {
    type Err = GseaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "pairwise" | "venn" => Ok(Self::Pairwise),
            "multi_set" | "multiset" | "upset" => Ok(Self::MultiSet),
            other => Err(GseaError::InvalidParameter(format!(
                "Unknown comparison mode '{}' (expected pairwise or multi_set)",
                other
            ))),
        }
    }
}

/// Significance bucket of one pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Both,
    GseaOnly,
    DaaOnly,
    Neither,
}

impl Classification {
    fn from_flags(gsea: bool, daa: bool) -> Self {
        match (gsea, daa) {
            (true, true) => Self::Both,
            (true, false) => Self::GseaOnly,
            (false, true) => Self::DaaOnly,
            (false, false) => Self::Neither,
        }
    }

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::GseaOnly => "gsea_only",
            Self::DaaOnly => "daa_only",
            Self::Neither => "neither",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the merged table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub pathway_id: String,
    pub classification: Classification,
    /// `None` when the pathway is absent from the GSEA table.
    pub gsea_p_adjust: Option<f64>,
    pub gsea_direction: Option<EffectDirection>,
    /// `None` when the pathway is absent from the DAA table.
    pub daa_p_adjust: Option<f64>,
    pub daa_direction: Option<EffectDirection>,
    /// Whether both tables report the same direction; `None` unless both
    /// report a direction.
    pub direction_agreement: Option<bool>,
}

/// Bucket counts of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub p_threshold: f64,
    /// Size of the identifier union.
    pub n_union: usize,
    pub n_gsea: usize,
    pub n_daa: usize,
    /// Identifiers present in both tables.
    pub n_shared: usize,
    pub both: usize,
    pub gsea_only: usize,
    pub daa_only: usize,
    pub neither: usize,
    /// Pathways in `Both` with matching directions.
    pub concordant: usize,
    /// Pathways in `Both` with opposite directions.
    pub discordant: usize,
}

impl ComparisonSummary {
    /// Count for one bucket.
    pub fn count(&self, classification: Classification) -> usize {
        match classification {
            Classification::Both => self.both,
            Classification::GseaOnly => self.gsea_only,
            Classification::DaaOnly => self.daa_only,
            Classification::Neither => self.neither,
        }
    }
}

impl fmt::Display for ComparisonSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GSEA vs DAA Comparison (p_adjust < {})", self.p_threshold)?;
        writeln!(f, "=========================================")?;
        writeln!(
            f,
            "Pathways: {} GSEA, {} DAA, {} shared, {} total",
            self.n_gsea, self.n_daa, self.n_shared, self.n_union
        )?;
        writeln!(f, "  Significant in both: {}", self.both)?;
        writeln!(f, "    concordant direction: {}", self.concordant)?;
        writeln!(f, "    discordant direction: {}", self.discordant)?;
        writeln!(f, "  GSEA only: {}", self.gsea_only)?;
        writeln!(f, "  DAA only: {}", self.daa_only)?;
        write!(f, "  Neither: {}", self.neither)
    }
}

/// Size of one set intersection (an UpSet bar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetIntersection {
    /// Names of the sets the members belong to, and to no other set.
    pub sets: Vec<String>,
    pub count: usize,
}

/// Set sizes and exclusive intersection counts for set-diagram rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSummary {
    pub mode: ComparisonMode,
    pub set_sizes: BTreeMap<String, usize>,
    /// Non-empty exclusive intersections, largest first.
    pub intersections: Vec<SetIntersection>,
}

/// Identifier schemes of two tables that share no ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeMismatch {
    pub gsea: IdentifierScheme,
    pub daa: IdentifierScheme,
}

/// Output of [`compare`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Merged records sorted by pathway id.
    pub records: Vec<ComparisonRecord>,
    pub summary: ComparisonSummary,
    pub sets: SetSummary,
    /// Present when the tables share no ids and use different schemes.
    pub scheme_mismatch: Option<SchemeMismatch>,
}

impl ComparisonResult {
    /// Classification of one pathway.
    pub fn classification(&self, pathway_id: &str) -> Option<Classification> {
        self.records
            .binary_search_by(|r| r.pathway_id.as_str().cmp(pathway_id))
            .ok()
            .map(|i| self.records[i].classification)
    }

    /// Pathway ids in one bucket.
    pub fn ids_in(&self, classification: Classification) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.classification == classification)
            .map(|r| r.pathway_id.as_str())
            .collect()
    }

    /// Write the merged records as TSV.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the full result as pretty JSON.
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Compare GSEA and DAA results by pathway id.
///
/// # Arguments
/// * `gsea` - GSEA results (plain or annotated)
/// * `daa` - DAA results in the same identifier space
/// * `p_threshold` - Significance threshold on `p_adjust`, in (0, 1]
/// * `mode` - Shape of the set summary
///
/// # Returns
/// Every id in the union classified into exactly one bucket. Tables that
/// share no ids are not an error; a scheme mismatch is logged and recorded.
pub fn compare<G, D>(
    gsea: &[G],
    daa: &[D],
    p_threshold: f64,
    mode: ComparisonMode,
) -> Result<ComparisonResult>
where
    G: PathwayRecord,
    D: PathwayRecord,
{
    if !(p_threshold > 0.0 && p_threshold <= 1.0) {
        return Err(GseaError::InvalidParameter(format!(
            "p_threshold must be in (0, 1], got {}",
            p_threshold
        )));
    }
    check_unique(gsea)?;
    check_unique(daa)?;

    let mut joined: BTreeMap<&str, (Option<&G>, Option<&D>)> = BTreeMap::new();
    for g in gsea {
        joined.entry(g.pathway_id()).or_default().0 = Some(g);
    }
    for d in daa {
        joined.entry(d.pathway_id()).or_default().1 = Some(d);
    }

    let records: Vec<ComparisonRecord> = joined
        .iter()
        .map(|(&id, (g, d))| {
            let gsea_sig = g.map_or(false, |g| g.p_adjust() < p_threshold);
            let daa_sig = d.map_or(false, |d| d.p_adjust() < p_threshold);
            let gsea_direction = g.map(|g| g.direction());
            let daa_direction = d.map(|d| d.direction());
            ComparisonRecord {
                pathway_id: id.to_string(),
                classification: Classification::from_flags(gsea_sig, daa_sig),
                gsea_p_adjust: g.map(|g| g.p_adjust()),
                gsea_direction,
                daa_p_adjust: d.map(|d| d.p_adjust()),
                daa_direction,
                direction_agreement: direction_agreement(gsea_direction, daa_direction),
            }
        })
        .collect();

    let n_shared = joined.values().filter(|(g, d)| g.is_some() && d.is_some()).count();
    let count = |c: Classification| records.iter().filter(|r| r.classification == c).count();
    let in_both = |agree: bool| {
        records
            .iter()
            .filter(|r| r.classification == Classification::Both)
            .filter(|r| r.direction_agreement == Some(agree))
            .count()
    };
    let summary = ComparisonSummary {
        p_threshold,
        n_union: records.len(),
        n_gsea: gsea.len(),
        n_daa: daa.len(),
        n_shared,
        both: count(Classification::Both),
        gsea_only: count(Classification::GseaOnly),
        daa_only: count(Classification::DaaOnly),
        neither: count(Classification::Neither),
        concordant: in_both(true),
        discordant: in_both(false),
    };

    let scheme_mismatch = if n_shared == 0 && !gsea.is_empty() && !daa.is_empty() {
        detect_mismatch(gsea, daa)?
    } else {
        None
    };

    info!(
        "Compared {} GSEA and {} DAA pathways: {} both, {} GSEA only, {} DAA only, {} neither",
        summary.n_gsea, summary.n_daa, summary.both, summary.gsea_only, summary.daa_only, summary.neither
    );

    let sets = set_summary(&records, p_threshold, mode);
    Ok(ComparisonResult {
        records,
        summary,
        sets,
        scheme_mismatch,
    })
}

fn check_unique<R: PathwayRecord>(records: &[R]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for r in records {
        if !seen.insert(r.pathway_id()) {
            return Err(GseaError::DuplicateIdentifier(r.pathway_id().to_string()));
        }
    }
    Ok(())
}

fn direction_agreement(
    gsea: Option<EffectDirection>,
    daa: Option<EffectDirection>,
) -> Option<bool> {
    match (gsea?, daa?) {
        (EffectDirection::Unchanged, _) | (_, EffectDirection::Unchanged) => None,
        (g, d) => Some(g == d),
    }
}

fn detect_mismatch<G: PathwayRecord, D: PathwayRecord>(
    gsea: &[G],
    daa: &[D],
) -> Result<Option<SchemeMismatch>> {
    let detector = SchemeDetector::new()?;
    let gsea_scheme = detector.dominant(gsea.iter().map(|r| r.pathway_id()));
    let daa_scheme = detector.dominant(daa.iter().map(|r| r.pathway_id()));

    match (gsea_scheme, daa_scheme) {
        (Some(g), Some(d)) if g != d => {
            warn!(
                "GSEA ids look like {} but DAA ids look like {}; no pathways overlap",
                g, d
            );
            Ok(Some(SchemeMismatch { gsea: g, daa: d }))
        }
        _ => {
            warn!("GSEA and DAA results share no pathway ids");
            Ok(None)
        }
    }
}

const GSEA_SET: &str = "GSEA";
const DAA_SET: &str = "DAA";
const GSEA_UP: &str = "GSEA_up";
const GSEA_DOWN: &str = "GSEA_down";
const DAA_UP: &str = "DAA_up";
const DAA_DOWN: &str = "DAA_down";

fn set_summary(records: &[ComparisonRecord], p_threshold: f64, mode: ComparisonMode) -> SetSummary {
    let memberships: Vec<Vec<&'static str>> = records
        .iter()
        .map(|r| {
            let gsea_sig = r.gsea_p_adjust.map_or(false, |p| p < p_threshold);
            let daa_sig = r.daa_p_adjust.map_or(false, |p| p < p_threshold);
            let mut sets = Vec::new();
            match mode {
                ComparisonMode::Pairwise => {
                    if gsea_sig {
                        sets.push(GSEA_SET);
                    }
                    if daa_sig {
                        sets.push(DAA_SET);
                    }
                }
                ComparisonMode::MultiSet => {
                    if gsea_sig {
                        match r.gsea_direction {
                            Some(EffectDirection::Up) => sets.push(GSEA_UP),
                            Some(EffectDirection::Down) => sets.push(GSEA_DOWN),
                            _ => {}
                        }
                    }
                    if daa_sig {
                        match r.daa_direction {
                            Some(EffectDirection::Up) => sets.push(DAA_UP),
                            Some(EffectDirection::Down) => sets.push(DAA_DOWN),
                            _ => {}
                        }
                    }
                }
            }
            sets
        })
        .collect();

    let set_names: &[&str] = match mode {
        ComparisonMode::Pairwise => &[GSEA_SET, DAA_SET],
        ComparisonMode::MultiSet => &[GSEA_UP, GSEA_DOWN, DAA_UP, DAA_DOWN],
    };
    let set_sizes: BTreeMap<String, usize> = set_names
        .iter()
        .map(|&name| {
            let n = memberships.iter().filter(|m| m.contains(&name)).count();
            (name.to_string(), n)
        })
        .collect();

    let mut counts: BTreeMap<Vec<&str>, usize> = BTreeMap::new();
    for m in memberships.into_iter().filter(|m| !m.is_empty()) {
        *counts.entry(m).or_insert(0) += 1;
    }
    let mut intersections: Vec<SetIntersection> = counts
        .into_iter()
        .map(|(sets, count)| SetIntersection {
            sets: sets.into_iter().map(String::from).collect(),
            count,
        })
        .collect();
    intersections.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sets.cmp(&b.sets)));

    SetSummary {
        mode,
        set_sizes,
        intersections,
    }
}
