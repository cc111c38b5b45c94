//! End-to-end enrichment runs.

use super::config::GseaConfig;
use crate::data::{AbundanceMatrix, GseaResultSet, Metadata, PathwayDatabase, RunInfo};
use crate::enrich::{
    enrichment_score, normalize_and_test, null_for_contrast, CancellationToken, ObservedScore,
};
use crate::error::Result;
use crate::filter::filter_pathways;
use crate::rank::{rank_with_contrast, GroupContrast};
use std::collections::BTreeSet;
use tracing::info;

/// Run a full enrichment analysis.
///
/// Stages: validate config → resolve groups → filter pathways → rank →
/// observed ES → permutation null → NES, p-values and correction.
pub fn run_gsea(
    abundance: &AbundanceMatrix,
    metadata: &Metadata,
    pathways: &PathwayDatabase,
    config: &GseaConfig,
) -> Result<GseaResultSet> {
    run_gsea_with_cancel(abundance, metadata, pathways, config, &CancellationToken::new())
}

/// Run a full enrichment analysis that can be cancelled between permutation rounds.
pub fn run_gsea_with_cancel(
    abundance: &AbundanceMatrix,
    metadata: &Metadata,
    pathways: &PathwayDatabase,
    config: &GseaConfig,
    cancel: &CancellationToken,
) -> Result<GseaResultSet> {
    config.validate()?;

    let contrast = GroupContrast::resolve(
        abundance,
        metadata,
        &config.group_column,
        config.reference_group.as_deref(),
    )?;
    let filtered = filter_pathways(pathways, abundance, config.min_size, config.max_size)?;
    info!(
        "Testing {} of {} pathways over {} features and {} samples ({} vs {})",
        filtered.testable.len(),
        pathways.len(),
        abundance.n_features(),
        abundance.n_samples(),
        contrast.case_group,
        contrast.reference_group
    );

    let ranked = rank_with_contrast(abundance, &contrast, config.rank_method);
    let feature_ids = abundance.feature_ids();
    let observed: Vec<ObservedScore> = filtered
        .testable
        .iter()
        .map(|pathway| {
            let members: BTreeSet<String> = pathway
                .member_indices
                .iter()
                .map(|&i| feature_ids[i].clone())
                .collect();
            let score = enrichment_score(&ranked, &members, config.weight_exponent);
            ObservedScore {
                pathway_id: pathway.id.clone(),
                es: score.es,
                size: pathway.size(),
                leading_edge: score.leading_edge,
            }
        })
        .collect();

    let null = null_for_contrast(
        abundance,
        &contrast,
        &filtered.testable,
        &config.null_config(),
        cancel,
    )?;
    let results = normalize_and_test(&observed, &null, config.p_adjust_method)?;

    let info = RunInfo {
        group_column: config.group_column.clone(),
        case_group: contrast.case_group,
        reference_group: contrast.reference_group,
        rank_method: config.rank_method,
        n_permutations: config.n_permutations,
        p_adjust_method: config.p_adjust_method,
        weight_exponent: config.weight_exponent,
        seed: config.seed,
        n_excluded: filtered.excluded.len(),
    };
    let result_set = GseaResultSet::new(info, results);
    info!(
        "Enrichment complete: {} pathways tested, {} significant at p_adjust < 0.05",
        result_set.len(),
        result_set.significant_at(0.05).len()
    );
    Ok(result_set)
}
