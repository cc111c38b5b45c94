//! Pathway size filtering against the features present in an abundance matrix.
//!
//! A pathway is testable when the number of its members found in the matrix
//! lies within `[min_size, max_size]`. Untestable pathways are recorded as
//! exclusions, never reported as errors.

use crate::data::{AbundanceMatrix, PathwayDatabase};
use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A pathway resolved to matrix row indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestablePathway {
    pub id: String,
    /// Matrix rows of the members present in the abundance matrix, ascending.
    pub member_indices: Vec<usize>,
}

impl TestablePathway {
    /// Number of testable members.
    pub fn size(&self) -> usize {
        self.member_indices.len()
    }
}

/// Why a pathway was left out of testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    TooSmall,
    TooLarge,
}

/// A pathway that did not pass size filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedPathway {
    pub id: String,
    /// Members present in the abundance matrix.
    pub size: usize,
    pub reason: ExclusionReason,
}

/// Outcome of size filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathwayFilterResult {
    pub testable: Vec<TestablePathway>,
    pub excluded: Vec<ExcludedPathway>,
}

/// Filter pathways by the size of their overlap with the matrix features.
///
/// # Arguments
/// * `pathways` - Pathway membership database
/// * `abundance` - Matrix whose features define the testable universe
/// * `min_size` - Minimum overlap (inclusive)
/// * `max_size` - Maximum overlap (inclusive)
///
/// # Returns
/// Testable pathways in database order, plus the exclusions. Fails with
/// `EmptyPathwaySet` if nothing is testable.
pub fn filter_pathways(
    pathways: &PathwayDatabase,
    abundance: &AbundanceMatrix,
    min_size: usize,
    max_size: usize,
) -> Result<PathwayFilterResult> {
    if min_size > max_size {
        return Err(GseaError::InvalidParameter(format!(
            "min_size ({}) must not exceed max_size ({})",
            min_size, max_size
        )));
    }

    let mut result = PathwayFilterResult::default();
    for pathway in pathways.iter() {
        let mut member_indices: Vec<usize> = pathway
            .members
            .iter()
            .filter_map(|m| abundance.feature_index(m))
            .collect();
        member_indices.sort_unstable();
        let size = member_indices.len();

        let reason = if size < min_size.max(1) {
            Some(ExclusionReason::TooSmall)
        } else if size > max_size {
            Some(ExclusionReason::TooLarge)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                debug!(
                    "Excluding pathway {} ({} of {} members present, {:?})",
                    pathway.id,
                    size,
                    pathway.len(),
                    reason
                );
                result.excluded.push(ExcludedPathway {
                    id: pathway.id.clone(),
                    size,
                    reason,
                });
            }
            None => result.testable.push(TestablePathway {
                id: pathway.id.clone(),
                member_indices,
            }),
        }
    }

    if result.testable.is_empty() {
        return Err(GseaError::EmptyPathwaySet {
            min_size,
            max_size,
            n_pathways: pathways.len(),
        });
    }

    debug!(
        "{} of {} pathways pass size filtering [{}, {}]",
        result.testable.len(),
        pathways.len(),
        min_size,
        max_size
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Pathway;

    fn matrix(n_features: usize) -> AbundanceMatrix {
        let ids: Vec<String> = (1..=n_features).map(|i| format!("K{:05}", i)).collect();
        let rows: Vec<Vec<f64>> = (0..n_features).map(|i| vec![i as f64, 1.0]).collect();
        AbundanceMatrix::from_rows(ids, vec!["s1".into(), "s2".into()], &rows).unwrap()
    }

    fn members(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
        range.map(|i| format!("K{:05}", i)).collect()
    }

    #[test]
    fn test_small_pathway_excluded() {
        let db = PathwayDatabase::new(vec![
            Pathway::new("ko00010", members(1..=12)).unwrap(),
            // only 2 members present in the matrix
            Pathway::new("ko00020", vec!["K00001", "K00002", "K99999"]).unwrap(),
        ])
        .unwrap();

        let result = filter_pathways(&db, &matrix(20), 10, 500).unwrap();
        assert_eq!(result.testable.len(), 1);
        assert_eq!(result.testable[0].id, "ko00010");
        assert_eq!(result.testable[0].size(), 12);
        assert_eq!(result.excluded[0].id, "ko00020");
        assert_eq!(result.excluded[0].size, 2);
        assert_eq!(result.excluded[0].reason, ExclusionReason::TooSmall);
    }

    #[test]
    fn test_large_pathway_excluded() {
        let db = PathwayDatabase::new(vec![
            Pathway::new("big", members(1..=20)).unwrap(),
            Pathway::new("ok", members(1..=5)).unwrap(),
        ])
        .unwrap();

        let result = filter_pathways(&db, &matrix(20), 3, 10).unwrap();
        assert_eq!(result.testable[0].id, "ok");
        assert_eq!(result.excluded[0].reason, ExclusionReason::TooLarge);
    }

    #[test]
    fn test_bounds_inclusive() {
        let db = PathwayDatabase::new(vec![Pathway::new("p", members(1..=5)).unwrap()]).unwrap();
        let result = filter_pathways(&db, &matrix(10), 5, 5).unwrap();
        assert_eq!(result.testable.len(), 1);
        assert_eq!(result.testable[0].member_indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_nothing_testable_is_error() {
        let db = PathwayDatabase::new(vec![Pathway::new("p", vec!["X1", "X2"]).unwrap()]).unwrap();
        match filter_pathways(&db, &matrix(10), 1, 500) {
            Err(GseaError::EmptyPathwaySet { n_pathways, .. }) => assert_eq!(n_pathways, 1),
            other => panic!("expected EmptyPathwaySet, got {:?}", other),
        }
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let db = PathwayDatabase::new(vec![Pathway::new("p", members(1..=5)).unwrap()]).unwrap();
        assert!(matches!(
            filter_pathways(&db, &matrix(10), 10, 5),
            Err(GseaError::InvalidParameter(_))
        ));
    }
}
