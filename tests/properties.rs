//! Property-based checks of the scoring and correction primitives.

use composable_gsea::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Scores for `n` features together with a membership mask.
fn scores_and_members(max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<bool>)> {
    (1..=max_len).prop_flat_map(|len| {
        (
            proptest::collection::vec(-5.0f64..5.0, len),
            proptest::collection::vec(any::<bool>(), len),
        )
    })
}

fn build(scores: &[f64], mask: &[bool]) -> (RankedList, BTreeSet<String>) {
    let ranked = RankedList::from_scores(
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| (format!("f{:03}", i), s)),
    );
    let members = mask
        .iter()
        .enumerate()
        .filter(|(_, m)| **m)
        .map(|(i, _)| format!("f{:03}", i))
        .collect();
    (ranked, members)
}

proptest! {
    #[test]
    fn es_is_bounded((scores, mask) in scores_and_members(60), p in prop_oneof![Just(0.0), Just(1.0), 0.0f64..2.0]) {
        let (ranked, members) = build(&scores, &mask);
        let score = enrichment_score(&ranked, &members, p);
        prop_assert!(score.es.abs() <= 1.0 + 1e-12);
        if members.is_empty() {
            prop_assert_eq!(score.es, 0.0);
            prop_assert!(score.leading_edge.is_empty());
        }
    }

    #[test]
    fn es_matches_running_sum_extreme((scores, mask) in scores_and_members(60)) {
        let (ranked, members) = build(&scores, &mask);
        let score = enrichment_score(&ranked, &members, 1.0);
        let curve = running_sum(&ranked, &members, 1.0);
        let extreme = curve.iter().fold(0.0f64, |best, &v| if v.abs() > best.abs() { v } else { best });
        prop_assert!((score.es.abs() - extreme.abs()).abs() < 1e-9);
    }

    #[test]
    fn leading_edge_is_subset_in_rank_order((scores, mask) in scores_and_members(60)) {
        let (ranked, members) = build(&scores, &mask);
        let score = enrichment_score(&ranked, &members, 1.0);
        prop_assert!(score.leading_edge.iter().all(|f| members.contains(f)));
        let positions: Vec<usize> = score
            .leading_edge
            .iter()
            .filter_map(|f| ranked.position(f))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn nes_sign_follows_es(es in -1.0f64..1.0, null in proptest::collection::vec(-1.0f64..1.0, 1..200)) {
        let norm = normalize_score(es, &null);
        prop_assert!(norm.p_value > 0.0 && norm.p_value <= 1.0);
        prop_assert!(norm.p_value >= 1.0 / (null.len() as f64 + 1.0));
        if es > 0.0 {
            prop_assert!(norm.nes > 0.0);
        } else if es < 0.0 {
            prop_assert!(norm.nes < 0.0);
        }
    }

    #[test]
    fn bh_is_monotone_and_bounded(p in proptest::collection::vec(0.0f64..=1.0, 1..100)) {
        let q = correct_bh(&p);
        prop_assert_eq!(q.len(), p.len());
        for i in 0..p.len() {
            prop_assert!(q[i] >= p[i] - 1e-15);
            prop_assert!(q[i] <= 1.0);
            for j in 0..p.len() {
                if p[i] <= p[j] {
                    prop_assert!(q[i] <= q[j] + 1e-15);
                }
            }
        }
    }
}
