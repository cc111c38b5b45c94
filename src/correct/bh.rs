//! Benjamini-Hochberg and Benjamini-Yekutieli false discovery rate correction.

use std::cmp::Ordering;

/// Apply Benjamini-Hochberg FDR correction.
///
/// The BH procedure controls the false discovery rate (FDR) at level α.
/// For each p-value, the adjusted p-value (q-value) is calculated as:
/// q[i] = min(p[i] * n / rank[i], q[i+1])
///
/// # Arguments
/// * `p_values` - Raw p-values
///
/// # Returns
/// Adjusted p-values in the original order.
pub fn correct_bh(p_values: &[f64]) -> Vec<f64> {
    step_up(p_values, 1.0)
}

/// Apply Benjamini-Yekutieli FDR correction.
///
/// Same step-up procedure as BH, scaled by the harmonic number
/// c(n) = Σ 1/i, which keeps FDR control under arbitrary dependence
/// between tests (pathways sharing member features are dependent).
pub fn correct_by(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    let c_n: f64 = (1..=n).map(|i| 1.0 / i as f64).sum();
    step_up(p_values, c_n)
}

fn step_up(p_values: &[f64], scale: f64) -> Vec<f64> {
    let n = p_values.len();
    if n == 0 {
        return Vec::new();
    }

    // Create sorted index
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut q_sorted = vec![0.0; n];
    let n_f64 = n as f64;

    // Start from largest p-value
    q_sorted[n - 1] = (p_values[indices[n - 1]] * scale).min(1.0);

    // Work backwards
    for i in (0..n - 1).rev() {
        let rank = i + 1;
        let adjusted = p_values[indices[i]] * scale * n_f64 / rank as f64;
        q_sorted[i] = adjusted.min(q_sorted[i + 1]).min(1.0);
    }

    // Restore original order
    let mut q_values = vec![0.0; n];
    for (i, &orig_idx) in indices.iter().enumerate() {
        q_values[orig_idx] = q_sorted[i];
    }
    q_values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bh_ordering() {
        // P-values in non-sorted order
        let p_values = vec![0.04, 0.01, 0.03, 0.005];

        let q = correct_bh(&p_values);

        // Smallest p-value (0.005 at index 3): 0.005 * 4 / 1 = 0.02
        assert_relative_eq!(q[3], 0.02, epsilon = 1e-10);
        // Second smallest (0.01 at index 1): min(0.01 * 4 / 2, q[next]) = 0.02
        assert_relative_eq!(q[1], 0.02, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_monotonicity() {
        let p_values = vec![0.1, 0.001, 0.5, 0.02, 0.05, 0.01];
        let q = correct_bh(&p_values);

        let mut pairs: Vec<(f64, f64)> = p_values.iter().copied().zip(q).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for w in pairs.windows(2) {
            assert!(w[1].1 >= w[0].1);
        }
    }

    #[test]
    fn test_bh_bounded() {
        let p_values = vec![0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
        for (q, p) in correct_bh(&p_values).iter().zip(&p_values) {
            assert!(*q <= 1.0);
            assert!(*q >= *p);
        }
    }

    #[test]
    fn test_bh_empty_and_single() {
        assert!(correct_bh(&[]).is_empty());
        assert_relative_eq!(correct_bh(&[0.05])[0], 0.05, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_known_values() {
        // 5 tests, p = [0.005, 0.01, 0.02, 0.04, 0.1]
        let q = correct_bh(&[0.005, 0.01, 0.02, 0.04, 0.1]);

        // Rank 1: 0.005 * 5/1 = 0.025
        // Rank 2: 0.01 * 5/2 = 0.025
        // Rank 3: 0.02 * 5/3 = 0.0333
        // Rank 4: 0.04 * 5/4 = 0.05
        // Rank 5: 0.1 * 5/5 = 0.1
        assert_relative_eq!(q[0], 0.025, epsilon = 1e-10);
        assert_relative_eq!(q[1], 0.025, epsilon = 1e-10);
        assert_relative_eq!(q[2], 1.0 / 30.0, epsilon = 1e-10);
        assert_relative_eq!(q[3], 0.05, epsilon = 1e-10);
        assert_relative_eq!(q[4], 0.1, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_ties_share_adjusted_value() {
        let q = correct_bh(&[0.01, 0.01, 0.01]);
        assert_relative_eq!(q[0], 0.01, epsilon = 1e-12);
        assert_relative_eq!(q[1], 0.01, epsilon = 1e-12);
        assert_relative_eq!(q[2], 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_by_is_bh_times_harmonic_number() {
        let p = [0.005, 0.01, 0.02, 0.04];
        let bh = correct_bh(&p);
        let by = correct_by(&p);
        let c_n = 1.0 + 0.5 + 1.0 / 3.0 + 0.25;
        for (b, y) in bh.iter().zip(&by) {
            assert_relative_eq!(*y, (b * c_n).min(1.0), epsilon = 1e-10);
        }
    }
}
