//! Numeric helpers shared by the learners and adapters

use rand::{Rng, distr::StandardUniform};

use crate::types::Features;

/// Logistic squash σ(z) = 1 / (1 + e^(−z)).
///
/// # Examples
///
/// ```
/// use meta_trace::utils::logistic;
///
/// assert!((logistic(0.0) - 0.5).abs() < 1e-12);
/// assert!(logistic(40.0) <= 1.0);
/// ```
pub fn logistic(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

/// Inverse of [`logistic`] for `p` in (0, 1).
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// One-hot feature vector of dimension `dim` with a 1 at `index`.
///
/// # Examples
///
/// ```
/// use meta_trace::utils::one_hot;
///
/// let x = one_hot(2, 4);
/// assert_eq!(x.as_slice(), &[0.0, 0.0, 1.0, 0.0]);
/// ```
pub fn one_hot(index: usize, dim: usize) -> Features {
    let mut x = Features::zeros(dim);
    if index < dim {
        x[index] = 1.0;
    }
    x
}

/// Weighted sampling from a probability row.
///
/// Returns the sampled index, or `None` for an empty row.
///
/// # Behavior
///
/// - If all weights are zero or negative, falls back to uniform selection
/// - The last positive entry is returned if the threshold never crosses zero
///   (floating-point slack when the row sums to slightly less than its total)
///
/// # Examples
///
/// ```
/// use rand::{SeedableRng, rngs::StdRng};
/// use meta_trace::utils::weighted_sample;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let sampled = weighted_sample(&mut rng, &[0.25, 0.5, 0.25]);
/// assert!(sampled.is_some());
/// ```
pub fn weighted_sample<R: Rng>(rng: &mut R, weights: &[f64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();

    if total <= 0.0 {
        return Some(rng.random_range(0..weights.len()));
    }

    let mut threshold = rng.sample::<f64, _>(StandardUniform) * total;

    for (index, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        if threshold < weight {
            return Some(index);
        }
        threshold -= weight;
    }

    weights.iter().rposition(|w| *w > 0.0)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn logistic_and_logit_are_inverse() {
        for p in [0.1, 0.5, 0.9, 0.731] {
            assert!((logistic(logit(p)) - p).abs() < 1e-12);
        }
    }

    #[test]
    fn logistic_is_stable_for_large_negative_inputs() {
        let value = logistic(-800.0);
        assert!(value.is_finite());
        assert!(value >= 0.0);
    }

    #[test]
    fn one_hot_out_of_range_is_zero() {
        let x = one_hot(7, 3);
        assert_eq!(x.sum(), 0.0);
    }

    #[test]
    fn test_weighted_sample_empty() {
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(weighted_sample(&mut rng, &[]), None);
    }

    #[test]
    fn test_weighted_sample_never_picks_zero_weight() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let index = weighted_sample(&mut rng, &[0.0, 1.0, 0.0]).unwrap();
            assert_eq!(index, 1);
        }
    }

    #[test]
    fn test_weighted_sample_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        for _ in 0..2000 {
            counts[weighted_sample(&mut rng, &[0.25, 0.5, 0.25]).unwrap()] += 1;
        }

        assert!(counts[1] > counts[0], "middle should appear more than left");
        assert!(counts[1] > counts[2], "middle should appear more than right");
        assert!(counts[0] > 0 && counts[2] > 0, "all items should appear");
    }

    #[test]
    fn test_weighted_sample_deterministic() {
        let weights = [0.3, 0.3, 0.4];

        let mut rng1 = StdRng::seed_from_u64(12345);
        let first: Vec<_> = (0..20)
            .map(|_| weighted_sample(&mut rng1, &weights))
            .collect();

        let mut rng2 = StdRng::seed_from_u64(12345);
        let second: Vec<_> = (0..20)
            .map(|_| weighted_sample(&mut rng2, &weights))
            .collect();

        assert_eq!(first, second);
    }
}
