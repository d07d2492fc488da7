//! Error metrics and cross-run aggregation

use serde::{Deserialize, Serialize};
use statrs::{
    distribution::{ContinuousCDF, StudentsT},
    statistics::Statistics,
};

use crate::{Error, Result};

/// `Σ d_i (w_i − v_i)²` with `d` normalised to sum to one.
///
/// # Examples
///
/// ```
/// use meta_trace::analysis::weighted_mse;
///
/// let mse = weighted_mse(&[1.0, 0.0], &[0.0, 0.0], &[1.0, 1.0]).unwrap();
/// assert!((mse - 0.5).abs() < 1e-12);
/// ```
pub fn weighted_mse(weights: &[f64], values: &[f64], distribution: &[f64]) -> Result<f64> {
    for (len, context) in [(values.len(), "true values"), (distribution.len(), "distribution")] {
        if len != weights.len() {
            return Err(Error::DimensionMismatch {
                expected: weights.len(),
                got: len,
                context: context.to_string(),
            });
        }
    }
    let mass: f64 = distribution.iter().sum();
    if mass <= 0.0 {
        return Err(Error::InvalidConfiguration {
            message: "distribution has no mass".to_string(),
        });
    }

    Ok(weights
        .iter()
        .zip(values)
        .zip(distribution)
        .map(|((w, v), d)| d * (w - v).powi(2))
        .sum::<f64>()
        / mass)
}

/// Cross-run statistics for one episode index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub episode: usize,
    pub runs: usize,
    pub mean: f64,
    pub std_error: f64,
    /// Half-width of the 95% Student-t confidence interval
    pub ci95: f64,
}

/// Aggregate a `runs × episodes` table column by column.
///
/// Rows shorter than the longest one simply do not contribute to the
/// missing episodes.
pub fn summarize(table: &[Vec<f64>]) -> Vec<EpisodeStats> {
    let episodes = table.iter().map(Vec::len).max().unwrap_or(0);

    (0..episodes)
        .map(|episode| {
            let column: Vec<f64> = table
                .iter()
                .filter_map(|row| row.get(episode).copied())
                .collect();
            episode_stats(episode, &column)
        })
        .collect()
}

fn episode_stats(episode: usize, column: &[f64]) -> EpisodeStats {
    let runs = column.len();
    let mean = column.iter().mean();
    if runs < 2 {
        return EpisodeStats {
            episode,
            runs,
            mean,
            std_error: 0.0,
            ci95: 0.0,
        };
    }

    let std_error = column.iter().std_dev() / (runs as f64).sqrt();
    let t = StudentsT::new(0.0, 1.0, (runs - 1) as f64)
        .map(|dist| dist.inverse_cdf(0.975))
        .unwrap_or(f64::NAN);

    EpisodeStats {
        episode,
        runs,
        mean,
        std_error,
        ci95: t * std_error,
    }
}

/// Mean of the last `window` entries of `series` (all of it if shorter).
pub fn tail_mean(series: &[f64], window: usize) -> f64 {
    let start = series.len().saturating_sub(window);
    series[start..].iter().mean()
}
