//! Trend Statistics from Demand History

use crate::features::TrendInputs;
use crate::FeatureError;

/// Hourly values needed to fill the longest lag (previous day, same hour)
const HISTORY_WINDOW: usize = 24;

/// Rolling window length (hours)
const ROLLING_WINDOW: usize = 3;

impl TrendInputs {
    /// Compute the lag and rolling statistics from an hourly demand history.
    ///
    /// `history` is ordered oldest to newest and its last element is the
    /// demand of the hour immediately before the one being predicted.
    pub fn from_history(history: &[f64]) -> Result<Self, FeatureError> {
        let n = history.len();
        if n < HISTORY_WINDOW {
            return Err(FeatureError::InsufficientHistory {
                needed: HISTORY_WINDOW,
                actual: n,
            });
        }

        let recent = &history[n - ROLLING_WINDOW..];

        Ok(Self {
            lag_1: history[n - 1],
            lag_24: history[n - HISTORY_WINDOW],
            rolling_mean_3: mean(recent),
            rolling_std_3: sample_std_dev(recent),
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with an n-1 denominator
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let m2: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (m2 / (values.len() - 1) as f64).sqrt()
}
