use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Goodness-of-fit figures for one partition of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionScores {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl RegressionScores {
    /// Scores predictions against targets. Returns `None` for empty or mismatched input.
    pub fn compute(targets: &[f64], predictions: &[f64]) -> Option<Self> {
        if targets.is_empty() || targets.len() != predictions.len() {
            return None;
        }

        let n = targets.len() as f64;
        let mean = targets.iter().sum::<f64>() / n;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        let mut abs_err = 0.0;

        for (target, prediction) in targets.iter().zip(predictions) {
            let residual = target - prediction;
            ss_res += residual * residual;
            ss_tot += (target - mean) * (target - mean);
            abs_err += residual.abs();
        }

        // Constant targets: perfect fit scores 1, anything else 0.
        let r2 = if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        Some(Self {
            r2,
            rmse: (ss_res / n).sqrt(),
            mae: abs_err / n,
        })
    }
}

/// Summary recorded alongside each trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train: RegressionScores,
    pub test: Option<RegressionScores>,
    pub feature_importance: BTreeMap<String, f64>,
    pub samples_trained: usize,
    pub samples_held_out: usize,
    pub trained_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn perfect_predictions_score_one() {
        let targets = [1.0, 2.0, 3.0];
        let scores = RegressionScores::compute(&targets, &targets).expect("scores");
        assert_eq!(scores.r2, 1.0);
        assert_eq!(scores.rmse, 0.0);
        assert_eq!(scores.mae, 0.0);
    }

    #[test]
    fn mean_predictor_scores_zero() {
        let targets = [1.0, 2.0, 3.0];
        let predictions = [2.0, 2.0, 2.0];
        let scores = RegressionScores::compute(&targets, &predictions).expect("scores");
        assert_abs_diff_eq!(scores.r2, 0.0);
        assert_abs_diff_eq!(scores.mae, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scores.rmse, (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn empty_input_has_no_scores() {
        assert!(RegressionScores::compute(&[], &[]).is_none());
        assert!(RegressionScores::compute(&[1.0], &[]).is_none());
    }
}
