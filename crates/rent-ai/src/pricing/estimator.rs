use serde::{Deserialize, Serialize};

use super::domain::PriceEstimate;
use super::service::PricingError;
use crate::model::{EnsembleRegressor, ModelState, PropertyFeatures};
use crate::rounding::round_to;

pub const DEFAULT_INTERVAL_SIGMA: f64 = 1.5;
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.85;
pub const DEFAULT_PRICE_FLOOR: f64 = 0.0001;

const PRICE_DECIMALS: i32 = 6;
const CONFIDENCE_DECIMALS: i32 = 2;

/// Knobs for the uncertainty band.
///
/// The band is `point ± sigma · std(member predictions)`: ensemble disagreement used as a
/// proxy for epistemic uncertainty. It is not a calibrated prediction interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalConfig {
    pub sigma: f64,
    pub fallback_confidence: f64,
    pub price_floor: f64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_INTERVAL_SIGMA,
            fallback_confidence: DEFAULT_FALLBACK_CONFIDENCE,
            price_floor: DEFAULT_PRICE_FLOOR,
        }
    }
}

/// Turns ensemble output into a rounded estimate with a confidence band.
#[derive(Debug, Clone, Default)]
pub struct PriceEstimator {
    config: IntervalConfig,
}

impl PriceEstimator {
    pub fn new(config: IntervalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IntervalConfig {
        &self.config
    }

    pub fn estimate<M>(
        &self,
        features: &PropertyFeatures,
        model: &M,
    ) -> Result<PriceEstimate, PricingError>
    where
        M: EnsembleRegressor + ?Sized,
    {
        if !model.is_trained() {
            return Err(PricingError::ModelNotReady {
                state: ModelState::Uninitialized,
            });
        }

        let point = model.predict(features);
        if !point.is_finite() {
            return Err(PricingError::Computation(format!(
                "ensemble returned a non-finite prediction ({point})"
            )));
        }

        let members = model.predict_per_member(features);
        let spread = population_std_dev(&members).ok_or_else(|| {
            PricingError::Computation(
                "ensemble member predictions are empty or non-finite".to_string(),
            )
        })?;

        let floor = self.config.price_floor;
        let half_width = self.config.sigma * spread;
        let suggested = round_to(point.max(floor), PRICE_DECIMALS);
        let min = round_to((point - half_width).max(floor), PRICE_DECIMALS);
        let max = round_to((point + half_width).max(suggested), PRICE_DECIMALS);

        let confidence = match model.held_out_r_squared() {
            Some(r2) if r2.is_finite() => round_to(r2.clamp(0.0, 1.0), CONFIDENCE_DECIMALS),
            _ => self.config.fallback_confidence,
        };

        Ok(PriceEstimate {
            suggested,
            min: min.min(suggested),
            max,
            confidence,
        })
    }

    /// Scale every price field by a zone multiplier and re-round. The floor applies again
    /// afterwards so a small multiplier cannot round a bound down to zero.
    pub fn apply_multiplier(&self, estimate: PriceEstimate, multiplier: f64) -> PriceEstimate {
        let floor = self.config.price_floor;
        let scale = |price: f64| round_to((price * multiplier).max(floor), PRICE_DECIMALS);
        let suggested = scale(estimate.suggested);

        PriceEstimate {
            suggested,
            min: scale(estimate.min).min(suggested),
            max: scale(estimate.max).max(suggested),
            confidence: estimate.confidence,
        }
    }
}

fn population_std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() || values.iter().any(|value| !value.is_finite()) {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn population_std_dev_divides_by_n() {
        let spread = population_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).expect("spread");
        assert_abs_diff_eq!(spread, 2.0, epsilon = 1e-12);
        assert!(population_std_dev(&[]).is_none());
        assert!(population_std_dev(&[1.0, f64::NAN]).is_none());
    }

    #[test]
    fn multiplier_scales_every_price_field() {
        let estimate = PriceEstimate {
            suggested: 0.1,
            min: 0.08,
            max: 0.12,
            confidence: 0.9,
        };

        let scaled = PriceEstimator::default().apply_multiplier(estimate, 1.5);
        assert_eq!(scaled.suggested, 0.15);
        assert_eq!(scaled.min, 0.12);
        assert_eq!(scaled.max, 0.18);
        assert_eq!(scaled.confidence, 0.9);
    }

    #[test]
    fn tiny_multiplier_keeps_prices_above_the_floor() {
        let estimate = PriceEstimate {
            suggested: 0.0002,
            min: 0.0001,
            max: 0.0003,
            confidence: 0.7,
        };

        let scaled = PriceEstimator::default().apply_multiplier(estimate, 0.001);
        assert_eq!(scaled.min, DEFAULT_PRICE_FLOOR);
        assert_eq!(scaled.suggested, DEFAULT_PRICE_FLOOR);
        assert_eq!(scaled.max, DEFAULT_PRICE_FLOOR);
        assert!(scaled.min > 0.0);
    }
}
