//! LOWESS smoothing on top of the `fastLowess` batch smoother.

use fastLowess::prelude::{Batch, Bisquare, Lowess as LowessBuilder, NoBoundary, Tricube};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::debug;

use crate::error::{Error, Result};
use crate::stats::describe::std_dev;
use crate::stats::pvalue::normal_critical;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IntervalType {
    /// Uncertainty of the fitted curve.
    #[default]
    #[strum(serialize = "confidence", serialize = "confidence_interval")]
    Confidence,
    /// Uncertainty of a new observation.
    #[strum(serialize = "prediction", serialize = "prediction_interval")]
    Prediction,
    /// Residual spread around the curve.
    #[strum(serialize = "sigma", serialize = "sigma_interval")]
    Sigma,
}

/// Smoother settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lowess {
    /// Share of the points in each local neighbourhood.
    pub fraction: f64,
    /// Total number of fits; every fit after the first is reweighted for robustness.
    pub iterations: usize,
}

impl Default for Lowess {
    fn default() -> Self {
        Self {
            fraction: 0.5,
            iterations: 1,
        }
    }
}

/// Result of a [`Lowess`] fit, in the input order.
#[derive(Clone, Debug, PartialEq)]
pub struct LowessFit {
    pub smoothed: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Lower and upper bounds, when an interval was requested.
    pub interval: Option<(Vec<f64>, Vec<f64>)>,
}

fn smoothing_error(err: impl std::fmt::Display) -> Error {
    Error::Smoothing(err.to_string())
}

impl Lowess {
    pub fn new(fraction: f64, iterations: usize) -> Self {
        Self {
            fraction,
            iterations,
        }
    }

    fn validate(&self, x: &[f64], y: &[f64]) -> Result<()> {
        if x.len() != y.len() {
            return Err(Error::LengthMismatch {
                left: x.len(),
                right: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(Error::TooFewSamples {
                needed: 2,
                got: x.len(),
            });
        }
        if !(self.fraction > 0.0 && self.fraction <= 1.0) {
            return Err(Error::Conflict(format!(
                "smoothing fraction {} is outside (0, 1]",
                self.fraction
            )));
        }
        Ok(())
    }

    /// Smooths `y` against `x`.
    pub fn fit(&self, x: &[f64], y: &[f64]) -> Result<LowessFit> {
        self.run(x, y, None)
    }

    /// Smooths `y` against `x` and bounds the curve at `confidence` (e.g. `0.95`).
    pub fn fit_with_interval(
        &self,
        x: &[f64],
        y: &[f64],
        kind: IntervalType,
        confidence: f64,
    ) -> Result<LowessFit> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(Error::Conflict(format!(
                "interval level {confidence} is outside (0, 1)"
            )));
        }
        self.run(x, y, Some((kind, confidence)))
    }

    fn run(
        &self,
        x: &[f64],
        y: &[f64],
        interval: Option<(IntervalType, f64)>,
    ) -> Result<LowessFit> {
        self.validate(x, y)?;

        let mut builder = LowessBuilder::new()
            .fraction(self.fraction)
            .iterations(self.iterations.saturating_sub(1))
            .weight_function(Tricube)
            .robustness_method(Bisquare)
            .boundary_policy(NoBoundary)
            .delta(0.0)
            .return_residuals();
        builder = match interval {
            Some((IntervalType::Confidence, level)) => builder.confidence_intervals(level),
            Some((IntervalType::Prediction, level)) => builder.prediction_intervals(level),
            _ => builder,
        };
        let model = builder.adapter(Batch).build().map_err(smoothing_error)?;
        let result = model.fit(x, y).map_err(smoothing_error)?;

        let smoothed: Vec<f64> = result.y.iter().copied().collect();
        let residuals: Vec<f64> = match &result.residuals {
            Some(r) => r.iter().copied().collect(),
            None => return Err(Error::Smoothing("residuals were not returned".into())),
        };
        let bounds = |lo: Option<Vec<f64>>, hi: Option<Vec<f64>>| {
            lo.zip(hi)
                .ok_or_else(|| Error::Smoothing("interval bounds were not returned".into()))
        };

        let interval = match interval {
            None => None,
            Some((IntervalType::Confidence, _)) => Some(bounds(
                result.confidence_lower.clone(),
                result.confidence_upper.clone(),
            )?),
            Some((IntervalType::Prediction, _)) => Some(bounds(
                result.prediction_lower.clone(),
                result.prediction_upper.clone(),
            )?),
            Some((IntervalType::Sigma, level)) => {
                let half = normal_critical(level) * residual_sigma(&residuals);
                Some(smoothed.iter().map(|s| (s - half, s + half)).unzip())
            }
        };
        debug!(
            points = x.len(),
            fraction = self.fraction,
            iterations = self.iterations,
            with_interval = interval.is_some(),
            "lowess fit"
        );

        Ok(LowessFit {
            smoothed,
            residuals,
            interval,
        })
    }
}

fn residual_sigma(residuals: &[f64]) -> f64 {
    let sd = std_dev(residuals, 0);
    if sd.is_finite() {
        sd
    } else {
        0.0
    }
}

impl LowessFit {
    /// Population standard deviation of the residuals.
    pub fn sigma(&self) -> f64 {
        residual_sigma(&self.residuals)
    }
}
