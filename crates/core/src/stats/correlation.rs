use kendalls::tau_b;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};
use crate::stats::pvalue::{corr_pvalue, two_sided_pvalue_from_z};
use crate::stats::rank::rank_data;

/// A numeric-vs-numeric correlation function returning `(coefficient, p-value)`.
pub trait Correlation {
    fn correlate(&self, x: &[f64], y: &[f64]) -> Result<(f64, f64)>;
}

impl<F> Correlation for F
where
    F: Fn(&[f64], &[f64]) -> Result<(f64, f64)>,
{
    fn correlate(&self, x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
        self(x, y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum CorrMethod {
    #[default]
    #[strum(serialize = "pearson")]
    Pearson,
    #[strum(serialize = "spearman")]
    Spearman,
    #[strum(serialize = "kendall", serialize = "kendall_tau")]
    Kendall,
}

impl Correlation for CorrMethod {
    fn correlate(&self, x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
        match self {
            CorrMethod::Pearson => pearson(x, y),
            CorrMethod::Spearman => spearman(x, y),
            CorrMethod::Kendall => kendall(x, y),
        }
    }
}

fn check_pair(x: &[f64], y: &[f64]) -> Result<()> {
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
    Ok(())
}

fn pearson_r(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut ss_x = 0.0;
    let mut ss_y = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        ss_x += dx * dx;
        ss_y += dy * dy;
    }

    let scale = (ss_x * ss_y).sqrt();
    if scale == 0.0 || !scale.is_finite() {
        return f64::NAN;
    }
    (cov / scale).clamp(-1.0, 1.0)
}

/// Pearson product-moment correlation with its two-sided p-value.
///
/// Constant input yields `(NaN, NaN)`.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    check_pair(x, y)?;
    let r = pearson_r(x, y);
    Ok((r, corr_pvalue(r, x.len())))
}

/// Spearman rank correlation: Pearson on average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    check_pair(x, y)?;
    let r = pearson_r(&rank_data(x), &rank_data(y));
    Ok((r, corr_pvalue(r, x.len())))
}

/// Kendall tau-b with the normal-approximation p-value.
pub fn kendall(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    check_pair(x, y)?;

    // average ranks are multiples of 0.5, so doubling keeps ties exact
    let x_ranks: Vec<i64> = rank_data(x).iter().map(|&r| (r * 2.0) as i64).collect();
    let y_ranks: Vec<i64> = rank_data(y).iter().map(|&r| (r * 2.0) as i64).collect();

    match tau_b(&x_ranks, &y_ranks) {
        Ok((tau, z)) if tau.is_finite() => Ok((tau, two_sided_pvalue_from_z(z))),
        _ => Ok((f64::NAN, f64::NAN)),
    }
}
