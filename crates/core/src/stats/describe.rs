//! Descriptive helpers shared by the plotting functions.

use crate::error::{Error, Result};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `ddof` delta degrees of freedom.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    if values.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - ddof) as f64).sqrt()
}

/// Linear-interpolated quantile of already sorted values.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let idx = (sorted.len() as f64 - 1.0) * q;
    let k0 = idx.floor() as usize;
    let k1 = idx.ceil() as usize;
    sorted[k0] + (sorted[k1] - sorted[k0]) * (idx - k0 as f64)
}

pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, 0.5)
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_same_len(y_true, y_pred)?;
    Ok(mean(
        &y_true
            .iter()
            .zip(y_pred)
            .map(|(a, b)| (a - b).abs())
            .collect::<Vec<_>>(),
    ))
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_same_len(y_true, y_pred)?;
    Ok(mean(
        &y_true
            .iter()
            .zip(y_pred)
            .map(|(a, b)| (a - b).powi(2))
            .collect::<Vec<_>>(),
    ))
}

fn check_same_len(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(Error::EmptyInput("no samples".into()));
    }
    Ok(())
}

/// Removes the mean and scales to unit (population) variance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StandardScaler {
    pub mean: f64,
    pub scale: f64,
}

impl StandardScaler {
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::EmptyInput("cannot fit a scaler on no samples".into()));
        }
        let std = std_dev(values, 0);
        Ok(Self {
            mean: mean(values),
            scale: if std == 0.0 || !std.is_finite() { 1.0 } else { std },
        })
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| (v - self.mean) / self.scale).collect()
    }
}

/// One histogram bin `[lo, hi)` (the last bin is closed).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

/// Upper bound on [`auto_bin_count`].
pub const MAX_AUTO_BINS: usize = 1_000;

/// Number of bins by numpy's `auto` rule: the larger count of Sturges and Freedman-Diaconis,
/// capped at [`MAX_AUTO_BINS`].
pub fn auto_bin_count(values: &[f64]) -> usize {
    let n = values.len();
    if n == 0 {
        return 1;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let range = sorted[n - 1] - sorted[0];
    if range == 0.0 {
        return 1;
    }

    let sturges = range / ((n as f64).log2() + 1.0);
    let iqr = quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25);
    let fd = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);
    let width = if fd > 0.0 { sturges.min(fd) } else { sturges };
    ((range / width).ceil() as usize).clamp(1, MAX_AUTO_BINS)
}

pub fn histogram(values: &[f64]) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().cloned().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Vec::new();
    }
    let n_bins = auto_bin_count(&finite);
    let mut lo = finite.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut hi = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / n_bins as f64;
    let mut bins: Vec<Bin> = (0..n_bins)
        .map(|i| Bin {
            lo: lo + i as f64 * width,
            hi: lo + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for v in finite {
        let idx = (((v - lo) / width) as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Gaussian kernel density estimate with Scott's bandwidth, evaluated on `grid`.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = values.len();
    let bw = kde_bandwidth(values);
    if n == 0 || !bw.is_finite() || bw == 0.0 {
        return vec![0.0; grid.len()];
    }
    let norm = 1.0 / (n as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());
    grid.iter()
        .map(|&g| {
            values
                .iter()
                .map(|&v| (-0.5 * ((g - v) / bw).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect()
}

pub fn kde_bandwidth(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    std_dev(values, 1) * n.powf(-0.2)
}

/// Evaluation grid extending `cut` bandwidths past the data range.
pub fn kde_support(values: &[f64], cut: f64, gridsize: usize) -> Vec<f64> {
    let bw = kde_bandwidth(values);
    let bw = if bw.is_finite() { bw } else { 0.0 };
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min) - cut * bw;
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + cut * bw;
    if gridsize < 2 || !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    (0..gridsize)
        .map(|i| lo + (hi - lo) * i as f64 / (gridsize - 1) as f64)
        .collect()
}
