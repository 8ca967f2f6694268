//! Association measures involving categorical variables.

use std::collections::HashMap;
use std::hash::Hash;

fn counts<T: Eq + Hash>(values: impl IntoIterator<Item = T>) -> HashMap<T, usize> {
    let mut counter = HashMap::new();
    for v in values {
        *counter.entry(v).or_insert(0) += 1;
    }
    counter
}

/// Shannon entropy (natural log) of the empirical distribution of `x`.
pub fn entropy(x: &[String]) -> f64 {
    let total = x.len() as f64;
    if total == 0.0 {
        return 0.0;
    }
    counts(x.iter())
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.ln()
        })
        .sum()
}

/// Conditional entropy `H(x | y)`.
pub fn conditional_entropy(x: &[String], y: &[String]) -> f64 {
    let y_counter = counts(y.iter());
    let xy_counter = counts(x.iter().zip(y.iter()));
    let total = y.len() as f64;

    xy_counter
        .iter()
        .map(|((_, yv), &n_xy)| {
            let p_xy = n_xy as f64 / total;
            let p_y = y_counter[yv] as f64 / total;
            p_xy * (p_y / p_xy).ln()
        })
        .sum()
}

/// Theil's uncertainty coefficient `U(x | y)`: the fraction of the entropy of `x`
/// removed by knowing `y`. Defined as 1 when `x` is constant.
pub fn theils_u(x: &[String], y: &[String]) -> f64 {
    let s_x = entropy(x);
    if s_x == 0.0 {
        return 1.0;
    }
    (s_x - conditional_entropy(x, y)) / s_x
}

/// Symmetric uncertainty coefficient `2 I(x; y) / (H(x) + H(y))`.
pub fn theils_sym_u(x: &[String], y: &[String]) -> f64 {
    let s_x = entropy(x);
    let s_y = entropy(y);
    let total = s_x + s_y;
    if total == 0.0 {
        return 1.0;
    }
    // entropy-weighted mean of both directional coefficients
    let mutual = s_x - conditional_entropy(x, y);
    2.0 * mutual / total
}

/// Correlation ratio (eta) of `measurements` grouped by `categories`.
///
/// Returns 0 when the group means coincide and NaN for empty input.
pub fn correlation_ratio(categories: &[String], measurements: &[f64]) -> f64 {
    if measurements.is_empty() {
        return f64::NAN;
    }

    let mut groups: HashMap<&str, (usize, f64)> = HashMap::new();
    for (cat, &m) in categories.iter().zip(measurements) {
        let entry = groups.entry(cat.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += m;
    }

    let total: f64 = measurements.iter().sum();
    let y_total_avg = total / measurements.len() as f64;

    let numerator: f64 = groups
        .values()
        .map(|&(n, sum)| {
            let avg = sum / n as f64;
            n as f64 * (avg - y_total_avg).powi(2)
        })
        .sum();
    if numerator == 0.0 {
        return 0.0;
    }

    let denominator: f64 = measurements.iter().map(|m| (m - y_total_avg).powi(2)).sum();
    (numerator / denominator).sqrt()
}
