use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

pub fn students_t_for_corr(n_samples: usize) -> Option<StudentsT> {
    if n_samples <= 2 {
        return None;
    }
    StudentsT::new(0.0, 1.0, n_samples as f64 - 2.0).ok()
}

/// Two-sided p-value of a correlation coefficient under the t approximation.
pub fn corr_pvalue(r: f64, n_samples: usize) -> f64 {
    if !r.is_finite() {
        return f64::NAN;
    }
    let r = r.clamp(-1.0, 1.0);
    let Some(t_dist) = students_t_for_corr(n_samples) else {
        // two points always lie on a line
        return 1.0;
    };
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return 0.0;
    }
    let df = n_samples as f64 - 2.0;
    let t_abs = r.abs() * (df / denom).sqrt();
    (2.0 * t_dist.cdf(-t_abs)).clamp(0.0, 1.0)
}

pub fn standard_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("N(0, 1) parameters are valid")
}

pub fn two_sided_pvalue_from_z(z: f64) -> f64 {
    if !z.is_finite() {
        return f64::NAN;
    }
    (2.0 * standard_normal().cdf(-z.abs())).clamp(0.0, 1.0)
}

/// Quantile `q` with `P(|Z| <= q) = confidence` for a standard normal `Z`.
pub fn normal_critical(confidence: f64) -> f64 {
    let confidence = confidence.clamp(0.0, 1.0 - 1e-12);
    standard_normal().inverse_cdf(0.5 + confidence / 2.0)
}

/// Student-t counterpart of [`normal_critical`]; falls back to the normal for `df <= 0`.
pub fn t_critical(confidence: f64, df: f64) -> f64 {
    let confidence = confidence.clamp(0.0, 1.0 - 1e-12);
    match StudentsT::new(0.0, 1.0, df) {
        Ok(t) if df > 0.0 => t.inverse_cdf(0.5 + confidence / 2.0),
        _ => normal_critical(confidence),
    }
}
