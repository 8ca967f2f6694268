/// Power-law normalisation of values into `[0, 1]`.
///
/// Values below `vmin` map to 0; `vmin == vmax` maps everything to 0; NaN stays NaN.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerNorm {
    pub gamma: f64,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
}

impl PowerNorm {
    pub fn new(gamma: f64) -> Self {
        Self {
            gamma,
            vmin: None,
            vmax: None,
        }
    }

    pub fn with_range(gamma: f64, vmin: f64, vmax: f64) -> Self {
        Self {
            gamma,
            vmin: Some(vmin),
            vmax: Some(vmax),
        }
    }

    pub fn scaled(&self) -> bool {
        self.vmin.is_some() && self.vmax.is_some()
    }

    /// Sets both bounds to the finite extremes of `values`.
    pub fn autoscale(&mut self, values: &[f64]) {
        let (lo, hi) = nan_extent(values);
        self.vmin = lo;
        self.vmax = hi;
    }

    /// Sets only the bounds that are still unset.
    pub fn autoscale_none(&mut self, values: &[f64]) {
        let (lo, hi) = nan_extent(values);
        self.vmin = self.vmin.or(lo);
        self.vmax = self.vmax.or(hi);
    }

    pub fn apply(&self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        let (Some(vmin), Some(vmax)) = (self.vmin, self.vmax) else {
            return f64::NAN;
        };
        if vmin >= vmax {
            return 0.0;
        }
        let shifted = (value - vmin).max(0.0);
        shifted.powf(self.gamma) / (vmax - vmin).powf(self.gamma)
    }

    /// Inverse of [`PowerNorm::apply`] on `[0, 1]`.
    pub fn inverse(&self, t: f64) -> f64 {
        match (self.vmin, self.vmax) {
            (Some(vmin), Some(vmax)) => vmin + t.max(0.0).powf(1.0 / self.gamma) * (vmax - vmin),
            _ => f64::NAN,
        }
    }
}

/// Smallest and largest non-NaN values.
pub fn nan_extent(values: &[f64]) -> (Option<f64>, Option<f64>) {
    values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((None, None), |(lo, hi), &v| {
            (
                Some(lo.map_or(v, |l: f64| l.min(v))),
                Some(hi.map_or(v, |h: f64| h.max(v))),
            )
        })
}
