//! Scatter plots with a LOWESS trend line and optional regression line.

pub mod lowess;

use std::ops::Range;

use plotters::coord::Shift;
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use strum_macros::{Display, EnumString};
use tracing::debug;

use crate::error::{Error, Result};
use crate::render::{Plot, TAB10};
use crate::stats::describe::mean;
use crate::stats::pvalue::t_critical;

pub use lowess::{IntervalType, Lowess, LowessFit};

const LINREG_POINTS: usize = 100;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    #[strum(serialize = "o", serialize = "circle")]
    Circle,
    #[strum(serialize = "s", serialize = "square")]
    Square,
    #[strum(serialize = "^", serialize = "triangle")]
    Triangle,
    #[strum(serialize = "x", serialize = "cross")]
    Cross,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SmoothScatterOptions {
    pub smoother: Lowess,
    pub scatter: bool,
    pub smoothed: bool,
    pub linreg: bool,
    /// Band around the smoothed line, in percent.
    pub ci: Option<f64>,
    /// Band around the regression line, in percent.
    pub ci_linreg: Option<f64>,
    pub interval_type: IntervalType,
    /// Drop pairs where either value is missing.
    pub dropna: bool,
    /// Standard deviation of normal noise added to drawn points only.
    pub x_jitter: Option<f64>,
    pub y_jitter: Option<f64>,
    pub seed: Option<u64>,
    pub label: Option<String>,
    pub label_smoothed: Option<String>,
    pub label_linreg: Option<String>,
    pub color: RGBColor,
    pub alpha: f64,
    pub marker: Marker,
    pub marker_size: u32,
    pub linewidth: u32,
    pub ci_alpha: f64,
    pub linreg_color: RGBColor,
    /// Tick labels on both axes.
    pub axis_labels: bool,
}

impl Default for SmoothScatterOptions {
    fn default() -> Self {
        Self {
            smoother: Lowess::default(),
            scatter: true,
            smoothed: true,
            linreg: false,
            ci: Some(95.0),
            ci_linreg: None,
            interval_type: IntervalType::Confidence,
            dropna: true,
            x_jitter: None,
            y_jitter: None,
            seed: None,
            label: None,
            label_smoothed: None,
            label_linreg: None,
            color: TAB10[0],
            alpha: 0.8,
            marker: Marker::Circle,
            marker_size: 4,
            linewidth: 2,
            ci_alpha: 0.3,
            linreg_color: BLACK,
            axis_labels: true,
        }
    }
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    n: usize,
    x_mean: f64,
    sxx: f64,
    resid_std: f64,
}

impl LinearFit {
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::LengthMismatch {
                left: x.len(),
                right: y.len(),
            });
        }
        let n = x.len();
        if n < 2 {
            return Err(Error::TooFewSamples { needed: 2, got: n });
        }
        let (xm, ym) = (mean(x), mean(y));
        let sxx: f64 = x.iter().map(|v| (v - xm).powi(2)).sum();
        let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - xm) * (b - ym)).sum();
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = ym - slope * xm;
        let sse: f64 = x
            .iter()
            .zip(y)
            .map(|(a, b)| (b - intercept - slope * a).powi(2))
            .sum();
        let resid_std = if n > 2 { (sse / (n - 2) as f64).sqrt() } else { 0.0 };
        Ok(Self {
            slope,
            intercept,
            n,
            x_mean: xm,
            sxx,
            resid_std,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Half-width of the confidence band of the mean response at `x`.
    pub fn band(&self, x: f64, confidence: f64) -> f64 {
        if self.n <= 2 || self.sxx <= 0.0 {
            return 0.0;
        }
        let t = t_critical(confidence, (self.n - 2) as f64);
        let n = self.n as f64;
        t * self.resid_std * (1.0 / n + (x - self.x_mean).powi(2) / self.sxx).sqrt()
    }
}

/// What [`smoothscatter`] computed, with points sorted by `x`.
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothedSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub smoothed: Option<Vec<f64>>,
    pub interval: Option<(Vec<f64>, Vec<f64>)>,
    pub linreg: Option<LinearFit>,
    /// Scatter positions after jitter.
    pub points: Vec<(f64, f64)>,
}

/// Cleans, sorts, smooths and fits the data without drawing it.
pub fn smooth_series(x: &[f64], y: &[f64], options: &SmoothScatterOptions) -> Result<SmoothedSeries> {
    if x.is_empty() || y.is_empty() {
        return Err(Error::EmptyInput("smoothscatter needs x and y values".into()));
    }
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }

    let mut pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .map(|(&a, &b)| (a, b))
        .filter(|(a, b)| !options.dropna || (a.is_finite() && b.is_finite()))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    debug!(kept = xs.len(), dropped = x.len() - xs.len(), "smoothscatter input");

    let (smoothed, interval) = if options.smoothed {
        let fit = match options.ci {
            Some(ci) => {
                options
                    .smoother
                    .fit_with_interval(&xs, &ys, options.interval_type, ci / 100.0)?
            }
            None => options.smoother.fit(&xs, &ys)?,
        };
        (Some(fit.smoothed), fit.interval)
    } else {
        (None, None)
    };

    let linreg = if options.linreg {
        Some(LinearFit::fit(&xs, &ys)?)
    } else {
        None
    };

    let points = if options.scatter {
        jitter(&pairs, options)?
    } else {
        Vec::new()
    };

    Ok(SmoothedSeries {
        x: xs,
        y: ys,
        smoothed,
        interval,
        linreg,
        points,
    })
}

fn jitter(pairs: &[(f64, f64)], options: &SmoothScatterOptions) -> Result<Vec<(f64, f64)>> {
    use rand::distributions::Distribution;

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let noise = |sd: Option<f64>| -> Result<Option<Normal>> {
        sd.map(|sd| {
            Normal::new(0.0, sd).map_err(|e| Error::Conflict(format!("jitter {sd}: {e}")))
        })
        .transpose()
    };
    let (nx, ny) = (noise(options.x_jitter)?, noise(options.y_jitter)?);

    Ok(pairs
        .iter()
        .map(|&(a, b)| {
            let dx = nx.as_ref().map_or(0.0, |d| d.sample(&mut rng));
            let dy = ny.as_ref().map_or(0.0, |d| d.sample(&mut rng));
            (a + dx, b + dy)
        })
        .collect())
}

fn padded(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return -1.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad)..(hi + pad)
}

pub fn smoothscatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x: &[f64],
    y: &[f64],
    options: &SmoothScatterOptions,
) -> Result<SmoothedSeries> {
    let series = smooth_series(x, y, options)?;

    let linreg_grid: Vec<f64> = match (&series.linreg, series.x.first(), series.x.last()) {
        (Some(_), Some(&lo), Some(&hi)) => (0..LINREG_POINTS)
            .map(|i| lo + (hi - lo) * i as f64 / (LINREG_POINTS - 1) as f64)
            .collect(),
        _ => Vec::new(),
    };
    let linreg_band: Vec<(f64, f64, f64)> = match series.linreg {
        Some(fit) => linreg_grid
            .iter()
            .map(|&gx| {
                let half = options.ci_linreg.map_or(0.0, |ci| fit.band(gx, ci / 100.0));
                (gx, fit.predict(gx) - half, fit.predict(gx) + half)
            })
            .collect(),
        None => Vec::new(),
    };

    let xs = padded(
        series
            .x
            .iter()
            .copied()
            .chain(series.points.iter().map(|p| p.0)),
    );
    let mut ys_all: Vec<f64> = series.y.clone();
    ys_all.extend(series.points.iter().map(|p| p.1));
    if let Some(s) = &series.smoothed {
        ys_all.extend(s);
    }
    if let Some((lo, hi)) = &series.interval {
        ys_all.extend(lo);
        ys_all.extend(hi);
    }
    ys_all.extend(linreg_band.iter().flat_map(|b| [b.1, b.2]));
    let ys = padded(ys_all.into_iter());

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(xs, ys)?;
    let mut mesh = chart.configure_mesh();
    if !options.axis_labels {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    let color = options.color;
    let mut label = options.label.clone();
    if options.scatter {
        let style = color.mix(options.alpha).filled();
        let size = options.marker_size as i32;
        let pts = series.points.iter().copied();
        let anno = match options.marker {
            Marker::Circle => chart.draw_series(pts.map(|p| Circle::new(p, size, style)))?,
            Marker::Square => chart.draw_series(pts.map(|p| {
                EmptyElement::at(p) + Rectangle::new([(-size, -size), (size, size)], style)
            }))?,
            Marker::Triangle => {
                chart.draw_series(pts.map(|p| TriangleMarker::new(p, size, style)))?
            }
            Marker::Cross => chart.draw_series(pts.map(|p| Cross::new(p, size, style)))?,
        };
        if let Some(l) = label.take() {
            anno.label(l)
                .legend(move |(x, y)| Circle::new((x, y), size, style));
        }
    }

    if let Some(smoothed) = &series.smoothed {
        if let Some((lo, hi)) = &series.interval {
            let band: Vec<(f64, f64)> = series
                .x
                .iter()
                .zip(hi)
                .map(|(&a, &b)| (a, b))
                .chain(series.x.iter().zip(lo).rev().map(|(&a, &b)| (a, b)))
                .collect();
            chart.draw_series(std::iter::once(Polygon::new(
                band,
                color.mix(options.ci_alpha).filled(),
            )))?;
        }
        let line_style = color.stroke_width(options.linewidth);
        let anno = chart.draw_series(LineSeries::new(
            series.x.iter().copied().zip(smoothed.iter().copied()),
            line_style,
        ))?;
        if let Some(l) = options.label_smoothed.clone().or(label) {
            anno.label(l).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], line_style)
            });
        }
    }

    if !linreg_band.is_empty() {
        let lr_color = options.linreg_color;
        if options.ci_linreg.is_some() {
            let band: Vec<(f64, f64)> = linreg_band
                .iter()
                .map(|b| (b.0, b.2))
                .chain(linreg_band.iter().rev().map(|b| (b.0, b.1)))
                .collect();
            chart.draw_series(std::iter::once(Polygon::new(
                band,
                lr_color.mix(0.15).filled(),
            )))?;
        }
        let line_style = lr_color.stroke_width(2);
        let anno = chart.draw_series(LineSeries::new(
            linreg_band.iter().map(|b| (b.0, (b.1 + b.2) / 2.0)),
            line_style,
        ))?;
        if let Some(l) = options.label_linreg.clone() {
            anno.label(l).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], line_style)
            });
        }
    }

    let has_legend = options.label.is_some()
        || options.label_smoothed.is_some()
        || (options.linreg && options.label_linreg.is_some());
    if has_legend {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(series)
}

/// [`smoothscatter`] as a [`Plot`].
#[derive(Clone, Debug)]
pub struct SmoothScatterPlot<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub options: &'a SmoothScatterOptions,
}

impl Plot for SmoothScatterPlot<'_> {
    type Output = SmoothedSeries;

    fn plot<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<SmoothedSeries> {
        smoothscatter(area, self.x, self.y, self.options)
    }
}
