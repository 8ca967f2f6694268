//! Histogram of regression outputs and their errors on twin y axes.

use std::ops::Range;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use tracing::debug;

use crate::error::{Error, Result};
use crate::render::colormap::{TAB_BLUE, TAB_RED};
use crate::render::{format_g, text_style, Plot, FONT_FAMILY};
use crate::stats::describe::{
    gaussian_kde, histogram, kde_support, mean_absolute_error, mean_squared_error, Bin,
    StandardScaler,
};

const KDE_GRIDSIZE: usize = 200;
const DASH: f64 = 0.02;

#[derive(Clone, Debug, PartialEq)]
pub struct ErrorHistogramOptions {
    /// Values the output scaler is fitted on; defaults to the true outputs.
    pub fit_scaling: Option<Vec<f64>>,
    pub standardize_outputs: bool,
    pub with_output: bool,
    pub with_error: bool,
    pub with_mae: bool,
    pub with_mse: bool,
    pub output_color: RGBColor,
    pub error_color: RGBColor,
    pub output_alpha: f64,
    pub error_alpha: f64,
    pub kde: bool,
    pub kde_cut: f64,
    /// Significant digits in the MAE and MSE labels.
    pub num_label_precision: usize,
}

impl Default for ErrorHistogramOptions {
    fn default() -> Self {
        Self {
            fit_scaling: None,
            standardize_outputs: true,
            with_output: true,
            with_error: true,
            with_mae: true,
            with_mse: false,
            output_color: TAB_BLUE,
            error_color: TAB_RED,
            output_alpha: 0.4,
            error_alpha: 0.8,
            kde: true,
            kde_cut: 3.0,
            num_label_precision: 3,
        }
    }
}

/// What was plotted, in the (possibly standardised) output scale.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorSummary {
    pub outputs: Vec<f64>,
    pub errors: Vec<f64>,
    pub mae: f64,
    pub mse: f64,
    pub output_bins: Vec<Bin>,
    pub error_bins: Vec<Bin>,
}

/// Standardises the outputs when asked, then computes errors, MAE, MSE and bins.
pub fn error_summary(
    y_true: &[f64],
    y_pred: &[f64],
    options: &ErrorHistogramOptions,
) -> Result<ErrorSummary> {
    if y_true.len() != y_pred.len() {
        return Err(Error::LengthMismatch {
            left: y_true.len(),
            right: y_pred.len(),
        });
    }
    let (outputs, predicted) = if options.standardize_outputs {
        let scaler = StandardScaler::fit(options.fit_scaling.as_deref().unwrap_or(y_true))?;
        debug!(mean = scaler.mean, scale = scaler.scale, "output scaler");
        (scaler.transform(y_true), scaler.transform(y_pred))
    } else {
        (y_true.to_vec(), y_pred.to_vec())
    };

    let errors: Vec<f64> = outputs.iter().zip(&predicted).map(|(t, p)| t - p).collect();
    Ok(ErrorSummary {
        mae: mean_absolute_error(&outputs, &predicted)?,
        mse: mean_squared_error(&outputs, &predicted)?,
        output_bins: histogram(&outputs),
        error_bins: histogram(&errors),
        outputs,
        errors,
    })
}

/// KDE scaled to histogram counts.
fn kde_curve(values: &[f64], bins: &[Bin], cut: f64) -> Vec<(f64, f64)> {
    let Some(first) = bins.first() else {
        return Vec::new();
    };
    let scale = values.len() as f64 * (first.hi - first.lo);
    let grid = kde_support(values, cut, KDE_GRIDSIZE);
    let density = gaussian_kde(values, &grid);
    grid.into_iter()
        .zip(density)
        .map(|(x, d)| (x, d * scale))
        .collect()
}

fn max_count(bins: &[Bin], curve: &[(f64, f64)]) -> f64 {
    let bins = bins.iter().map(|b| b.count as f64).fold(0.0, f64::max);
    let curve = curve.iter().map(|p| p.1).fold(0.0, f64::max);
    bins.max(curve).max(1.0) * 1.05
}

fn x_range(parts: &[&[f64]]) -> Range<f64> {
    let (lo, hi) = parts
        .iter()
        .flat_map(|p| p.iter())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return -1.0..1.0;
    }
    let pad = ((hi - lo) * 0.05).max(1e-9);
    (lo - pad)..(hi + pad)
}

/// Dashed vertical segments from 0 to `top`.
fn dashes(x: f64, top: f64) -> Vec<Vec<(f64, f64)>> {
    let step = top * DASH;
    let mut out = Vec::new();
    let mut y = 0.0;
    while y < top {
        out.push(vec![(x, y), (x, (y + step).min(top))]);
        y += 2.0 * step;
    }
    out
}

pub fn error_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    y_true: &[f64],
    y_pred: &[f64],
    options: &ErrorHistogramOptions,
) -> Result<ErrorSummary> {
    let summary = error_summary(y_true, y_pred, options)?;

    let output_kde = if options.kde && options.with_output {
        kde_curve(&summary.outputs, &summary.output_bins, options.kde_cut)
    } else {
        Vec::new()
    };
    let error_kde = if options.kde && options.with_error {
        kde_curve(&summary.errors, &summary.error_bins, options.kde_cut)
    } else {
        Vec::new()
    };

    let kde_xs: Vec<f64> = output_kde.iter().chain(&error_kde).map(|p| p.0).collect();
    let mut marks = Vec::new();
    if options.with_mae {
        marks.push(summary.mae);
    }
    if options.with_mse {
        marks.push(summary.mse);
    }
    let xs = x_range(&[&summary.outputs, &summary.errors, &kde_xs, &marks]);
    let y1 = max_count(&summary.output_bins, &output_kde);
    let y2 = max_count(&summary.error_bins, &error_kde);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(xs.clone(), 0.0..y1)?
        .set_secondary_coord(xs, 0.0..y2);

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.2))
        .x_desc("value")
        .y_desc("output frequency")
        .label_style((FONT_FAMILY, 12))
        .axis_desc_style((FONT_FAMILY, 14).into_font().color(&options.output_color))
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("error frequency")
        .label_style((FONT_FAMILY, 12))
        .axis_desc_style((FONT_FAMILY, 14).into_font().color(&options.error_color))
        .draw()?;

    if options.with_output {
        let fill = options.output_color.mix(options.output_alpha).filled();
        chart.draw_series(summary.output_bins.iter().map(|b| {
            Rectangle::new([(b.lo, 0.0), (b.hi, b.count as f64)], fill)
        }))?;
        chart.draw_series(LineSeries::new(
            output_kde.iter().copied(),
            options.output_color.stroke_width(2),
        ))?;
    }
    if options.with_error {
        let fill = options.error_color.mix(options.error_alpha).filled();
        chart.draw_secondary_series(summary.error_bins.iter().map(|b| {
            Rectangle::new([(b.lo, 0.0), (b.hi, b.count as f64)], fill)
        }))?;
        chart.draw_secondary_series(LineSeries::new(
            error_kde.iter().copied(),
            options.error_color.stroke_width(2),
        ))?;
    }

    let label_style = text_style(12.0, BLACK, HPos::Left, VPos::Bottom);
    let mut mark = |name: &str, value: f64| -> Result<()> {
        chart.draw_series(
            dashes(value, y1)
                .into_iter()
                .map(|seg| PathElement::new(seg, BLACK.stroke_width(1))),
        )?;
        let label = format!("{name} = {}", format_g(value, options.num_label_precision));
        chart.draw_series(std::iter::once(
            EmptyElement::at((value, y1 * 0.8)) + Text::new(label, (5, 0), label_style.clone()),
        ))?;
        Ok(())
    };
    if options.with_mae {
        mark("MAE", summary.mae)?;
    }
    if options.with_mse {
        mark("MSE", summary.mse)?;
    }

    Ok(summary)
}

/// [`error_histogram`] as a [`Plot`].
#[derive(Clone, Debug)]
pub struct ErrorHistogramPlot<'a> {
    pub y_true: &'a [f64],
    pub y_pred: &'a [f64],
    pub options: &'a ErrorHistogramOptions,
}

impl Plot for ErrorHistogramPlot<'_> {
    type Output = ErrorSummary;

    fn plot<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<ErrorSummary> {
        error_histogram(area, self.y_true, self.y_pred, self.options)
    }
}
