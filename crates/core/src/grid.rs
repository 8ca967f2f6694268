//! Grids of per-column plots and helpers for grouped plots.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::debug;

use crate::error::{Error, Result};
use crate::render::{Plot, TAB10};
use crate::stats::describe::{mean, median};
use crate::table::{Column, Table};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Interact {
    /// Every x column against every y column.
    #[default]
    Product,
    /// x and y columns pairwise.
    Zip,
    /// Every unordered pair of x columns.
    Comb,
}

/// Layout of one panel per variable pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ColGrid {
    pub x_cols: Vec<String>,
    pub y_cols: Option<Vec<String>>,
    pub interact: Interact,
    pub col_wrap: usize,
    pub height: f64,
    pub aspect: f64,
}

impl ColGrid {
    pub fn new(
        x_cols: Vec<String>,
        y_cols: Option<Vec<String>>,
        interact: Interact,
        col_wrap: Option<usize>,
        height: f64,
        aspect: f64,
    ) -> Result<Self> {
        if interact == Interact::Comb && y_cols.is_some() {
            return Err(Error::Conflict(
                "y columns cannot be combined with the 'comb' interaction".into(),
            ));
        }
        let mut grid = Self {
            x_cols,
            y_cols,
            interact,
            col_wrap: 1,
            height,
            aspect,
        };
        grid.col_wrap = col_wrap.unwrap_or_else(|| grid.num_plots().min(4)).max(1);
        Ok(grid)
    }

    /// Grid over `x_cols` with the default interaction, height 3 and aspect 4:3.
    pub fn with_defaults(x_cols: Vec<String>, y_cols: Option<Vec<String>>) -> Result<Self> {
        Self::new(x_cols, y_cols, Interact::Product, None, 3.0, 4.0 / 3.0)
    }

    /// Variable pairs in panel order; `None` marks an x-only panel.
    pub fn pairs(&self) -> Vec<(String, Option<String>)> {
        match (self.interact, &self.y_cols) {
            (Interact::Product, Some(ys)) => self
                .x_cols
                .iter()
                .flat_map(|x| ys.iter().map(move |y| (x.clone(), Some(y.clone()))))
                .collect(),
            (Interact::Zip, Some(ys)) => self
                .x_cols
                .iter()
                .zip(ys)
                .map(|(x, y)| (x.clone(), Some(y.clone())))
                .collect(),
            (Interact::Product | Interact::Zip, None) => {
                self.x_cols.iter().map(|x| (x.clone(), None)).collect()
            }
            (Interact::Comb, _) => {
                let n = self.x_cols.len();
                (0..n)
                    .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
                    .map(|(i, j)| (self.x_cols[i].clone(), Some(self.x_cols[j].clone())))
                    .collect()
            }
        }
    }

    pub fn num_plots(&self) -> usize {
        self.pairs().len()
    }

    pub fn num_rows(&self) -> usize {
        ((self.num_plots() + self.col_wrap - 1) / self.col_wrap).max(1)
    }

    /// `(col_wrap * height * aspect, rows * height)`.
    pub fn figure_size(&self) -> (f64, f64) {
        (
            self.col_wrap as f64 * self.height * self.aspect,
            self.num_rows() as f64 * self.height,
        )
    }

    /// Figure size in pixels at `dpi`.
    pub fn pixel_size(&self, dpi: f64) -> (u32, u32) {
        let (w, h) = self.figure_size();
        ((w * dpi).round() as u32, (h * dpi).round() as u32)
    }

    /// Splits `area` into panels and calls `f(panel, x, y)` for every pair.
    /// Panels past the last pair stay blank.
    pub fn map<DB, F, T>(&self, area: &DrawingArea<DB, Shift>, mut f: F) -> Result<Vec<T>>
    where
        DB: DrawingBackend,
        F: FnMut(&DrawingArea<DB, Shift>, &str, Option<&str>) -> Result<T>,
    {
        let pairs = self.pairs();
        let panels = area.split_evenly((self.num_rows(), self.col_wrap));
        debug!(
            panels = panels.len(),
            plots = pairs.len(),
            interact = %self.interact,
            "column grid"
        );
        pairs
            .iter()
            .zip(&panels)
            .map(|((x, y), panel)| f(panel, x, y.as_deref()))
            .collect()
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    #[default]
    Median,
    Mean,
    Min,
    Max,
}

impl OrderBy {
    fn summarize(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        match self {
            OrderBy::Median => median(values),
            OrderBy::Mean => mean(values),
            OrderBy::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            OrderBy::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Group labels sorted by a statistic of their values; groups without values go last.
pub fn sorted_order(groups: &[Option<String>], values: &[f64], by: OrderBy) -> Result<Vec<String>> {
    if groups.len() != values.len() {
        return Err(Error::LengthMismatch {
            left: groups.len(),
            right: values.len(),
        });
    }
    let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (g, &v) in groups.iter().zip(values) {
        if let Some(g) = g {
            let entry = grouped.entry(g.as_str()).or_default();
            if !v.is_nan() {
                entry.push(v);
            }
        }
    }
    let mut stats: Vec<(&str, f64)> = grouped
        .into_iter()
        .map(|(g, vs)| (g, by.summarize(&vs)))
        .collect();
    stats.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
        (false, false) => a.1.total_cmp(&b.1),
        (nan_a, nan_b) => nan_a.cmp(&nan_b),
    });
    Ok(stats.into_iter().map(|(g, _)| g.to_string()).collect())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orient {
    /// Groups along x, values along y.
    #[strum(serialize = "v", serialize = "vertical")]
    Vertical,
    #[strum(serialize = "h", serialize = "horizontal")]
    Horizontal,
}

/// Picks the orientation of a grouped plot from which variable is numeric.
pub fn infer_orient(
    x: Option<&Column>,
    y: Option<&Column>,
    orient: Option<Orient>,
) -> Result<Orient> {
    if let Some(orient) = orient {
        return Ok(orient);
    }
    match (x, y) {
        (None, _) => Ok(Orient::Vertical),
        (_, None) => Ok(Orient::Horizontal),
        (Some(x), Some(y)) if !y.is_numeric() => {
            if x.is_numeric() {
                Ok(Orient::Horizontal)
            } else {
                Err(Error::Conflict(
                    "neither the x nor the y variable appears to be numeric".into(),
                ))
            }
        }
        _ => Ok(Orient::Vertical),
    }
}

/// Share of each value of the prop columns within each `x_col` group.
#[derive(Clone, Debug, PartialEq)]
pub struct Proportions {
    pub x_col: String,
    pub groups: Vec<String>,
    /// Indicator names of the form `prop_col=value`.
    pub dummies: Vec<String>,
    /// `groups` x `dummies`.
    pub values: Array2<f64>,
}

/// One-hot encodes every column of `prop_cols` and averages each indicator per `x_col`
/// group. The dummies of all columns sit side by side, in `prop_cols` order.
/// Rows missing the group value are left out; a missing value in a prop column only
/// counts against that column's indicators.
pub fn proportions(table: &Table, x_col: &str, prop_cols: &[&str]) -> Result<Proportions> {
    if prop_cols.is_empty() {
        return Err(Error::EmptyInput("proportion columns".into()));
    }
    let xs = table.column(x_col)?.to_categorical();
    let props = prop_cols
        .iter()
        .map(|c| table.column(c).map(|col| col.to_categorical()))
        .collect::<Result<Vec<_>>>()?;

    let unique = |v: &[Option<String>]| -> Vec<String> {
        v.iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };
    let groups = unique(&xs);
    let rows: Vec<Option<usize>> = xs
        .iter()
        .map(|x| x.as_ref().and_then(|x| groups.binary_search(x).ok()))
        .collect();
    let mut totals = vec![0usize; groups.len()];
    for i in rows.iter().flatten() {
        totals[*i] += 1;
    }

    let mut dummies = Vec::new();
    let mut shares: Vec<Vec<f64>> = Vec::new();
    for (name, values) in prop_cols.iter().zip(&props) {
        let levels = unique(values);
        let mut hits = Array2::<f64>::zeros((groups.len(), levels.len()));
        for (row, p) in rows.iter().zip(values) {
            let Some(i) = *row else { continue };
            if let Some(Ok(j)) = p.as_ref().map(|p| levels.binary_search(p)) {
                hits[[i, j]] += 1.0;
            }
        }
        for (mut row, &total) in hits.rows_mut().into_iter().zip(&totals) {
            if total > 0 {
                row.mapv_inplace(|h| h / total as f64);
            }
        }
        dummies.extend(levels.iter().map(|l| format!("{name}={l}")));
        shares.extend(hits.columns().into_iter().map(|c| c.to_vec()));
    }

    let values = Array2::from_shape_fn((groups.len(), shares.len()), |(i, j)| shares[j][i]);
    Ok(Proportions {
        x_col: x_col.to_string(),
        groups,
        dummies,
        values,
    })
}

fn bar_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    groups: &[String],
    heights: &[f64],
    x_desc: &str,
    y_desc: &str,
    color: RGBColor,
) -> Result<()> {
    let n = groups.len().max(1);
    let top = heights.iter().copied().fold(0.0, f64::max).max(f64::EPSILON) * 1.1;
    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..top)?;
    let label = |v: &f64| {
        let i = v.round();
        if (v - i).abs() < 1e-6 && i >= 0.0 {
            groups.get(i as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n + 1)
        .x_label_formatter(&label)
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;
    chart.draw_series(heights.iter().enumerate().map(|(i, &h)| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, h)], color.filled())
    }))?;
    Ok(())
}

/// Draws one bar chart per value of every prop column: the share of rows with that
/// value in each `x_col` group.
pub fn proportion_plot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    table: &Table,
    x_col: &str,
    prop_cols: &[&str],
) -> Result<Proportions> {
    let props = proportions(table, x_col, prop_cols)?;
    let grid = ColGrid::with_defaults(vec![x_col.to_string()], Some(props.dummies.clone()))?;
    grid.map(area, |panel, x, y| {
        let dummy = y.unwrap_or_default();
        let j = props.dummies.iter().position(|d| d == dummy).unwrap_or(0);
        let heights: Vec<f64> = props.values.column(j).to_vec();
        bar_panel(panel, &props.groups, &heights, x, dummy, TAB10[j % TAB10.len()])
    })?;
    Ok(props)
}

/// [`proportion_plot`] as a [`Plot`].
#[derive(Clone, Debug)]
pub struct ProportionPlot<'a> {
    pub table: &'a Table,
    pub x_col: &'a str,
    pub prop_cols: &'a [&'a str],
}

impl Plot for ProportionPlot<'_> {
    type Output = Proportions;

    fn plot<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<Proportions> {
        proportion_plot(area, self.table, self.x_col, self.prop_cols)
    }
}
