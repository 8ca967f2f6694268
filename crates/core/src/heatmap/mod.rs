//! Heatmaps of labelled matrices and of association matrices.

pub(crate) mod axes;
pub mod cluster;
mod dendrogram;
pub mod geometry;
mod standard;
pub mod zaric;

use ndarray::{Array2, ArrayView2, Axis};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::debug;

use crate::corr::{corr, Associations, CorrOptions, CorrType};
use crate::error::{Error, Result};
use crate::render::Plot;
use crate::table::Table;

pub use cluster::{leaves_order, linkage, Merge, Method, Metric};
pub use standard::StandardLayout;
pub use zaric::{draw_zaric, layout_zaric, ZaricCells, ZaricLayout, ZaricOptions};

use dendrogram::draw_clustermap;
use standard::{draw_standard, StandardStyle};

/// A matrix with labelled rows and columns.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledMatrix {
    pub row_name: Option<String>,
    pub col_name: Option<String>,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub values: Array2<f64>,
}

impl LabeledMatrix {
    pub fn new(row_labels: Vec<String>, col_labels: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (row_labels.len(), col_labels.len()) {
            return Err(Error::Shape(format!(
                "{}x{} labels for a {:?} matrix",
                row_labels.len(),
                col_labels.len(),
                values.dim()
            )));
        }
        Ok(Self {
            row_name: None,
            col_name: None,
            row_labels,
            col_labels,
            values,
        })
    }

    pub fn from_associations(assoc: &Associations) -> Self {
        Self {
            row_name: None,
            col_name: None,
            row_labels: assoc.labels.clone(),
            col_labels: assoc.labels.clone(),
            values: assoc.values.clone(),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn select_rows(&self, order: &[usize]) -> Self {
        Self {
            row_labels: order.iter().map(|&i| self.row_labels[i].clone()).collect(),
            values: self.values.select(Axis(0), order),
            ..self.clone()
        }
    }

    pub fn select_cols(&self, order: &[usize]) -> Self {
        Self {
            col_labels: order.iter().map(|&j| self.col_labels[j].clone()).collect(),
            values: self.values.select(Axis(1), order),
            ..self.clone()
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    /// Cells sized and coloured by value.
    #[default]
    Zaric,
    Standard,
    /// Standard cells with both axes clustered and dendrograms drawn.
    Dendrograms,
}

/// How to cluster one axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterSpec {
    pub metric: Metric,
    pub method: Method,
    /// Use this tree instead of computing one.
    pub linkage: Option<Vec<Merge>>,
}

impl ClusterSpec {
    pub fn new(metric: Metric, method: Method) -> Self {
        Self {
            metric,
            method,
            linkage: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapOptions {
    pub map_type: MapType,
    /// Defaults to off for zaric maps and on otherwise.
    pub annot: Option<bool>,
    pub cbar: bool,
    pub square: bool,
    /// Background behind masked cells; defaults to near-white for zaric maps and black otherwise.
    pub face_color: Option<RGBColor>,
    pub row_cluster: Option<ClusterSpec>,
    pub col_cluster: Option<ClusterSpec>,
    /// Zaric cell styling; the colormap, precision and font sizes apply to every map type.
    pub zaric: ZaricOptions,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            map_type: MapType::Zaric,
            annot: None,
            cbar: true,
            square: true,
            face_color: None,
            row_cluster: None,
            col_cluster: None,
            zaric: ZaricOptions::default(),
        }
    }
}

/// Checks that `merges` is a complete merge tree over `n` leaves: every id
/// exists when it is used and is consumed exactly once.
fn validate_linkage(merges: &[Merge], n: usize) -> Result<()> {
    let malformed = |why: String| {
        Err(Error::Shape(format!(
            "linkage with {} merges does not describe {n} observations: {why}",
            merges.len()
        )))
    };
    if merges.len() + 1 != n {
        return malformed("wrong number of merges".into());
    }
    let mut used = vec![false; n + merges.len()];
    for (k, m) in merges.iter().enumerate() {
        for id in [m.left, m.right] {
            if id >= n + k {
                return malformed(format!("merge {k} refers to cluster {id} before it is formed"));
            }
            if used[id] {
                return malformed(format!("cluster {id} is merged twice"));
            }
            used[id] = true;
        }
    }
    Ok(())
}

pub(crate) fn cluster_merges(data: ArrayView2<f64>, spec: &ClusterSpec) -> Result<Vec<Merge>> {
    let n = data.nrows();
    match &spec.linkage {
        Some(merges) => {
            validate_linkage(merges, n)?;
            Ok(merges.clone())
        }
        None => linkage(data, spec.metric, spec.method),
    }
}

/// Leaf order of the clustered rows of `data`.
pub fn cluster_order(data: ArrayView2<f64>, spec: &ClusterSpec) -> Result<Vec<usize>> {
    let merges = cluster_merges(data, spec)?;
    Ok(leaves_order(&merges, data.nrows()))
}

/// A matrix with its mask and pair kinds permuted alike.
#[derive(Clone, Debug, PartialEq)]
pub struct Reordered {
    pub matrix: LabeledMatrix,
    pub mask: Option<Array2<bool>>,
    pub kinds: Option<Array2<Option<CorrType>>>,
}

/// Applies the row and column clustering in `options`, permuting mask and kinds with the matrix.
pub fn cluster_reorder(
    matrix: &LabeledMatrix,
    kinds: Option<&Array2<Option<CorrType>>>,
    mask: Option<&Array2<bool>>,
    options: &HeatmapOptions,
) -> Result<Reordered> {
    let mut out = Reordered {
        matrix: matrix.clone(),
        mask: mask.cloned(),
        kinds: kinds.cloned(),
    };

    if let Some(spec) = &options.row_cluster {
        let order = cluster_order(out.matrix.values.view(), spec)?;
        debug!(?order, "row clustering");
        out.matrix = out.matrix.select_rows(&order);
        out.mask = out.mask.map(|m| m.select(Axis(0), &order));
        out.kinds = out.kinds.map(|k| k.select(Axis(0), &order));
    }
    if let Some(spec) = &options.col_cluster {
        let order = cluster_order(out.matrix.values.t(), spec)?;
        debug!(?order, "column clustering");
        out.matrix = out.matrix.select_cols(&order);
        out.mask = out.mask.map(|m| m.select(Axis(1), &order));
        out.kinds = out.kinds.map(|k| k.select(Axis(1), &order));
    }
    Ok(out)
}

/// Flattens a matrix row by row into zaric observations: colour is the value,
/// size its magnitude, and numeric pairs are drawn as circles.
pub fn zaric_cells(
    matrix: &LabeledMatrix,
    kinds: Option<&Array2<Option<CorrType>>>,
    mask: Option<&Array2<bool>>,
) -> ZaricCells {
    let (nr, nc) = matrix.dim();
    let mut rows = Vec::with_capacity(nr * nc);
    let mut cols = Vec::with_capacity(nr * nc);
    for r in &matrix.row_labels {
        for c in &matrix.col_labels {
            rows.push(r.clone());
            cols.push(c.clone());
        }
    }
    let color: Vec<f64> = matrix.values.iter().copied().collect();
    let size = color.iter().map(|v| v.abs()).collect();
    let circular = match kinds {
        Some(k) => k.iter().map(|t| *t == Some(CorrType::NumVsNum)).collect(),
        None => vec![false; nr * nc],
    };
    let cells = ZaricCells::new(rows, cols, color)
        .with_size(size)
        .with_circular(circular);
    match mask {
        Some(m) => cells.with_mask(m.iter().copied().collect()),
        None => cells,
    }
}

fn check_shape<T>(name: &str, array: Option<&Array2<T>>, dim: (usize, usize)) -> Result<()> {
    match array {
        Some(a) if a.dim() != dim => Err(Error::Shape(format!(
            "{name} has shape {:?}, expected {dim:?}",
            a.dim()
        ))),
        _ => Ok(()),
    }
}

fn standard_style<'a>(options: &'a HeatmapOptions, annot: bool) -> StandardStyle<'a> {
    StandardStyle {
        colormap: &options.zaric.colormap,
        annot,
        precision: options.zaric.annot_precision,
        annot_font_size: options.zaric.annot_font_size,
        tick_labels: options.zaric.tick_labels,
        label_font_size: options.zaric.label_font_size,
        face_color: options.face_color.unwrap_or(BLACK),
        cbar: options.cbar,
        square: options.square,
        labels_right: false,
        reserve_left: 0.0,
        reserve_top: 0.0,
    }
}

/// Draws `matrix` as a heatmap and returns the matrix in the order it was drawn.
///
/// `kinds` marks numeric pairs, drawn as circles in zaric maps; `mask` hides cells.
pub fn heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    matrix: &LabeledMatrix,
    kinds: Option<&Array2<Option<CorrType>>>,
    mask: Option<&Array2<bool>>,
    options: &HeatmapOptions,
) -> Result<LabeledMatrix> {
    let dim = matrix.dim();
    check_shape("mask", mask, dim)?;
    check_shape("pair kinds", kinds, dim)?;
    debug!(map_type = %options.map_type, rows = dim.0, cols = dim.1, "drawing heatmap");

    match options.map_type {
        MapType::Zaric => {
            let r = cluster_reorder(matrix, kinds, mask, options)?;
            let cells = zaric_cells(&r.matrix, r.kinds.as_ref(), r.mask.as_ref());
            let mut zaric = options.zaric.clone();
            zaric.annot = options.annot.unwrap_or(false);
            zaric.cbar = options.cbar;
            zaric.square = options.square;
            if let Some(face) = options.face_color {
                zaric.face_color = face;
            }
            zaric.row_order = Some(r.matrix.row_labels.clone());
            zaric.col_order = Some(r.matrix.col_labels.clone());
            zaric.x_label = r.matrix.col_name.clone();
            zaric.y_label = r.matrix.row_name.clone();
            draw_zaric(area, &cells, &zaric)?;
            Ok(r.matrix)
        }
        MapType::Standard => {
            let r = cluster_reorder(matrix, kinds, mask, options)?;
            let style = standard_style(options, options.annot.unwrap_or(true));
            draw_standard(area, &r.matrix, r.mask.as_ref(), &style)?;
            Ok(r.matrix)
        }
        MapType::Dendrograms => {
            let default = ClusterSpec::default();
            let rows = options.row_cluster.as_ref().unwrap_or(&default);
            let cols = options.col_cluster.as_ref().unwrap_or(&default);
            let style = StandardStyle {
                square: false,
                ..standard_style(options, options.annot.unwrap_or(true))
            };
            let map = draw_clustermap(area, matrix, mask, rows, cols, &style)?;
            debug!(grid = ?map.layout.grid, "clustermap drawn");
            Ok(map.matrix)
        }
    }
}

/// Sets the mask wherever the p-value is at least `p_bound`.
pub fn mask_significance(mask: &mut Array2<bool>, pvalues: &Array2<f64>, p_bound: f64) {
    mask.zip_mut_with(pvalues, |m, &p| {
        if p >= p_bound {
            *m = true;
        }
    });
}

pub fn mask_diagonal(mask: &mut Array2<bool>) {
    mask.diag_mut().fill(true);
}

#[derive(Clone, Debug, PartialEq)]
pub struct CorrHeatmapOptions {
    pub mask_diagonal: bool,
    /// Hide cells whose p-value is at least this bound.
    pub p_bound: Option<f64>,
    /// Cells hidden up front; copied, never modified.
    pub mask: Option<Array2<bool>>,
    pub heatmap: HeatmapOptions,
}

impl Default for CorrHeatmapOptions {
    fn default() -> Self {
        Self {
            mask_diagonal: true,
            p_bound: None,
            mask: None,
            heatmap: HeatmapOptions::default(),
        }
    }
}

/// Builds the mask for an association matrix from the caller's mask, the p-value bound
/// and the diagonal setting.
pub fn corr_mask(assoc: &Associations, options: &CorrHeatmapOptions) -> Result<Array2<bool>> {
    let n = assoc.len();
    let mut mask = match &options.mask {
        Some(m) => {
            check_shape("mask", Some(m), (n, n))?;
            m.clone()
        }
        None => Array2::from_elem((n, n), false),
    };
    if let Some(bound) = options.p_bound {
        mask_significance(&mut mask, &assoc.pvalues, bound);
    }
    if options.mask_diagonal {
        mask_diagonal(&mut mask);
    }
    Ok(mask)
}

/// Computes associations over `table` and draws them as a heatmap.
pub fn corr_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    table: &Table,
    corr_options: &CorrOptions,
    options: &CorrHeatmapOptions,
) -> Result<Associations> {
    let assoc = corr(table, corr_options)?;
    let mask = corr_mask(&assoc, options)?;
    heatmap(
        area,
        &LabeledMatrix::from_associations(&assoc),
        Some(&assoc.kinds),
        Some(&mask),
        &options.heatmap,
    )?;
    Ok(assoc)
}

/// A heatmap of a labelled matrix, for use with [`crate::render::save`].
#[derive(Clone, Debug)]
pub struct HeatmapPlot<'a> {
    pub matrix: &'a LabeledMatrix,
    pub kinds: Option<&'a Array2<Option<CorrType>>>,
    pub mask: Option<&'a Array2<bool>>,
    pub options: &'a HeatmapOptions,
}

impl Plot for HeatmapPlot<'_> {
    type Output = LabeledMatrix;

    fn plot<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<LabeledMatrix> {
        heatmap(area, self.matrix, self.kinds, self.mask, self.options)
    }
}

/// Association heatmap of a table, for use with [`crate::render::save`].
#[derive(Clone, Debug)]
pub struct CorrHeatmapPlot<'a> {
    pub table: &'a Table,
    pub corr: &'a CorrOptions,
    pub options: &'a CorrHeatmapOptions,
}

impl Plot for CorrHeatmapPlot<'_> {
    type Output = Associations;

    fn plot<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<Associations> {
        corr_heatmap(area, self.table, self.corr, self.options)
    }
}
