//! Clustered heatmap with row and column dendrograms.

use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::axes::{px, TICK_PAD};
use super::cluster::{dendrogram_links, leaves_order, Link, Merge};
use super::geometry::GridTransform;
use super::standard::{draw_standard, StandardLayout, StandardStyle};
use super::{cluster_merges, ClusterSpec, LabeledMatrix};
use crate::error::Result;

const DENDROGRAM_SHARE: f64 = 0.15;

pub(crate) struct Clustermap {
    pub matrix: LabeledMatrix,
    pub layout: StandardLayout,
}

pub(crate) fn draw_clustermap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    matrix: &LabeledMatrix,
    mask: Option<&Array2<bool>>,
    rows: &ClusterSpec,
    cols: &ClusterSpec,
    style: &StandardStyle,
) -> Result<Clustermap> {
    let (ny, nx) = matrix.values.dim();
    let row_merges = cluster_merges(matrix.values.view(), rows)?;
    let col_merges = cluster_merges(matrix.values.t(), cols)?;
    let row_order = leaves_order(&row_merges, ny);
    let col_order = leaves_order(&col_merges, nx);

    let ordered = matrix.select_rows(&row_order).select_cols(&col_order);
    let mask = mask.map(|m| {
        m.select(ndarray::Axis(0), &row_order)
            .select(ndarray::Axis(1), &col_order)
    });

    let (w, h) = area.dim_in_pixel();
    let style = StandardStyle {
        labels_right: true,
        reserve_left: w as f64 * DENDROGRAM_SHARE,
        reserve_top: h as f64 * DENDROGRAM_SHARE,
        ..style.clone()
    };
    let layout = draw_standard(area, &ordered, mask.as_ref(), &style)?;

    draw_row_dendrogram(area, &layout.grid, &row_merges, ny, style.reserve_left)?;
    draw_col_dendrogram(area, &layout.grid, &col_merges, nx, style.reserve_top)?;

    Ok(Clustermap {
        matrix: ordered,
        layout,
    })
}

fn max_height(merges: &[Merge]) -> f64 {
    merges
        .iter()
        .map(|m| m.distance)
        .fold(0.0, f64::max)
        .max(f64::MIN_POSITIVE)
}

fn draw_links<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    links: &[Link],
    to_pixel: impl Fn(f64, f64) -> (f64, f64),
) -> Result<()> {
    let style = BLACK.stroke_width(1);
    for link in links {
        let points = vec![
            px(to_pixel(link.left.0, link.left.1)),
            px(to_pixel(link.left.0, link.height)),
            px(to_pixel(link.right.0, link.height)),
            px(to_pixel(link.right.0, link.right.1)),
        ];
        area.draw(&PathElement::new(points, style))?;
    }
    Ok(())
}

/// Leaves face the grid; the root points left.
fn draw_row_dendrogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    grid: &GridTransform,
    merges: &[Merge],
    n: usize,
    width: f64,
) -> Result<()> {
    let links = dendrogram_links(merges, n);
    let span = (width - 2.0 * TICK_PAD).max(1.0);
    let scale = span / max_height(merges);
    let base = grid.rect.left - TICK_PAD;
    draw_links(area, &links, |pos, height| {
        // leaf k is matrix row k, drawn k rows below the top
        let (_, y) = grid.to_pixel(0.0, (n - 1) as f64 - pos);
        (base - height * scale, y)
    })
}

/// Leaves face the grid; the root points up.
fn draw_col_dendrogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    grid: &GridTransform,
    merges: &[Merge],
    n: usize,
    height: f64,
) -> Result<()> {
    let links = dendrogram_links(merges, n);
    let span = (height - 2.0 * TICK_PAD).max(1.0);
    let scale = span / max_height(merges);
    let base = grid.rect.top - TICK_PAD;
    draw_links(area, &links, |pos, h| {
        let (x, _) = grid.to_pixel(pos, 0.0);
        (x, base - h * scale)
    })
}
