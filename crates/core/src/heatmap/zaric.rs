//! Heatmap whose cells encode a value both by colour and by size.
//!
//! Each observation is a `(row, column)` pair carrying a colour value, a size
//! value and a shape. Cell sizes are normalised with a square-root power norm and
//! shrunk inside their grid slot in whole pixels, so that small but non-zero cells
//! stay visible. Cells with zero size, a NaN colour or a set mask bit are not drawn.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use tracing::debug;

use super::axes::{
    colorbar_reserve, draw_col_labels, draw_colorbar, draw_row_labels, draw_title,
    labels_extent, px, TICK_PAD,
};
use super::geometry::{AxisOrder, CellShape, GridTransform, PlotRect};
use crate::error::{Error, Result};
use crate::render::norm::nan_extent;
use crate::render::{format_g, text_style, Colormap, PowerNorm};

/// Flattened observations, one entry per cell.
#[derive(Clone, Debug, PartialEq)]
pub struct ZaricCells {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub color: Vec<f64>,
    /// Defaults to one for every cell.
    pub size: Option<Vec<f64>>,
    /// Circles instead of rectangles; defaults to all rectangles.
    pub circular: Option<Vec<bool>>,
    pub mask: Option<Vec<bool>>,
}

impl ZaricCells {
    pub fn new(rows: Vec<String>, cols: Vec<String>, color: Vec<f64>) -> Self {
        Self {
            rows,
            cols,
            color,
            size: None,
            circular: None,
            mask: None,
        }
    }

    pub fn with_size(mut self, size: Vec<f64>) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_circular(mut self, circular: Vec<bool>) -> Self {
        self.circular = Some(circular);
        self
    }

    pub fn with_mask(mut self, mask: Vec<bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let n = self.rows.len();
        let lens = [
            Some(self.cols.len()),
            Some(self.color.len()),
            self.size.as_ref().map(Vec::len),
            self.circular.as_ref().map(Vec::len),
            self.mask.as_ref().map(Vec::len),
        ];
        for len in lens.into_iter().flatten() {
            if len != n {
                return Err(Error::LengthMismatch {
                    left: n,
                    right: len,
                });
            }
        }
        Ok(())
    }

    fn size_at(&self, i: usize) -> f64 {
        self.size.as_ref().map_or(1.0, |s| s[i])
    }

    fn is_hidden(&self, i: usize) -> bool {
        self.size_at(i) == 0.0
            || self.color[i].is_nan()
            || self.mask.as_ref().map_or(false, |m| m[i])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ZaricOptions {
    pub colormap: Colormap,
    /// Defaults to `PowerNorm(0.925)`.
    pub color_norm: Option<PowerNorm>,
    /// Scale an unscaled colour norm symmetrically around zero.
    pub scale_color_norm: bool,
    /// Defaults to `PowerNorm(0.5)`.
    pub size_norm: Option<PowerNorm>,
    /// Row labels top to bottom.
    pub row_order: Option<Vec<String>>,
    /// Column labels left to right.
    pub col_order: Option<Vec<String>>,
    pub face_color: RGBColor,
    pub wrap_x: usize,
    pub wrap_y: usize,
    pub square: bool,
    pub cbar: bool,
    pub annot: bool,
    pub annot_precision: usize,
    pub annot_font_size: f64,
    pub annot_color: RGBColor,
    /// Draw the row and column tick labels.
    pub tick_labels: bool,
    pub label_font_size: f64,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
}

impl Default for ZaricOptions {
    fn default() -> Self {
        Self {
            colormap: Colormap::coolwarm(),
            color_norm: None,
            scale_color_norm: true,
            size_norm: None,
            row_order: None,
            col_order: None,
            face_color: RGBColor(0xfd, 0xfd, 0xfd),
            wrap_x: 12,
            wrap_y: 13,
            square: true,
            cbar: true,
            annot: false,
            annot_precision: 2,
            annot_font_size: 11.0,
            annot_color: BLACK,
            tick_labels: true,
            label_font_size: 12.0,
            x_label: None,
            y_label: None,
        }
    }
}

/// A drawn cell.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedCell {
    /// Index into the input observations.
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub shape: CellShape,
    pub color: RGBColor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ZaricLayout {
    pub grid: GridTransform,
    pub rows: AxisOrder,
    pub cols: AxisOrder,
    pub cells: Vec<PlacedCell>,
    pub color_norm: PowerNorm,
    pub size_norm: PowerNorm,
    pub colorbar: Option<PlotRect>,
}

fn resolve_color_norm(cells: &ZaricCells, options: &ZaricOptions) -> PowerNorm {
    let mut norm = options.color_norm.unwrap_or(PowerNorm::new(0.925));
    if options.scale_color_norm && !norm.scaled() {
        if let (Some(lo), Some(hi)) = nan_extent(&cells.color) {
            let vmax = lo.abs().max(hi.abs());
            norm.vmin = Some(-vmax);
            norm.vmax = Some(vmax);
        }
    }
    if !norm.scaled() {
        let shown: Vec<f64> = (0..cells.len())
            .filter(|&i| !cells.is_hidden(i))
            .map(|i| cells.color[i])
            .collect();
        norm.autoscale_none(&shown);
    }
    norm
}

fn resolve_size_norm(cells: &ZaricCells, options: &ZaricOptions) -> PowerNorm {
    let mut norm = options.size_norm.unwrap_or(PowerNorm::new(0.5));
    let sizes: Vec<f64> = (0..cells.len()).map(|i| cells.size_at(i)).collect();
    norm.autoscale_none(&sizes);
    norm
}

fn position(axis: &AxisOrder, label: &str, which: &str) -> Result<usize> {
    axis.position(label)
        .ok_or_else(|| Error::Shape(format!("label {label:?} is missing from the {which} order")))
}

/// Computes the grid, label placement and every visible cell for a canvas of `dim` pixels.
pub fn layout_zaric(
    cells: &ZaricCells,
    options: &ZaricOptions,
    dim: (u32, u32),
) -> Result<ZaricLayout> {
    cells.validate()?;
    if cells.is_empty() {
        return Err(Error::EmptyInput("heatmap has no cells".into()));
    }

    let cols = AxisOrder::columns(&cells.cols, options.col_order.as_deref(), options.wrap_x);
    let rows = AxisOrder::rows(&cells.rows, options.row_order.as_deref(), options.wrap_y);
    if cols.is_empty() || rows.is_empty() {
        return Err(Error::EmptyInput("heatmap has no rows or columns".into()));
    }

    let color_norm = resolve_color_norm(cells, options);
    let size_norm = resolve_size_norm(cells, options);

    let font = options.label_font_size;
    let (row_w, _) = labels_extent(&rows.wrapped, font);
    // rotated column labels: text width becomes height
    let (col_h, _) = labels_extent(&cols.wrapped, font);
    let title = font * 1.5;

    let left = row_w + 2.0 * TICK_PAD + options.y_label.as_ref().map_or(0.0, |_| title);
    let top = col_h + 2.0 * TICK_PAD;
    let bottom = col_h + 2.0 * TICK_PAD + options.x_label.as_ref().map_or(0.0, |_| title);
    let right = if options.cbar {
        colorbar_reserve(&color_norm, font)
    } else {
        TICK_PAD
    };

    let (w, h) = (dim.0 as f64, dim.1 as f64);
    if w - left - right <= 0.0 || h - top - bottom <= 0.0 {
        return Err(Error::Render(format!(
            "canvas of {}x{} pixels is too small for the heatmap labels",
            dim.0, dim.1
        )));
    }
    let region = PlotRect {
        left,
        top,
        width: w - left - right,
        height: h - top - bottom,
    };
    let grid = GridTransform::new(
        PlotRect::fit(region, cols.len(), rows.len(), options.square),
        cols.len(),
        rows.len(),
    );

    let mut placed = Vec::new();
    for i in 0..cells.len() {
        if cells.is_hidden(i) {
            continue;
        }
        let col = position(&cols, &cells.cols[i], "column")?;
        let row = position(&rows, &cells.rows[i], "row")?;
        let fraction = size_norm.apply(cells.size_at(i));
        let circular = cells.circular.as_ref().map_or(false, |c| c[i]);
        placed.push(PlacedCell {
            index: i,
            row,
            col,
            shape: grid.cell_shape(col, row, fraction, circular, options.square),
            color: options.colormap.sample(color_norm.apply(cells.color[i])),
        });
    }
    debug!(
        cells = cells.len(),
        drawn = placed.len(),
        rows = rows.len(),
        cols = cols.len(),
        "zaric layout"
    );

    let colorbar = options.cbar.then(|| PlotRect {
        left: grid.rect.right(),
        top: grid.rect.top,
        width: right,
        height: grid.rect.height,
    });

    Ok(ZaricLayout {
        grid,
        rows,
        cols,
        cells: placed,
        color_norm,
        size_norm,
        colorbar,
    })
}

/// Draws the cells onto `area`.
pub fn draw_zaric<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    cells: &ZaricCells,
    options: &ZaricOptions,
) -> Result<ZaricLayout> {
    let layout = layout_zaric(cells, options, area.dim_in_pixel())?;
    let grid = &layout.grid;
    let rect = grid.rect;

    area.draw(&Rectangle::new(
        [px((rect.left, rect.top)), px((rect.right(), rect.bottom()))],
        options.face_color.filled(),
    ))?;

    // minor grid on cell borders
    let grid_style = RGBColor(176, 176, 176).stroke_width(1);
    for xi in 0..=grid.nx {
        let (x, _) = grid.to_pixel(xi as f64 - 0.5, 0.0);
        area.draw(&PathElement::new(
            vec![px((x, rect.top)), px((x, rect.bottom()))],
            grid_style,
        ))?;
    }
    for yi in 0..=grid.ny {
        let (_, y) = grid.to_pixel(0.0, yi as f64 - 0.5);
        area.draw(&PathElement::new(
            vec![px((rect.left, y)), px((rect.right(), y))],
            grid_style,
        ))?;
    }

    for cell in &layout.cells {
        draw_shape(area, &cell.shape, cell.color)?;
    }

    if options.annot {
        let style = text_style(
            options.annot_font_size,
            options.annot_color,
            HPos::Center,
            VPos::Center,
        );
        for cell in &layout.cells {
            let label = format_g(cells.color[cell.index], options.annot_precision);
            area.draw(&Text::new(label, px(cell.shape.center()), style.clone()))?;
        }
    }

    let font = options.label_font_size;
    if options.tick_labels {
        draw_row_labels(area, grid, &layout.rows.wrapped, font, false)?;
        draw_col_labels(area, grid, &layout.cols.wrapped, font, true)?;
        draw_col_labels(area, grid, &layout.cols.wrapped, font, false)?;
    }

    if let Some(label) = &options.x_label {
        let (col_h, _) = labels_extent(&layout.cols.wrapped, font);
        let y = rect.bottom() + col_h + 2.0 * TICK_PAD + font * 0.75;
        draw_title(area, label, (rect.left + rect.width / 2.0, y), font, false)?;
    }
    if let Some(label) = &options.y_label {
        let (row_w, _) = labels_extent(&layout.rows.wrapped, font);
        let x = rect.left - row_w - 2.0 * TICK_PAD - font * 0.75;
        draw_title(area, label, (x, rect.top + rect.height / 2.0), font, true)?;
    }

    if let Some(region) = layout.colorbar {
        draw_colorbar(area, region, &options.colormap, &layout.color_norm, font)?;
    }
    Ok(layout)
}

pub(crate) fn draw_shape<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    shape: &CellShape,
    color: RGBColor,
) -> Result<()> {
    match *shape {
        CellShape::Circle { center, radius } => {
            area.draw(&Circle::new(
                px(center),
                radius.round().max(0.0) as i32,
                color.filled(),
            ))?;
        }
        CellShape::Rect {
            top_left,
            bottom_right,
        } => {
            area.draw(&Rectangle::new(
                [px(top_left), px(bottom_right)],
                color.filled(),
            ))?;
        }
    }
    Ok(())
}
