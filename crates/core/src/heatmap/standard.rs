//! Uniform-cell heatmap with a diverging colour scale centred on zero.

use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};

use super::axes::{
    colorbar_reserve, draw_col_labels, draw_colorbar, draw_row_labels, draw_title,
    labels_extent, px, TICK_PAD,
};
use super::geometry::{GridTransform, PlotRect};
use super::LabeledMatrix;
use crate::error::{Error, Result};
use crate::render::{format_g, text_style, Colormap, PowerNorm};

#[derive(Clone, Debug)]
pub(crate) struct StandardStyle<'a> {
    pub colormap: &'a Colormap,
    pub annot: bool,
    pub precision: usize,
    pub annot_font_size: f64,
    pub tick_labels: bool,
    pub label_font_size: f64,
    pub face_color: RGBColor,
    pub cbar: bool,
    pub square: bool,
    /// Row labels on the right side of the grid.
    pub labels_right: bool,
    /// Extra space kept free left of and above the grid.
    pub reserve_left: f64,
    pub reserve_top: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StandardLayout {
    pub grid: GridTransform,
    pub norm: PowerNorm,
}

/// Linear norm symmetric around zero over the visible values.
pub(crate) fn centered_norm(values: &Array2<f64>, hidden: impl Fn(usize, usize) -> bool) -> PowerNorm {
    let mut range: f64 = 0.0;
    for ((i, j), &v) in values.indexed_iter() {
        if v.is_finite() && !hidden(i, j) {
            range = range.max(v.abs());
        }
    }
    if range == 0.0 {
        range = 1.0;
    }
    PowerNorm::with_range(1.0, -range, range)
}

/// WCAG relative luminance.
fn luminance(c: RGBColor) -> f64 {
    let lin = |v: u8| {
        let v = v as f64 / 255.0;
        if v <= 0.03928 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * lin(c.0) + 0.7152 * lin(c.1) + 0.0722 * lin(c.2)
}

pub(crate) fn annot_color(cell: RGBColor) -> RGBColor {
    if luminance(cell) > 0.408 {
        RGBColor(38, 38, 38)
    } else {
        WHITE
    }
}

pub(crate) fn draw_standard<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    matrix: &LabeledMatrix,
    mask: Option<&Array2<bool>>,
    style: &StandardStyle,
) -> Result<StandardLayout> {
    let (ny, nx) = matrix.values.dim();
    if nx == 0 || ny == 0 {
        return Err(Error::EmptyInput("heatmap has no cells".into()));
    }
    let hidden = |i: usize, j: usize| {
        matrix.values[[i, j]].is_nan() || mask.map_or(false, |m| m[[i, j]])
    };
    let norm = centered_norm(&matrix.values, &hidden);

    let font = style.label_font_size;
    let title = font * 1.5;
    let (row_w, _) = labels_extent(&matrix.row_labels, font);
    let (col_h, _) = labels_extent(&matrix.col_labels, font);
    let row_side = row_w + 2.0 * TICK_PAD + matrix.row_name.as_ref().map_or(0.0, |_| title);

    let mut left = style.reserve_left + TICK_PAD;
    let mut right = if style.cbar {
        colorbar_reserve(&norm, font)
    } else {
        TICK_PAD
    };
    if style.labels_right {
        right += row_side;
    } else {
        left += row_side;
    }
    let top = style.reserve_top + TICK_PAD;
    let bottom = col_h + 2.0 * TICK_PAD + matrix.col_name.as_ref().map_or(0.0, |_| title);

    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as f64, h as f64);
    if w - left - right <= 0.0 || h - top - bottom <= 0.0 {
        return Err(Error::Render(format!(
            "canvas of {w}x{h} pixels is too small for the heatmap labels"
        )));
    }
    let region = PlotRect {
        left,
        top,
        width: w - left - right,
        height: h - top - bottom,
    };
    let grid = GridTransform::new(PlotRect::fit(region, nx, ny, style.square), nx, ny);
    let rect = grid.rect;

    area.draw(&Rectangle::new(
        [px((rect.left, rect.top)), px((rect.right(), rect.bottom()))],
        style.face_color.filled(),
    ))?;

    let text = |c| text_style(style.annot_font_size, c, HPos::Center, VPos::Center);
    for i in 0..ny {
        // first matrix row on top
        let yi = ny - 1 - i;
        for j in 0..nx {
            if hidden(i, j) {
                continue;
            }
            let v = matrix.values[[i, j]];
            let color = style.colormap.sample(norm.apply(v));
            let tl = grid.to_pixel(j as f64 - 0.5, yi as f64 + 0.5);
            let br = grid.to_pixel(j as f64 + 0.5, yi as f64 - 0.5);
            area.draw(&Rectangle::new([px(tl), px(br)], color.filled()))?;
            area.draw(&Rectangle::new([px(tl), px(br)], WHITE.stroke_width(1)))?;
            if style.annot {
                area.draw(&Text::new(
                    format_g(v, style.precision),
                    px(grid.cell_center(j, yi)),
                    text(annot_color(color)),
                ))?;
            }
        }
    }

    if style.tick_labels {
        let rows_bottom_up: Vec<String> = matrix.row_labels.iter().rev().cloned().collect();
        draw_row_labels(area, &grid, &rows_bottom_up, font, style.labels_right)?;
        draw_col_labels(area, &grid, &matrix.col_labels, font, false)?;
    }

    if let Some(name) = &matrix.col_name {
        let y = rect.bottom() + col_h + 2.0 * TICK_PAD + font * 0.75;
        draw_title(area, name, (rect.left + rect.width / 2.0, y), font, false)?;
    }
    if let Some(name) = &matrix.row_name {
        let offset = row_w + 2.0 * TICK_PAD + font * 0.75;
        let x = if style.labels_right {
            rect.right() + offset
        } else {
            rect.left - offset
        };
        draw_title(area, name, (x, rect.top + rect.height / 2.0), font, true)?;
    }

    if style.cbar {
        let bar_left = if style.labels_right {
            rect.right() + row_side
        } else {
            rect.right()
        };
        let region = PlotRect {
            left: bar_left,
            top: rect.top,
            width: right,
            height: rect.height,
        };
        draw_colorbar(area, region, style.colormap, &norm, font)?;
    }

    Ok(StandardLayout { grid, norm })
}
