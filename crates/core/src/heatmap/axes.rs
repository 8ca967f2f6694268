//! Tick labels, axis titles and colour bars shared by the heatmap renderers.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use super::geometry::{GridTransform, PlotRect};
use crate::error::Result;
use crate::render::{format_g, text_style, Colormap, PowerNorm, FONT_FAMILY};

pub(crate) const TICK_PAD: f64 = 5.0;
pub(crate) const COLORBAR_WIDTH: f64 = 18.0;
pub(crate) const COLORBAR_TICKS: usize = 5;
const CHAR_ASPECT: f64 = 0.6;
const LINE_SPACING: f64 = 1.2;

pub(crate) fn px(p: (f64, f64)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

/// Approximate width and height of possibly multi-line text.
pub(crate) fn text_extent(text: &str, size: f64) -> (f64, f64) {
    let lines: Vec<&str> = text.split('\n').collect();
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    (
        longest as f64 * size * CHAR_ASPECT,
        lines.len() as f64 * size * LINE_SPACING,
    )
}

/// The largest extent over `labels`.
pub(crate) fn labels_extent(labels: &[String], size: f64) -> (f64, f64) {
    labels
        .iter()
        .map(|l| text_extent(l, size))
        .fold((0.0, 0.0), |(w, h), (lw, lh)| (w.max(lw), h.max(lh)))
}

/// Row tick labels, one per grid row, drawn beside the plot rectangle.
pub(crate) fn draw_row_labels<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    grid: &GridTransform,
    wrapped: &[String],
    size: f64,
    right_side: bool,
) -> Result<()> {
    let (x, h) = if right_side {
        (grid.rect.right() + TICK_PAD, HPos::Left)
    } else {
        (grid.rect.left - TICK_PAD, HPos::Right)
    };
    let style = text_style(size, BLACK, h, VPos::Center);
    for (yi, label) in wrapped.iter().enumerate() {
        let (_, cy) = grid.cell_center(0, yi);
        let lines: Vec<&str> = label.split('\n').collect();
        let first = cy - (lines.len() as f64 - 1.0) * size * LINE_SPACING / 2.0;
        for (k, line) in lines.iter().enumerate() {
            let y = first + k as f64 * size * LINE_SPACING;
            area.draw(&Text::new(line.to_string(), px((x, y)), style.clone()))?;
        }
    }
    Ok(())
}

/// Column tick labels rotated to read upwards, above or below the plot rectangle.
pub(crate) fn draw_col_labels<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    grid: &GridTransform,
    wrapped: &[String],
    size: f64,
    above: bool,
) -> Result<()> {
    let font = (FONT_FAMILY, size)
        .into_font()
        .transform(FontTransform::Rotate270);
    let (y, h) = if above {
        (grid.rect.top - TICK_PAD, HPos::Left)
    } else {
        (grid.rect.bottom() + TICK_PAD, HPos::Right)
    };
    let style = TextStyle::from(font)
        .color(&BLACK)
        .pos(Pos::new(h, VPos::Center));
    for (xi, label) in wrapped.iter().enumerate() {
        let (cx, _) = grid.cell_center(xi, 0);
        let lines: Vec<&str> = label.split('\n').collect();
        let first = cx - (lines.len() as f64 - 1.0) * size * LINE_SPACING / 2.0;
        for (k, line) in lines.iter().enumerate() {
            let x = first + k as f64 * size * LINE_SPACING;
            area.draw(&Text::new(line.to_string(), px((x, y)), style.clone()))?;
        }
    }
    Ok(())
}

pub(crate) fn draw_title<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    text: &str,
    at: (f64, f64),
    size: f64,
    vertical: bool,
) -> Result<()> {
    let mut font = (FONT_FAMILY, size).into_font();
    if vertical {
        font = font.transform(FontTransform::Rotate270);
    }
    let style = TextStyle::from(font)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(text.to_string(), px(at), style))?;
    Ok(())
}

/// Width reserved on the right for a colour bar and its tick labels.
pub(crate) fn colorbar_reserve(norm: &PowerNorm, size: f64) -> f64 {
    let labels: Vec<String> = colorbar_ticks(norm)
        .into_iter()
        .map(|v| format_g(v, 2))
        .collect();
    3.0 * TICK_PAD + COLORBAR_WIDTH + labels_extent(&labels, size).0
}

fn colorbar_ticks(norm: &PowerNorm) -> Vec<f64> {
    match (norm.vmin, norm.vmax) {
        (Some(lo), Some(hi)) if hi > lo => (0..COLORBAR_TICKS)
            .map(|k| lo + (hi - lo) * k as f64 / (COLORBAR_TICKS - 1) as f64)
            .collect(),
        (Some(lo), _) => vec![lo],
        _ => Vec::new(),
    }
}

/// Vertical colour bar filling `region`, low values at the bottom.
pub(crate) fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    region: PlotRect,
    cmap: &Colormap,
    norm: &PowerNorm,
    size: f64,
) -> Result<()> {
    let left = region.left + TICK_PAD;
    let right = left + COLORBAR_WIDTH;
    let rows = region.height.round().max(1.0) as i32;
    for k in 0..rows {
        let t = 1.0 - (k as f64 + 0.5) / rows as f64;
        let y = region.top + k as f64;
        area.draw(&Rectangle::new(
            [px((left, y)), px((right, y + 1.0))],
            cmap.sample(t).filled(),
        ))?;
    }
    area.draw(&Rectangle::new(
        [px((left, region.top)), px((right, region.bottom()))],
        BLACK.stroke_width(1),
    ))?;

    let style = text_style(size, BLACK, HPos::Left, VPos::Center);
    for value in colorbar_ticks(norm) {
        let t = norm.apply(value);
        if !t.is_finite() {
            continue;
        }
        let y = region.bottom() - t.clamp(0.0, 1.0) * region.height;
        area.draw(&PathElement::new(
            vec![px((right, y)), px((right + 3.0, y))],
            BLACK.stroke_width(1),
        ))?;
        area.draw(&Text::new(
            format_g(value, 2),
            px((right + TICK_PAD, y)),
            style.clone(),
        ))?;
    }
    Ok(())
}
