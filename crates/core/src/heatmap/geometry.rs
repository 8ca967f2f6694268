//! Pixel geometry of heatmap grids and variable-size cells.

use std::collections::{BTreeSet, HashMap};

use crate::render::wrap_label;

/// Placement of labels along one axis, index 0 at the left (columns) or bottom (rows).
#[derive(Clone, Debug, PartialEq)]
pub struct AxisOrder {
    pub labels: Vec<String>,
    pub wrapped: Vec<String>,
    index: HashMap<String, usize>,
}

impl AxisOrder {
    fn from_labels(labels: Vec<String>, wrap: usize) -> Self {
        let wrapped = labels.iter().map(|l| wrap_label(l, wrap)).collect();
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self {
            labels,
            wrapped,
            index,
        }
    }

    /// Column axis: the explicit order left to right, or labels in descending order.
    pub fn columns(values: &[String], order: Option<&[String]>, wrap: usize) -> Self {
        let labels = match order {
            Some(order) => order.to_vec(),
            None => unique_sorted(values).into_iter().rev().collect(),
        };
        Self::from_labels(labels, wrap)
    }

    /// Row axis: the explicit order top to bottom, or labels ascending from the bottom.
    pub fn rows(values: &[String], order: Option<&[String]>, wrap: usize) -> Self {
        let labels = match order {
            Some(order) => order.iter().rev().cloned().collect(),
            None => unique_sorted(values),
        };
        Self::from_labels(labels, wrap)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }
}

fn unique_sorted(values: &[String]) -> Vec<String> {
    values
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Plot rectangle in pixels, y growing downwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotRect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Fits an `nx` by `ny` grid into the region, with square cells when `square`.
    pub fn fit(region: PlotRect, nx: usize, ny: usize, square: bool) -> PlotRect {
        if !square || nx == 0 || ny == 0 {
            return region;
        }
        let cell = (region.width / nx as f64).min(region.height / ny as f64);
        let width = cell * nx as f64;
        let height = cell * ny as f64;
        PlotRect {
            left: region.left + (region.width - width) / 2.0,
            top: region.top + (region.height - height) / 2.0,
            width,
            height,
        }
    }
}

/// Maps grid coordinates (`x` in `[-0.5, nx - 0.5]`, `y` in `[-0.5, ny - 0.5]`, y up)
/// onto a [`PlotRect`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridTransform {
    pub rect: PlotRect,
    pub nx: usize,
    pub ny: usize,
}

impl GridTransform {
    pub fn new(rect: PlotRect, nx: usize, ny: usize) -> Self {
        Self { rect, nx, ny }
    }

    /// Offset from the rectangle's bottom-left corner, y up.
    fn display(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x + 0.5) / self.nx as f64 * self.rect.width,
            (y + 0.5) / self.ny as f64 * self.rect.height,
        )
    }

    /// Absolute pixel position of a grid coordinate.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = self.display(x, y);
        (self.rect.left + dx, self.rect.bottom() - dy)
    }

    /// Pixel centre of the cell in column `xi`, row `yi`.
    pub fn cell_center(&self, xi: usize, yi: usize) -> (f64, f64) {
        self.to_pixel(xi as f64, yi as f64)
    }

    /// Shape of the cell at column `xi`, row `yi`, shrunk to the normalised size `fraction`.
    pub fn cell_shape(
        &self,
        xi: usize,
        yi: usize,
        fraction: f64,
        circular: bool,
        square: bool,
    ) -> CellShape {
        let (x, y) = (xi as f64, yi as f64);
        let before = round2(self.display(x - 0.5, y - 0.5));
        let after = round2(self.display(x + 0.5, y + 0.5));
        let delta = (after.0 - before.0, after.1 - before.1);

        let gap_for = |d: f64| {
            let gap = ((1.0 - fraction) * d / 2.0).round();
            // keep non-zero sized markers visible
            if d - gap * 2.0 < 3.0 {
                gap - 3.0
            } else {
                gap
            }
        };
        let gap = (gap_for(delta.0), gap_for(delta.1));

        let start = (before.0 + gap.0 + 1.0, before.1 + gap.1);
        let end = (after.0 - gap.0, after.1 - gap.1 - 1.0);
        let mut size = (end.0 - start.0, end.1 - start.1);

        if circular {
            let (cx, cy) = (start.0 + size.0 / 2.0, start.1 + size.1 / 2.0);
            return CellShape::Circle {
                center: (self.rect.left + cx, self.rect.bottom() - cy),
                radius: (size.1 / 2.0).max(0.0),
            };
        }

        if square {
            let side = (size.0 + size.1) / 2.0;
            size = (side, side);
        }
        CellShape::Rect {
            top_left: (self.rect.left + start.0, self.rect.bottom() - (start.1 + size.1)),
            bottom_right: (self.rect.left + start.0 + size.0, self.rect.bottom() - start.1),
        }
    }
}

fn round2(p: (f64, f64)) -> (f64, f64) {
    (p.0.round(), p.1.round())
}

/// A rendered cell in absolute pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellShape {
    Circle { center: (f64, f64), radius: f64 },
    Rect {
        top_left: (f64, f64),
        bottom_right: (f64, f64),
    },
}

impl CellShape {
    pub fn center(&self) -> (f64, f64) {
        match *self {
            CellShape::Circle { center, .. } => center,
            CellShape::Rect {
                top_left,
                bottom_right,
            } => (
                (top_left.0 + bottom_right.0) / 2.0,
                (top_left.1 + bottom_right.1) / 2.0,
            ),
        }
    }

    pub fn extent(&self) -> (f64, f64) {
        match *self {
            CellShape::Circle { radius, .. } => (2.0 * radius, 2.0 * radius),
            CellShape::Rect {
                top_left,
                bottom_right,
            } => (bottom_right.0 - top_left.0, bottom_right.1 - top_left.1),
        }
    }
}
