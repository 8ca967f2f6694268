//! Co-occurrence counts of two categorical series.

use std::collections::BTreeSet;

use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};
use crate::heatmap::{heatmap, HeatmapOptions, LabeledMatrix};

const NAN_LABEL: &str = "nan";

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, Display, Serialize, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Normalize {
    /// Each row sums to one.
    #[strum(serialize = "rows", serialize = "index")]
    Rows,
    /// Each column sums to one.
    #[strum(serialize = "columns")]
    Columns,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Crosstab {
    pub row_name: Option<String>,
    pub col_name: Option<String>,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub counts: Array2<u64>,
}

impl Crosstab {
    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    pub fn count(&self, row: &str, col: &str) -> Option<u64> {
        let i = self.row_labels.iter().position(|l| l == row)?;
        let j = self.col_labels.iter().position(|l| l == col)?;
        Some(self.counts[[i, j]])
    }

    /// Counts as a float matrix, optionally normalised along rows or columns.
    pub fn normalized(&self, normalize: Option<Normalize>) -> LabeledMatrix {
        let mut values = self.counts.mapv(|c| c as f64);
        match normalize {
            Some(Normalize::Rows) => {
                for mut row in values.rows_mut() {
                    let sum = row.sum();
                    if sum > 0.0 {
                        row.mapv_inplace(|v| v / sum);
                    }
                }
            }
            Some(Normalize::Columns) => {
                for mut col in values.columns_mut() {
                    let sum = col.sum();
                    if sum > 0.0 {
                        col.mapv_inplace(|v| v / sum);
                    }
                }
            }
            None => {}
        }
        LabeledMatrix {
            row_name: self.row_name.clone(),
            col_name: self.col_name.clone(),
            row_labels: self.row_labels.clone(),
            col_labels: self.col_labels.clone(),
            values,
        }
    }
}

fn cast(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NAN_LABEL)
}

/// Crosstabulates the unique values of `x` (rows) against `y` (columns).
///
/// Missing values are counted under the label `"nan"`. With `dropna`, rows
/// missing on either side are removed first; without `shownan`, the `"nan"`
/// row and column are dropped from the result.
pub fn numpy_crosstab(
    x: &[Option<String>],
    y: &[Option<String>],
    dropna: bool,
    shownan: bool,
) -> Result<Crosstab> {
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }

    let rows: Vec<(&str, &str)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !dropna || (a.is_some() && b.is_some()))
        .map(|(a, b)| (cast(a), cast(b)))
        .collect();

    let x_cats: Vec<String> = rows
        .iter()
        .map(|r| r.0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|c| shownan || *c != NAN_LABEL)
        .map(String::from)
        .collect();
    let y_cats: Vec<String> = rows
        .iter()
        .map(|r| r.1)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|c| shownan || *c != NAN_LABEL)
        .map(String::from)
        .collect();

    let mut counts = Array2::<u64>::zeros((x_cats.len(), y_cats.len()));
    for (a, b) in rows {
        // labels are sorted
        if let (Ok(i), Ok(j)) = (
            x_cats.binary_search_by(|c| c.as_str().cmp(a)),
            y_cats.binary_search_by(|c| c.as_str().cmp(b)),
        ) {
            counts[[i, j]] += 1;
        }
    }

    Ok(Crosstab {
        row_name: None,
        col_name: None,
        row_labels: x_cats,
        col_labels: y_cats,
        counts,
    })
}

/// Crosstab of two named table columns (`x` on the columns, `y` on the rows),
/// drawn as a heatmap.
pub fn crosstab_plot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x: (&str, &[Option<String>]),
    y: (&str, &[Option<String>]),
    dropna: bool,
    shownan: bool,
    normalize: Option<Normalize>,
    options: &HeatmapOptions,
) -> Result<Crosstab> {
    let mut tab = numpy_crosstab(y.1, x.1, dropna, shownan)?;
    tab.row_name = Some(y.0.to_string());
    tab.col_name = Some(x.0.to_string());
    heatmap(area, &tab.normalized(normalize), None, None, options)?;
    Ok(tab)
}
