//! Pairwise association matrices over mixed numeric and categorical columns.
//!
//! * numeric vs. numeric: a correlation function (Pearson by default) with p-values;
//! * numeric vs. categorical: the correlation ratio;
//! * categorical vs. categorical: Theil's uncertainty coefficient `U(row | column)`,
//!   or its symmetric variant.

use std::collections::HashSet;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::finite::{make_finite, Finite, NanStrategy, Values};
use crate::stats::{correlation_ratio, theils_sym_u, theils_u, CorrMethod, Correlation};
use crate::table::{split_col_by_type, Table};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum CorrType {
    NumVsNum,
    NumVsCat,
    CatVsNum,
    CatVsCat,
}

impl CorrType {
    pub fn classify(first_numeric: bool, second_numeric: bool) -> Self {
        match (first_numeric, second_numeric) {
            (true, true) => CorrType::NumVsNum,
            (true, false) => CorrType::NumVsCat,
            (false, true) => CorrType::CatVsNum,
            (false, false) => CorrType::CatVsCat,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CorrOptions {
    /// Columns treated as categorical; `None` infers them from storage type.
    pub categorical: Option<Vec<String>>,
    /// Columns treated as numeric; `None` infers them from storage type.
    pub numeric: Option<Vec<String>>,
    pub method: CorrMethod,
    pub nan_strategy: NanStrategy,
    pub nan_replace_value: f64,
    /// Use the symmetric uncertainty coefficient for categorical pairs.
    pub sym_u: bool,
}

impl Default for CorrOptions {
    fn default() -> Self {
        Self {
            categorical: None,
            numeric: None,
            method: CorrMethod::Pearson,
            nan_strategy: NanStrategy::Mask,
            nan_replace_value: 0.0,
            sym_u: false,
        }
    }
}

impl CorrOptions {
    pub fn with_categorical<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical = Some(cols.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_numeric<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric = Some(cols.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_method(mut self, method: CorrMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_nan_strategy(mut self, strategy: NanStrategy) -> Self {
        self.nan_strategy = strategy;
        self
    }

    pub fn with_nan_replace_value(mut self, value: f64) -> Self {
        self.nan_replace_value = value;
        self
    }

    pub fn with_sym_u(mut self, sym_u: bool) -> Self {
        self.sym_u = sym_u;
        self
    }
}

/// Resolved column roles, in table order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    pub selected: Vec<String>,
}

impl Partition {
    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric.iter().any(|n| n == name)
    }
}

/// Splits columns into categorical and numeric roles.
///
/// A column listed in both roles is numeric; a column in neither is dropped.
pub fn select_columns(
    table: &Table,
    categorical: Option<&[String]>,
    numeric: Option<&[String]>,
) -> Partition {
    let (auto_cat, auto_num) = split_col_by_type(table);

    let (cat, num): (HashSet<&str>, HashSet<&str>) = match (categorical, numeric) {
        (None, None) => (
            auto_cat.iter().map(String::as_str).collect(),
            auto_num.iter().map(String::as_str).collect(),
        ),
        (None, Some(num)) => {
            let num: HashSet<&str> = num.iter().map(String::as_str).collect();
            let cat = auto_cat
                .iter()
                .map(String::as_str)
                .filter(|c| !num.contains(c))
                .collect();
            (cat, num)
        }
        (Some(cat), None) => {
            let cat: HashSet<&str> = cat.iter().map(String::as_str).collect();
            let num = auto_num
                .iter()
                .map(String::as_str)
                .filter(|c| !cat.contains(c))
                .collect();
            (cat, num)
        }
        (Some(cat), Some(num)) => (
            cat.iter().map(String::as_str).collect(),
            num.iter().map(String::as_str).collect(),
        ),
    };

    let mut partition = Partition {
        categorical: Vec::new(),
        numeric: Vec::new(),
        selected: Vec::new(),
    };
    for name in table.names() {
        if num.contains(name.as_str()) {
            partition.numeric.push(name.clone());
        } else if cat.contains(name.as_str()) {
            partition.categorical.push(name.clone());
        } else {
            warn!(column = %name, "column is neither numeric nor categorical, dropping it");
            continue;
        }
        partition.selected.push(name.clone());
    }
    partition
}

/// Association values, p-values and pair kinds indexed by `labels` on both axes.
#[derive(Clone, Debug, PartialEq)]
pub struct Associations {
    pub labels: Vec<String>,
    pub values: Array2<f64>,
    pub pvalues: Array2<f64>,
    /// `None` on the diagonal.
    pub kinds: Array2<Option<CorrType>>,
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
}

impl Associations {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == name)
    }

    pub fn value(&self, row: &str, col: &str) -> Option<f64> {
        Some(self.values[[self.index_of(row)?, self.index_of(col)?]])
    }

    pub fn pvalue(&self, row: &str, col: &str) -> Option<f64> {
        Some(self.pvalues[[self.index_of(row)?, self.index_of(col)?]])
    }

    pub fn kind(&self, row: &str, col: &str) -> Option<CorrType> {
        self.kinds[[self.index_of(row)?, self.index_of(col)?]]
    }
}

struct PairResult {
    i: usize,
    j: usize,
    forward: f64,
    backward: f64,
    pvalue: f64,
    kind: CorrType,
}

/// Computes associations with the correlation function selected in `options.method`.
pub fn corr(table: &Table, options: &CorrOptions) -> Result<Associations> {
    corr_with(table, options, &options.method)
}

/// Computes associations using `corr_fn` for numeric vs. numeric pairs.
pub fn corr_with<C>(table: &Table, options: &CorrOptions, corr_fn: &C) -> Result<Associations>
where
    C: Correlation + Sync,
{
    let partition = select_columns(
        table,
        options.categorical.as_deref(),
        options.numeric.as_deref(),
    );
    debug!(
        categorical = ?partition.categorical,
        numeric = ?partition.numeric,
        "resolved column roles"
    );

    let columns: Vec<Values> = partition
        .selected
        .iter()
        .map(|name| {
            let column = table.column(name)?;
            Ok(if partition.is_numeric(name) {
                Values::Numeric(column.to_numeric(name)?)
            } else {
                Values::Categorical(column.to_categorical())
            })
        })
        .collect::<Result<_>>()?;

    let n = columns.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect();
    debug!(columns = n, pairs = pairs.len(), "computing associations");

    let results: Vec<PairResult> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let (forward, backward, pvalue, kind) =
                associate(&columns[i], &columns[j], options, corr_fn)?;
            Ok(PairResult {
                i,
                j,
                forward,
                backward,
                pvalue,
                kind,
            })
        })
        .collect::<Result<_>>()?;

    let mut values = Array2::<f64>::ones((n, n));
    let mut pvalues = Array2::<f64>::zeros((n, n));
    let mut kinds = Array2::<Option<CorrType>>::from_elem((n, n), None);
    for r in results {
        trace!(
            row = %partition.selected[r.i],
            col = %partition.selected[r.j],
            kind = %r.kind,
            value = r.forward,
            "pair association"
        );
        values[[r.i, r.j]] = r.forward;
        values[[r.j, r.i]] = r.backward;
        pvalues[[r.i, r.j]] = r.pvalue;
        pvalues[[r.j, r.i]] = r.pvalue;
        kinds[[r.i, r.j]] = Some(r.kind);
        kinds[[r.j, r.i]] = Some(r.kind);
    }

    Ok(Associations {
        labels: partition.selected,
        values,
        pvalues,
        kinds,
        categorical: partition.categorical,
        numeric: partition.numeric,
    })
}

/// Returns `(value at [a, b], value at [b, a], p-value, kind)`.
fn associate<C>(
    a: &Values,
    b: &Values,
    options: &CorrOptions,
    corr_fn: &C,
) -> Result<(f64, f64, f64, CorrType)>
where
    C: Correlation,
{
    let kind = CorrType::classify(a.is_numeric(), b.is_numeric());
    let (x, y) = make_finite(a, b, options.nan_strategy, options.nan_replace_value)?;

    Ok(match (&x, &y) {
        (Finite::Numeric(x), Finite::Numeric(y)) => {
            let (r, p) = corr_fn.correlate(x, y)?;
            (r, r, p, kind)
        }
        (Finite::Numeric(x), Finite::Categorical(y)) => {
            let eta = correlation_ratio(y, x);
            (eta, eta, 0.0, kind)
        }
        (Finite::Categorical(x), Finite::Numeric(y)) => {
            let eta = correlation_ratio(x, y);
            (eta, eta, 0.0, kind)
        }
        (Finite::Categorical(x), Finite::Categorical(y)) => {
            if options.sym_u {
                let u = theils_sym_u(x, y);
                (u, u, 0.0, kind)
            } else {
                (theils_u(x, y), theils_u(y, x), 0.0, kind)
            }
        }
    })
}
