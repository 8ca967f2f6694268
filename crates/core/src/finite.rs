//! Per-pair handling of NaN, infinity and missing categories.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};
use crate::table::format_category;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display, Serialize, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum NanStrategy {
    /// Drop rows where either value is invalid.
    #[default]
    Mask,
    /// Substitute invalid values with the replacement constant.
    Replace,
}

/// A column after its numeric/categorical role has been decided.
#[derive(Clone, Debug, PartialEq)]
pub enum Values {
    Numeric(Vec<f64>),
    Categorical(Vec<Option<String>>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Numeric(v) => v.len(),
            Values::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Values::Numeric(_))
    }

    fn is_valid(&self, i: usize) -> bool {
        match self {
            Values::Numeric(v) => v[i].is_finite(),
            Values::Categorical(v) => v[i].is_some(),
        }
    }

    fn select(&self, rows: &[usize]) -> Finite {
        match self {
            Values::Numeric(v) => Finite::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Values::Categorical(v) => Finite::Categorical(
                rows.iter().filter_map(|&i| v[i].clone()).collect(),
            ),
        }
    }

    fn replaced(&self, replace_value: f64) -> Finite {
        match self {
            Values::Numeric(v) => Finite::Numeric(
                v.iter()
                    .map(|&x| if x.is_finite() { x } else { replace_value })
                    .collect(),
            ),
            Values::Categorical(v) => {
                let fill = format_category(replace_value);
                Finite::Categorical(
                    v.iter()
                        .map(|c| c.clone().unwrap_or_else(|| fill.clone()))
                        .collect(),
                )
            }
        }
    }
}

/// A column with every value valid.
#[derive(Clone, Debug, PartialEq)]
pub enum Finite {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl Finite {
    pub fn len(&self) -> usize {
        match self {
            Finite::Numeric(v) => v.len(),
            Finite::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Finite::Numeric(v) => Some(v),
            Finite::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&[String]> {
        match self {
            Finite::Categorical(v) => Some(v),
            Finite::Numeric(_) => None,
        }
    }
}

/// Returns the two columns with only valid values, according to `strategy`.
///
/// Numeric values are invalid when not finite; categorical values are invalid when missing.
pub fn make_finite(
    x: &Values,
    y: &Values,
    strategy: NanStrategy,
    replace_value: f64,
) -> Result<(Finite, Finite)> {
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }

    match strategy {
        NanStrategy::Mask => {
            let rows: Vec<usize> = (0..x.len())
                .filter(|&i| x.is_valid(i) && y.is_valid(i))
                .collect();
            Ok((x.select(&rows), y.select(&rows)))
        }
        NanStrategy::Replace => Ok((x.replaced(replace_value), y.replaced(replace_value))),
    }
}
