//! Column-oriented table of numeric and categorical variables.

use std::io::Read;

use csv::ReaderBuilder;

use crate::error::{Error, Result};

const MISSING_MARKERS: [&str; 6] = ["", "NA", "NaN", "nan", "null", "None"];

#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    /// Values as `f64`. Categorical cells must parse as numbers; missing cells become NaN.
    pub fn to_numeric(&self, name: &str) -> Result<Vec<f64>> {
        match self {
            Column::Numeric(v) => Ok(v.clone()),
            Column::Categorical(v) => v
                .iter()
                .map(|cell| match cell {
                    None => Ok(f64::NAN),
                    Some(s) => s.trim().parse::<f64>().map_err(|_| Error::NotNumeric {
                        column: name.to_string(),
                        value: s.clone(),
                    }),
                })
                .collect(),
        }
    }

    /// Values as categories. NaN becomes missing; infinities stay labels.
    pub fn to_categorical(&self) -> Vec<Option<String>> {
        match self {
            Column::Categorical(v) => v.clone(),
            Column::Numeric(v) => v
                .iter()
                .map(|&x| if x.is_nan() { None } else { Some(format_category(x)) })
                .collect(),
        }
    }
}

/// Formats a number the way it is shown as a category label (`2` rather than `2.0`,
/// `inf` and `-inf` for infinities).
pub fn format_category(x: f64) -> String {
    if x.is_infinite() {
        if x > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        x.to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn push(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(Error::LengthMismatch {
                left: self.n_rows(),
                right: column.len(),
            });
        }
        if self.names.contains(&name) {
            return Err(Error::Conflict(format!("duplicate column '{}'", name)));
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn push_numeric(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        self.push(name, Column::Numeric(values))
    }

    pub fn push_categorical<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<S>>,
    ) -> Result<()> {
        let values = values.into_iter().map(|v| v.map(Into::into)).collect();
        self.push(name, Column::Categorical(values))
    }

    pub fn with_numeric(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.push_numeric(name, values)?;
        Ok(self)
    }

    pub fn with_categorical<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<S>>,
    ) -> Result<Self> {
        self.push_categorical(name, values)?;
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Reads a delimited file with a header row, inferring each column's storage type.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.is_empty() {
            return Err(Error::EmptyInput("table has no columns".into()));
        }

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for (idx, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() != headers.len() {
                return Err(Error::Shape(format!(
                    "line {} has {} fields, expected {}",
                    idx + 2, // header offset
                    record.len(),
                    headers.len()
                )));
            }
            for (cells, field) in raw.iter_mut().zip(record.iter()) {
                let field = field.trim();
                cells.push(if MISSING_MARKERS.contains(&field) {
                    None
                } else {
                    Some(field.to_string())
                });
            }
        }

        let mut table = Table::new();
        for (name, cells) in headers.into_iter().zip(raw) {
            let parsed: Option<Vec<f64>> = cells
                .iter()
                .map(|c| match c {
                    None => Some(f64::NAN),
                    Some(s) => s.parse::<f64>().ok(),
                })
                .collect();
            let all_missing = cells.iter().all(Option::is_none);
            let column = match parsed {
                Some(values) if !all_missing => Column::Numeric(values),
                _ => Column::Categorical(cells),
            };
            table.push(name, column)?;
        }
        Ok(table)
    }
}

/// Splits the table's columns into `(categorical, numeric)` by storage type.
pub fn split_col_by_type(table: &Table) -> (Vec<String>, Vec<String>) {
    let mut categorical = Vec::new();
    let mut numeric = Vec::new();
    for (name, column) in table.iter() {
        if column.is_numeric() {
            numeric.push(name.to_string());
        } else {
            categorical.push(name.to_string());
        }
    }
    (categorical, numeric)
}
