// src/table/mod.rs
mod value;

pub use value::{ColumnType, Value};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::{EngineError, Result};

static GENERATED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*date generated:\s*(.*?)\s*$").expect("valid regex"));

/// Metadata lines that precede the header row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Preamble {
    lines: Vec<String>,
}

impl Preamble {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// First preamble line.
    pub fn title(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    /// Second preamble line, verbatim.
    pub fn generated(&self) -> Option<&str> {
        self.lines.get(1).map(String::as_str)
    }

    /// Timestamp text of the generation line, with any `Date generated:` prefix removed.
    pub fn generated_at(&self) -> Option<&str> {
        let line = self.generated()?;
        match GENERATED_RE.captures(line).and_then(|c| c.get(1)) {
            Some(m) => Some(m.as_str()),
            None => Some(line.trim()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    /// Computed by the engine rather than read from the input.
    pub derived: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            derived: false,
        }
    }

    pub fn derived(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            derived: true,
        }
    }
}

/// One data line, values aligned with the table's columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Preamble + columns + rows in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    preamble: Preamble,
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table, checking that column names are unique and every row
    /// has one value per column.
    pub fn new(preamble: Preamble, columns: Vec<Column>, rows: Vec<Row>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(EngineError::InvalidArgument(format!(
                    "duplicate column `{}`",
                    col.name
                )));
            }
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(EngineError::InvalidArgument(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self {
            preamble,
            columns,
            rows,
        })
    }

    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| EngineError::UnknownColumn(name.to_string()))
    }

    /// Index of `name`, which must be an integer or float column.
    pub fn numeric_column(&self, name: &str) -> Result<usize> {
        let idx = self.column_index(name)?;
        let ty = self.columns[idx].ty;
        if !ty.is_numeric() {
            return Err(EngineError::InvalidArgument(format!(
                "column `{}` is {}, not numeric",
                name, ty
            )));
        }
        Ok(idx)
    }

    /// Numeric cells of column `idx` in row order; `None` for empty cells.
    pub fn numeric_values(&self, idx: usize) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|r| r.get(idx).and_then(Value::as_f64))
            .collect()
    }

    /// Copy of this table with one more column appended.
    pub fn with_column(&self, column: Column, values: Vec<Value>) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(EngineError::InvalidArgument(format!(
                "column `{}` has {} values for {} rows",
                column.name,
                values.len(),
                self.rows.len()
            )));
        }
        let mut columns = self.columns.clone();
        columns.push(column);
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, v)| {
                let mut vals = row.values.clone();
                vals.push(v);
                Row::new(vals)
            })
            .collect();
        Table::new(self.preamble.clone(), columns, rows)
    }

    /// Projection onto `names` (in that order), keeping the first `limit` rows.
    pub fn select(&self, names: &[&str], limit: Option<usize>) -> Result<Table> {
        let idxs = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<Vec<_>>>()?;
        let columns = idxs.iter().map(|&i| self.columns[i].clone()).collect();
        let take = limit.unwrap_or(self.rows.len());
        let rows = self
            .rows
            .iter()
            .take(take)
            .map(|r| Row::new(idxs.iter().map(|&i| r.values[i].clone()).collect()))
            .collect();
        Table::new(self.preamble.clone(), columns, rows)
    }
}
