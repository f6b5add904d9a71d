use crate::error::{EngineError, Result};
use crate::table::{ColumnType, Row, Table, Value};

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Maps a row to the group it belongs to.
pub trait GroupKey {
    /// `None` when the row has no usable key (for example an empty date).
    fn key(&self, row: &Row) -> Option<String>;

    /// The complete key space, in reporting order, when it is known up front.
    fn domain(&self) -> Option<Vec<String>> {
        None
    }
}

impl<F> GroupKey for F
where
    F: Fn(&Row) -> Option<String>,
{
    fn key(&self, row: &Row) -> Option<String> {
        self(row)
    }
}

/// Three-letter month label of a date column; reports Jan..Dec.
#[derive(Debug, Clone, Copy)]
pub struct MonthKey {
    idx: usize,
}

impl MonthKey {
    pub fn new(table: &Table, column: &str) -> Result<Self> {
        let idx = table.column_index(column)?;
        if table.columns()[idx].ty != ColumnType::Date {
            return Err(EngineError::InvalidArgument(format!(
                "column `{}` is not a date column",
                column
            )));
        }
        Ok(Self { idx })
    }
}

impl GroupKey for MonthKey {
    fn key(&self, row: &Row) -> Option<String> {
        row.get(self.idx)
            .and_then(Value::as_date)
            .map(|d| d.format("%b").to_string())
    }

    fn domain(&self) -> Option<Vec<String>> {
        Some(MONTHS.iter().map(|m| m.to_string()).collect())
    }
}

/// The cell text of a column, e.g. a state code.
#[derive(Debug, Clone, Copy)]
pub struct ColumnKey {
    idx: usize,
}

impl ColumnKey {
    pub fn new(table: &Table, column: &str) -> Result<Self> {
        Ok(Self {
            idx: table.column_index(column)?,
        })
    }
}

impl GroupKey for ColumnKey {
    fn key(&self, row: &Row) -> Option<String> {
        match row.get(self.idx)? {
            Value::Empty => None,
            Value::Text(s) if s.is_empty() => None,
            v => Some(v.render("%Y-%m-%d")),
        }
    }
}
