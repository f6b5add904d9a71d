// src/derive/mod.rs
mod rolling;

pub use rolling::{forward_window, round_to, WindowAgg};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::table::{Column, ColumnType, Table, Value};

pub const DEFAULT_WINDOW: usize = 7;
pub const DEFAULT_PRECISION: u32 = 2;

fn default_window() -> usize {
    DEFAULT_WINDOW
}

/// A column computed by the engine and appended to every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumn {
    pub name: String,
    #[serde(flatten)]
    pub rule: DerivedRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DerivedRule {
    /// Forward, end-truncated window over `source`.
    Rolling {
        source: String,
        #[serde(default = "default_window")]
        window: usize,
        #[serde(default)]
        agg: WindowAgg,
    },
    /// Declared but without a compute rule yet; every row holds `sentinel`.
    Reserved {
        #[serde(default)]
        sentinel: i64,
    },
}

impl DerivedColumn {
    pub fn rolling_mean(name: &str, source: &str, window: usize) -> Self {
        Self {
            name: name.to_string(),
            rule: DerivedRule::Rolling {
                source: source.to_string(),
                window,
                agg: WindowAgg::Mean,
            },
        }
    }

    pub fn reserved(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rule: DerivedRule::Reserved { sentinel: 0 },
        }
    }
}

/// Copy of `table` with the rolling `agg` of `source` appended as `name`.
pub fn rolling(
    table: &Table,
    source: &str,
    name: &str,
    window: usize,
    agg: WindowAgg,
    precision: u32,
) -> Result<Table> {
    if window == 0 {
        return Err(EngineError::InvalidArgument(
            "window size must be at least 1".into(),
        ));
    }
    ensure_new_name(table, name)?;
    let idx = table.numeric_column(source)?;

    let values = forward_window(&table.numeric_values(idx), window, agg, precision)
        .into_iter()
        .map(|v| v.map_or(Value::Empty, Value::Float))
        .collect();
    debug!(source, name, window, ?agg, "computed rolling column");
    table.with_column(Column::derived(name, ColumnType::Float), values)
}

/// Copy of `table` with a placeholder column holding `sentinel` in every row.
pub fn reserved(table: &Table, name: &str, sentinel: i64) -> Result<Table> {
    ensure_new_name(table, name)?;
    warn!(name, sentinel, "derived column has no compute rule; filled with sentinel");
    let values = vec![Value::Integer(sentinel); table.len()];
    table.with_column(Column::derived(name, ColumnType::Integer), values)
}

pub fn materialize(table: &Table, column: &DerivedColumn, precision: u32) -> Result<Table> {
    match &column.rule {
        DerivedRule::Rolling {
            source,
            window,
            agg,
        } => rolling(table, source, &column.name, *window, *agg, precision),
        DerivedRule::Reserved { sentinel } => reserved(table, &column.name, *sentinel),
    }
}

/// Append each of `columns` in order. The input table is left untouched.
pub fn materialize_all(table: &Table, columns: &[DerivedColumn], precision: u32) -> Result<Table> {
    columns
        .iter()
        .try_fold(table.clone(), |acc, col| materialize(&acc, col, precision))
}

fn ensure_new_name(table: &Table, name: &str) -> Result<()> {
    if table.column_index(name).is_ok() {
        return Err(EngineError::InvalidArgument(format!(
            "column `{}` already exists",
            name
        )));
    }
    Ok(())
}
