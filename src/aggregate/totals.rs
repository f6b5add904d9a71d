use serde::Serialize;
use std::collections::BTreeMap;

use super::GroupKey;
use crate::derive::round_to;
use crate::error::{EngineError, Result};
use crate::table::{ColumnType, Table, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnTotal {
    pub column: String,
    pub total: f64,
    /// Rows that contributed (after filtering).
    pub rows: usize,
}

/// Sum of each of `columns`, over every row or only rows whose `filter.0`
/// column equals `filter.1` (ASCII case-insensitive).
///
/// A filter that matches nothing is an error so the caller can ask again.
pub fn column_totals(
    table: &Table,
    columns: &[&str],
    filter: Option<(&str, &str)>,
) -> Result<Vec<ColumnTotal>> {
    let idxs = columns
        .iter()
        .map(|c| table.numeric_column(c))
        .collect::<Result<Vec<_>>>()?;

    let selected: Vec<_> = match filter {
        Some((column, wanted)) => {
            let fidx = table.column_index(column)?;
            let wanted = wanted.trim();
            let rows: Vec<_> = table
                .rows()
                .iter()
                .filter(|r| {
                    r.get(fidx)
                        .map(|v| v.render("%Y-%m-%d").eq_ignore_ascii_case(wanted))
                        .unwrap_or(false)
                })
                .collect();
            if rows.is_empty() {
                return Err(EngineError::InvalidArgument(format!(
                    "no rows where `{}` is `{}`",
                    column, wanted
                )));
            }
            rows
        }
        None => table.rows().iter().collect(),
    };

    Ok(idxs
        .iter()
        .zip(columns)
        .map(|(&idx, name)| ColumnTotal {
            column: name.to_string(),
            total: selected
                .iter()
                .filter_map(|r| r.get(idx).and_then(Value::as_f64))
                .sum(),
            rows: selected.len(),
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
    pub count: usize,
}

/// Per-group sums of `column`, largest first, at most `n` groups.
/// Equal totals keep ascending key order; `n <= 0` yields nothing.
pub fn rank_groups(
    table: &Table,
    key: &dyn GroupKey,
    column: &str,
    n: i64,
) -> Result<Vec<GroupTotal>> {
    let idx = table.numeric_column(column)?;
    if n <= 0 {
        return Ok(Vec::new());
    }

    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        let Some(k) = key.key(row) else { continue };
        let entry = sums.entry(k).or_insert((0.0, 0));
        entry.0 += row.get(idx).and_then(Value::as_f64).unwrap_or(0.0);
        entry.1 += 1;
    }

    let mut groups: Vec<GroupTotal> = sums
        .into_iter()
        .map(|(key, (total, count))| GroupTotal { key, total, count })
        .collect();
    groups.sort_by(|a, b| b.total.total_cmp(&a.total));
    groups.truncate(usize::try_from(n).unwrap_or(usize::MAX));
    Ok(groups)
}

/// Summary figures of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Count, sum, mean, min and max of the non-empty values of `column`,
/// rounded to `precision`. `None` when the column holds no values.
pub fn column_stats(
    table: &Table,
    column: &str,
    precision: u32,
) -> Result<Option<ColumnStats>> {
    let idx = table.numeric_column(column)?;
    let values: Vec<f64> = table.numeric_values(idx).into_iter().flatten().collect();
    if values.is_empty() {
        return Ok(None);
    }
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok(Some(ColumnStats {
        column: column.to_string(),
        count: values.len(),
        sum: round_to(sum, precision),
        mean: round_to(sum / values.len() as f64, precision),
        min: round_to(min, precision),
        max: round_to(max, precision),
    }))
}

/// Declared type and filled/missing counts of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub column: String,
    pub ty: ColumnType,
    pub filled: usize,
    pub missing: usize,
}

/// Per-column missing-value counts, in column order. Empty text counts as missing.
pub fn column_profiles(table: &Table) -> Vec<ColumnProfile> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let missing = table
                .rows()
                .iter()
                .filter(|r| match r.get(idx) {
                    None | Some(Value::Empty) => true,
                    Some(Value::Text(s)) => s.is_empty(),
                    Some(_) => false,
                })
                .count();
            ColumnProfile {
                column: col.name.clone(),
                ty: col.ty,
                filled: table.len() - missing,
                missing,
            }
        })
        .collect()
}
