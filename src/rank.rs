// src/rank.rs
use serde::Serialize;

use crate::error::Result;
use crate::table::{Row, Table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    /// Index of the row in the source table.
    pub position: usize,
    pub row: Row,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingResult {
    pub column: String,
    pub entries: Vec<Ranked>,
}

impl RankingResult {
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The `n` rows with the largest `column` values, largest first.
///
/// The sort is stable: equal values keep their source order. `n <= 0` and an
/// empty table both give an empty result. Rows with an empty cell are not ranked.
pub fn top_n(table: &Table, column: &str, n: i64) -> Result<RankingResult> {
    let idx = table.numeric_column(column)?;
    let mut entries: Vec<Ranked> = Vec::new();

    if n > 0 {
        let mut scored: Vec<(usize, f64)> = table
            .numeric_values(idx)
            .into_iter()
            .enumerate()
            .filter_map(|(pos, v)| v.map(|v| (pos, v)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(usize::try_from(n).unwrap_or(usize::MAX));

        entries = scored
            .into_iter()
            .map(|(position, value)| Ranked {
                position,
                row: table.rows()[position].clone(),
                value,
            })
            .collect();
    }

    Ok(RankingResult {
        column: column.to_string(),
        entries,
    })
}

/// First row holding the largest value of `column`.
pub fn column_max(table: &Table, column: &str) -> Result<Option<Ranked>> {
    Ok(top_n(table, column, 1)?.entries.into_iter().next())
}
