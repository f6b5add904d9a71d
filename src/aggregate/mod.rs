// src/aggregate/mod.rs
mod fit;
mod keys;
mod totals;

pub use fit::{linear_fit, LinearFit};
pub use keys::{ColumnKey, GroupKey, MonthKey, MONTHS};
pub use totals::{
    column_profiles, column_stats, column_totals, rank_groups, ColumnProfile, ColumnStats,
    ColumnTotal, GroupTotal,
};

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::table::{Table, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub key: String,
    pub count: usize,
    /// `None` when the group has no values, which is not the same as a mean of zero.
    pub mean: Option<f64>,
}

/// Per-group counts and means of one source column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub column: String,
    pub groups: Vec<GroupStat>,
    /// Rows the key extractor could not place in any group.
    pub unkeyed: usize,
}

impl AggregationResult {
    pub fn group(&self, key: &str) -> Option<&GroupStat> {
        self.groups.iter().find(|g| g.key == key)
    }
}

#[derive(Default, Clone, Copy)]
struct Acc {
    count: usize,
    sum: f64,
    values: usize,
}

/// Group `table` by `key` and report count and mean of each column in `columns`.
///
/// Groups come out in the key's domain order when it has one (absent keys
/// included with a zero count), otherwise in ascending key order.
pub fn aggregate(
    table: &Table,
    key: &dyn GroupKey,
    columns: &[&str],
) -> Result<Vec<AggregationResult>> {
    let domain = key.domain();
    if table.is_empty() && domain.is_none() {
        return Err(EngineError::EmptyInput("group rows"));
    }
    if columns.is_empty() {
        return Err(EngineError::InvalidArgument(
            "at least one source column is required".into(),
        ));
    }
    let idxs = columns
        .iter()
        .map(|c| table.numeric_column(c))
        .collect::<Result<Vec<_>>>()?;

    let keys: Vec<Option<String>> = table.rows().iter().map(|r| key.key(r)).collect();
    let unkeyed = keys.iter().filter(|k| k.is_none()).count();
    if unkeyed > 0 {
        debug!(unkeyed, "rows without a group key were skipped");
    }
    let order = group_order(&keys, domain);

    let results = idxs
        .iter()
        .zip(columns)
        .map(|(&idx, name)| {
            let mut acc: HashMap<&str, Acc> = HashMap::new();
            for (row, k) in table.rows().iter().zip(&keys) {
                let Some(k) = k else { continue };
                let entry = acc.entry(k.as_str()).or_default();
                entry.count += 1;
                if let Some(v) = row.get(idx).and_then(Value::as_f64) {
                    entry.sum += v;
                    entry.values += 1;
                }
            }
            let groups = order
                .iter()
                .map(|k| {
                    let a = acc.get(k.as_str()).copied().unwrap_or_default();
                    GroupStat {
                        key: k.clone(),
                        count: a.count,
                        mean: (a.values > 0).then(|| a.sum / a.values as f64),
                    }
                })
                .collect();
            AggregationResult {
                column: name.to_string(),
                groups,
                unkeyed,
            }
        })
        .collect();
    Ok(results)
}

/// Domain keys first, then any observed keys outside the domain, sorted.
fn group_order(keys: &[Option<String>], domain: Option<Vec<String>>) -> Vec<String> {
    let observed: BTreeSet<&str> = keys.iter().flatten().map(String::as_str).collect();
    match domain {
        Some(mut order) => {
            let extra: Vec<String> = observed
                .into_iter()
                .filter(|k| !order.iter().any(|d| d == k))
                .map(str::to_string)
                .collect();
            order.extend(extra);
            order
        }
        None => observed.into_iter().map(str::to_string).collect(),
    }
}
