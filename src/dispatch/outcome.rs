use serde::Serialize;

use crate::aggregate::{
    AggregationResult, ColumnProfile, ColumnStats, ColumnTotal, GroupTotal, LinearFit,
};
use crate::rank::{Ranked, RankingResult};
use crate::report::WriteStatus;
use crate::table::Table;

/// What an operation produced, for the caller to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Exit,
    /// A single preamble line.
    Line {
        label: &'static str,
        value: Option<String>,
    },
    Columns {
        names: Vec<String>,
    },
    Rows {
        table: Table,
    },
    Max {
        column: String,
        entry: Option<Ranked>,
    },
    Ranking {
        columns: Vec<String>,
        ranking: RankingResult,
    },
    Summary {
        results: Vec<AggregationResult>,
    },
    Totals {
        /// `column = value` when restricted to one group.
        filter: Option<String>,
        totals: Vec<ColumnTotal>,
    },
    TopGroups {
        group_column: String,
        column: String,
        groups: Vec<GroupTotal>,
    },
    Stats {
        column: String,
        stats: Option<ColumnStats>,
    },
    Write {
        status: WriteStatus,
    },
    Reloaded {
        rows: usize,
    },
    Profile {
        columns: Vec<ColumnProfile>,
    },
    Fit {
        x: String,
        y: String,
        fit: Option<LinearFit>,
    },
}
