// src/dispatch/mod.rs
mod outcome;

pub use outcome::Outcome;

use tracing::info;

use crate::aggregate::{self, ColumnKey, MonthKey};
use crate::config::Config;
use crate::derive;
use crate::error::{EngineError, Result};
use crate::load::{load_table, RawInput, Source};
use crate::rank;
use crate::report;
use crate::table::Table;

/// Menu entries, one per code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Exit,
    Duplicate,
    CopyRows,
    Title,
    Generation,
    Columns,
    AllRows,
    Recent,
    Max,
    TopRows,
    MonthlySummary,
    WriteReport,
    Totals,
    TopGroups,
    Stats,
    Reload,
    Profile,
    Fit,
}

impl Operation {
    pub const ALL: [Operation; 18] = [
        Operation::Exit,
        Operation::Duplicate,
        Operation::CopyRows,
        Operation::Title,
        Operation::Generation,
        Operation::Columns,
        Operation::AllRows,
        Operation::Recent,
        Operation::Max,
        Operation::TopRows,
        Operation::MonthlySummary,
        Operation::WriteReport,
        Operation::Totals,
        Operation::TopGroups,
        Operation::Stats,
        Operation::Reload,
        Operation::Profile,
        Operation::Fit,
    ];

    pub fn code(self) -> u8 {
        Self::ALL
            .iter()
            .position(|&op| op == self)
            .map_or(0, |i| i as u8)
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::Exit => "Exit the program.",
            Operation::Duplicate => "Duplicate the original file.",
            Operation::CopyRows => "Copy the data rows into a new file.",
            Operation::Title => "Display the file title.",
            Operation::Generation => "Display the file generation/run-date.",
            Operation::Columns => "Display the column names.",
            Operation::AllRows => "Display all rows.",
            Operation::Recent => "Display the most recent days of data.",
            Operation::Max => "Display the highest value of the metric column.",
            Operation::TopRows => "Display the top rows by the metric column.",
            Operation::MonthlySummary => "Display a summary of each month.",
            Operation::WriteReport => "Write the transformed report file.",
            Operation::Totals => "Display column totals (all rows or one group).",
            Operation::TopGroups => "Display the top groups by metric total.",
            Operation::Stats => "Display statistics of the metric column.",
            Operation::Reload => "Reload the input file.",
            Operation::Profile => "Display column types and missing values.",
            Operation::Fit => "Fit a trend line between two numeric columns.",
        }
    }

    /// Whether the operation takes a row/group count.
    pub fn takes_count(self) -> bool {
        matches!(self, Operation::TopRows | Operation::TopGroups)
    }

    /// Whether the operation can be restricted to one group value.
    pub fn takes_group(self) -> bool {
        matches!(self, Operation::Totals)
    }
}

pub fn list_operations() -> Vec<(u8, &'static str)> {
    Operation::ALL
        .iter()
        .map(|op| (op.code(), op.description()))
        .collect()
}

/// Menu input to an operation. Non-numeric input and unknown codes are both
/// `InvalidOperation`.
pub fn parse_code(input: &str) -> Result<Operation> {
    let input = input.trim();
    let code: u8 = input
        .parse()
        .map_err(|_| EngineError::InvalidOperation(format!("`{}` is not a number", input)))?;
    Operation::from_code(code)
        .ok_or_else(|| EngineError::InvalidOperation(format!("no operation with code {}", code)))
}

/// Per-call arguments; anything left `None` falls back to the config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpArgs {
    /// Numeric column to use instead of the configured metric column.
    pub column: Option<String>,
    pub n: Option<i64>,
    /// Value of the group column to restrict to.
    pub group: Option<String>,
    /// Dependent column of a fit, instead of the configured one.
    pub against: Option<String>,
}

/// The loaded input and its table, held between operations.
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    raw: RawInput,
    table: Table,
}

impl Session {
    /// Read and parse `config.input`.
    pub fn open(config: Config) -> Result<Self> {
        let raw = RawInput::from_path(&config.input)?;
        Self::from_raw(config, raw)
    }

    pub fn from_raw(config: Config, raw: RawInput) -> Result<Self> {
        let table = load_table(&raw, &config.load_options())?;
        Ok(Self { config, raw, table })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn raw(&self) -> &RawInput {
        &self.raw
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Re-read the input and swap in the new table. On failure the current
    /// table is kept.
    pub fn reload(&mut self) -> Result<usize> {
        let raw = match self.raw.source() {
            Source::File(path) => RawInput::from_path(path)?,
            Source::Memory(_) => self.raw.clone(),
        };
        let table = load_table(&raw, &self.config.load_options())?;
        self.raw = raw;
        self.table = table;
        Ok(self.table.len())
    }
}

/// Run `op` against the session.
pub fn invoke(op: Operation, session: &mut Session, args: &OpArgs) -> Result<Outcome> {
    info!(code = op.code(), ?op, "invoking operation");
    let cfg = &session.config;
    let table = &session.table;
    let metric = args.column.as_deref().unwrap_or(&cfg.metric_column);
    let n = args.n.unwrap_or(cfg.top_n);

    let outcome = match op {
        Operation::Exit => Outcome::Exit,
        Operation::Duplicate => Outcome::Write {
            status: report::duplicate_raw(
                &cfg.artifact_path(&cfg.duplicate_file),
                &session.raw,
                cfg.write_mode(),
            )?,
        },
        Operation::CopyRows => Outcome::Write {
            status: report::write_rows(
                &cfg.artifact_path(&cfg.copy_file),
                table,
                &cfg.report_options(),
            )?,
        },
        Operation::Title => Outcome::Line {
            label: "Title",
            value: table.preamble().title().map(str::to_string),
        },
        Operation::Generation => Outcome::Line {
            label: "Generated",
            value: table.preamble().generated().map(str::to_string),
        },
        Operation::Columns => Outcome::Columns {
            names: names(table),
        },
        Operation::AllRows => Outcome::Rows {
            table: table.clone(),
        },
        Operation::Recent => Outcome::Rows {
            table: table.select(&[cfg.date_column.as_str(), metric], Some(cfg.recent_rows))?,
        },
        Operation::Max => Outcome::Max {
            column: metric.to_string(),
            entry: rank::column_max(table, metric)?,
        },
        Operation::TopRows => Outcome::Ranking {
            columns: names(table),
            ranking: rank::top_n(table, metric, n)?,
        },
        Operation::MonthlySummary => {
            let key = MonthKey::new(table, &cfg.date_column)?;
            Outcome::Summary {
                results: aggregate::aggregate(table, &key, &[metric])?,
            }
        }
        Operation::WriteReport => {
            let derived = derive::materialize_all(table, &cfg.derived, cfg.precision)?;
            Outcome::Write {
                status: report::write_report(
                    &cfg.artifact_path(&cfg.report_file),
                    &derived,
                    &cfg.report_options(),
                )?,
            }
        }
        Operation::Totals => {
            let columns: Vec<&str> = match args.column.as_deref() {
                Some(c) => vec![c],
                None => table
                    .columns()
                    .iter()
                    .filter(|c| c.ty.is_numeric())
                    .map(|c| c.name.as_str())
                    .collect(),
            };
            if columns.is_empty() {
                return Err(EngineError::InvalidArgument(
                    "the table has no numeric columns".into(),
                ));
            }
            let group = args.group.as_deref().map(str::trim).filter(|g| !g.is_empty());
            let filter = group.map(|g| (cfg.group_column.as_str(), g));
            Outcome::Totals {
                filter: filter.map(|(c, g)| format!("{} = {}", c, g)),
                totals: aggregate::column_totals(table, &columns, filter)?,
            }
        }
        Operation::TopGroups => {
            let key = ColumnKey::new(table, &cfg.group_column)?;
            Outcome::TopGroups {
                group_column: cfg.group_column.clone(),
                column: metric.to_string(),
                groups: aggregate::rank_groups(table, &key, metric, n)?,
            }
        }
        Operation::Stats => Outcome::Stats {
            column: metric.to_string(),
            stats: aggregate::column_stats(table, metric, cfg.precision)?,
        },
        Operation::Reload => Outcome::Reloaded {
            rows: session.reload()?,
        },
        Operation::Profile => Outcome::Profile {
            columns: aggregate::column_profiles(table),
        },
        Operation::Fit => {
            let against = args.against.as_deref().unwrap_or(&cfg.fit_column);
            Outcome::Fit {
                fit: aggregate::linear_fit(table, metric, against, cfg.precision)?,
                x: metric.to_string(),
                y: against.to_string(),
            }
        }
    };
    Ok(outcome)
}

fn names(table: &Table) -> Vec<String> {
    table.column_names().into_iter().map(str::to_string).collect()
}
