// src/load/mod.rs
pub mod date_parser;
mod raw;

pub use raw::{RawInput, Source};

use csv::{ReaderBuilder, Trim};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::table::{Column, ColumnType, Preamble, Row, Table, Value};

pub const DEFAULT_PREAMBLE_LINES: usize = 3;

/// How to read a file: how many metadata lines precede the header, and the
/// declared type of each column by name.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub preamble_lines: usize,
    pub column_types: BTreeMap<String, ColumnType>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            preamble_lines: DEFAULT_PREAMBLE_LINES,
            column_types: BTreeMap::new(),
        }
    }
}

impl LoadOptions {
    pub fn new(preamble_lines: usize) -> Self {
        Self {
            preamble_lines,
            ..Self::default()
        }
    }

    pub fn with_type(mut self, column: &str, ty: ColumnType) -> Self {
        self.column_types.insert(column.to_string(), ty);
        self
    }

    fn type_of(&self, column: &str) -> ColumnType {
        self.column_types.get(column).copied().unwrap_or_default()
    }
}

/// Decode `raw` and parse it into a `Table`.
#[tracing::instrument(level = "debug", skip_all, fields(source = %raw.source()))]
pub fn load_table(raw: &RawInput, opts: &LoadOptions) -> Result<Table> {
    let table = parse_table(raw.text()?, opts)?;
    info!(
        source = %raw.source(),
        rows = table.len(),
        columns = table.columns().len(),
        "loaded table"
    );
    Ok(table)
}

/// Parse text laid out as `preamble_lines` metadata lines, a header line,
/// then data lines with exactly one field per header column.
///
/// Nothing is returned unless every line parses.
pub fn parse_table(text: &str, opts: &LoadOptions) -> Result<Table> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let skip = opts.preamble_lines;

    // 1) Preamble: exactly `skip` raw lines, blank ones included
    let mut rest = text;
    let mut preamble = Vec::with_capacity(skip);
    for seen in 0..skip {
        let (line, tail) = next_line(rest).ok_or_else(|| too_short(skip, seen))?;
        preamble.push(line.to_string());
        rest = tail;
    }

    // 2) Header must be the very next line
    let header_line = skip + 1;
    match next_line(rest) {
        None => return Err(too_short(skip, skip)),
        Some((line, _)) if line.trim().is_empty() => {
            return Err(EngineError::parse(header_line, "header line is empty"))
        }
        Some(_) => {}
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(rest.as_bytes());
    let mut records = rdr.records();

    let header = records
        .next()
        .ok_or_else(|| too_short(skip, skip))?
        .map_err(|e| csv_error(skip, e))?;
    let columns = build_columns(header.iter(), header_line, opts)?;

    // 3) Data rows
    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| csv_error(skip, e))?;
        // whitespace-only lines trim down to empty fields
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = skip + record.position().map_or(0, |p| p.line() as usize);
        if record.len() != columns.len() {
            return Err(EngineError::parse(
                line,
                format!(
                    "expected {} fields, found {}",
                    columns.len(),
                    record.len()
                ),
            ));
        }
        let values = record
            .iter()
            .zip(&columns)
            .map(|(cell, col)| {
                parse_cell(cell, col.ty).map_err(|msg| {
                    EngineError::parse(line, format!("column `{}`: {}", col.name, msg))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(Row::new(values));
    }
    debug!(rows = rows.len(), "parsed data rows");

    Table::new(Preamble::new(preamble), columns, rows)
}

fn build_columns<'a>(
    names: impl Iterator<Item = &'a str>,
    line: usize,
    opts: &LoadOptions,
) -> Result<Vec<Column>> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for (idx, name) in names.enumerate() {
        if name.is_empty() {
            return Err(EngineError::parse(
                line,
                format!("header field {} is empty", idx + 1),
            ));
        }
        if !seen.insert(name) {
            return Err(EngineError::parse(
                line,
                format!("duplicate column name `{}`", name),
            ));
        }
        columns.push(Column::new(name, opts.type_of(name)));
    }

    for name in opts.column_types.keys() {
        if !seen.contains(name.as_str()) {
            warn!(column = %name, "typed column not present in header");
        }
    }
    Ok(columns)
}

/// Convert one trimmed cell according to its column's declared type.
pub fn parse_cell(cell: &str, ty: ColumnType) -> std::result::Result<Value, String> {
    match ty {
        ColumnType::Text => Ok(Value::Text(cell.to_string())),
        _ if cell.is_empty() => Ok(Value::Empty),
        ColumnType::Integer => cell
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("`{}` is not an integer", cell)),
        ColumnType::Float => cell
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("`{}` is not a number", cell)),
        ColumnType::Date => date_parser::parse_date(cell)
            .map(Value::Date)
            .ok_or_else(|| format!("`{}` is not a recognised date", cell)),
    }
}

/// Split off the first line (without its terminator). `None` once the input is exhausted.
fn next_line(s: &str) -> Option<(&str, &str)> {
    if s.is_empty() {
        return None;
    }
    match s.find('\n') {
        Some(pos) => Some((s[..pos].trim_end_matches('\r'), &s[pos + 1..])),
        None => Some((s.trim_end_matches('\r'), "")),
    }
}

fn too_short(preamble_lines: usize, found: usize) -> EngineError {
    EngineError::parse(
        found + 1,
        format!(
            "expected at least {} lines ({} preamble + header), input has {}",
            preamble_lines + 1,
            preamble_lines,
            found
        ),
    )
}

fn csv_error(offset: usize, e: csv::Error) -> EngineError {
    let line = offset + e.position().map_or(0, |p| p.line() as usize);
    EngineError::parse(line, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,trendreport::load=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    const SAMPLE: &str = "\u{feff}Data Table for Daily Case Trends - The United States
Date generated: Mon Feb 14 2022 16:51:47 GMT-0500 (Eastern Standard Time)

State, Date ,New Cases,7-Day Moving Avg,Historic Cases
United States,Feb 12 2022,37145,172370,0
United States,Feb 11 2022,245312,190536,
\"Guam, Territory of\",Feb 10 2022,312,180.5,2
";

    fn opts() -> LoadOptions {
        LoadOptions::default()
            .with_type("Date", ColumnType::Date)
            .with_type("New Cases", ColumnType::Integer)
            .with_type("7-Day Moving Avg", ColumnType::Float)
            .with_type("Historic Cases", ColumnType::Integer)
    }

    #[test]
    fn test_load_cdc_sample() -> anyhow::Result<()> {
        init_test_logging();
        let raw = RawInput::from_text("sample", SAMPLE);
        let table = load_table(&raw, &opts())?;

        assert_eq!(
            table.preamble().title(),
            Some("Data Table for Daily Case Trends - The United States")
        );
        assert_eq!(
            table.preamble().generated_at(),
            Some("Mon Feb 14 2022 16:51:47 GMT-0500 (Eastern Standard Time)")
        );
        assert_eq!(table.preamble().lines()[2], "");
        assert_eq!(
            table.column_names(),
            vec!["State", "Date", "New Cases", "7-Day Moving Avg", "Historic Cases"]
        );
        assert_eq!(table.columns()[0].ty, ColumnType::Text);
        assert_eq!(table.len(), 3);

        let first = &table.rows()[0];
        assert_eq!(
            first.get(1),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2022, 2, 12).unwrap()))
        );
        assert_eq!(first.get(2), Some(&Value::Integer(37145)));
        assert_eq!(first.get(3), Some(&Value::Float(172370.0)));
        assert_eq!(table.rows()[1].get(4), Some(&Value::Empty));
        assert_eq!(
            table.rows()[2].get(0),
            Some(&Value::Text("Guam, Territory of".into()))
        );
        Ok(())
    }

    #[test]
    fn test_same_bytes_same_table() -> anyhow::Result<()> {
        let a = parse_table(SAMPLE, &opts())?;
        let b = parse_table(SAMPLE, &opts())?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_field_count_mismatch_is_rejected() {
        let short = "t\ng\n\na,b,c\n1,2,3\n4,5\n";
        match parse_table(short, &LoadOptions::default()) {
            Err(EngineError::Parse { line, message }) => {
                assert_eq!(line, 6);
                assert!(message.contains("expected 3 fields, found 2"), "{}", message);
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        let long = "t\ng\n\na,b\n1,2,3\n";
        assert!(matches!(
            parse_table(long, &LoadOptions::default()),
            Err(EngineError::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn test_too_few_lines() {
        let err = parse_table("title\ngenerated\n\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::Parse { line: 4, .. }), "{:?}", err);

        let err = parse_table("", &LoadOptions::new(0)).unwrap_err();
        assert!(matches!(err, EngineError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_header_without_rows_is_an_empty_table() -> anyhow::Result<()> {
        let table = parse_table("a, b", &LoadOptions::new(0))?;
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert!(table.is_empty());
        Ok(())
    }

    #[test]
    fn test_bad_header() {
        let blank = "t\ng\n\n  \na,b\n";
        assert!(matches!(
            parse_table(blank, &LoadOptions::default()),
            Err(EngineError::Parse { line: 4, .. })
        ));

        let dup = "a,b,a\n1,2,3\n";
        assert!(matches!(
            parse_table(dup, &LoadOptions::new(0)),
            Err(EngineError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_typed_cell_failure() {
        let text = "New Cases\n12\ntwelve\n";
        let opts = LoadOptions::new(0).with_type("New Cases", ColumnType::Integer);
        match parse_table(text, &opts) {
            Err(EngineError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("New Cases"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_whitespace_only_lines_are_skipped() -> anyhow::Result<()> {
        let text = "a,b\n1,2\n   \n\t\n3,4\n";
        let opts = LoadOptions::new(0).with_type("b", ColumnType::Integer);
        let table = parse_table(text, &opts)?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].get(1), Some(&Value::Integer(4)));

        let ragged = parse_table("a,b\n1,2\n  ,  ,x\n", &LoadOptions::new(0));
        assert!(matches!(ragged, Err(EngineError::Parse { line: 3, .. })));
        Ok(())
    }

    #[test]
    fn test_crlf_and_blank_data_lines() -> anyhow::Result<()> {
        let text = "title\r\nDate,n\r\nFeb 01 2022,1\r\n\r\nFeb 02 2022,2\r\n";
        let opts = LoadOptions::new(1)
            .with_type("Date", ColumnType::Date)
            .with_type("n", ColumnType::Integer);
        let table = parse_table(text, &opts)?;
        assert_eq!(table.preamble().title(), Some("title"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].get(1), Some(&Value::Integer(2)));
        Ok(())
    }
}
