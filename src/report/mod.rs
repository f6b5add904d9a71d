// src/report/mod.rs
mod atomic;

pub use atomic::{write_atomic, WriteMode, WriteStatus};

use chrono::{DateTime, Local};
use csv::WriterBuilder;
use std::{io, path::Path};

use crate::error::{EngineError, Result};
use crate::load::RawInput;
use crate::table::Table;

/// Date cells are written like `Feb 14 2022`.
pub const DEFAULT_DATE_FORMAT: &str = "%b %d %Y";

/// First report line when neither the options nor the input supply one.
pub const DEFAULT_TITLE: &str = "Data Table";

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub date_format: String,
    /// Replaces the first preamble line when set.
    pub title: Option<String>,
    pub mode: WriteMode,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            title: None,
            mode: WriteMode::Idempotent,
        }
    }
}

pub fn generation_line(at: DateTime<Local>) -> String {
    format!("Date generated: {}", at.format("%a %b %d %Y %H:%M:%S GMT%z"))
}

/// Full artifact text: a title line, a fresh generation line, any further
/// preamble lines verbatim, then the header and every row.
///
/// The title is `opts.title`, else the loaded title, else [`DEFAULT_TITLE`], so
/// a table read without a preamble still gets both lines.
pub fn render_report(
    table: &Table,
    opts: &ReportOptions,
    generated_at: DateTime<Local>,
) -> Result<Vec<u8>> {
    let title = opts
        .title
        .as_deref()
        .or_else(|| table.preamble().title())
        .unwrap_or(DEFAULT_TITLE);

    let mut out: Vec<u8> = Vec::new();
    let mut push_line = |line: &str| {
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
    };
    push_line(title);
    push_line(&generation_line(generated_at));
    for line in table.preamble().lines().iter().skip(2) {
        push_line(line);
    }
    out.extend(render_rows(table, &opts.date_format)?);
    Ok(out)
}

/// Header plus rows, comma-delimited, no preamble.
pub fn render_rows(table: &Table, date_format: &str) -> Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(table.column_names()).map_err(csv_error)?;
    for row in table.rows() {
        wtr.write_record(row.values().iter().map(|v| v.render(date_format)))
            .map_err(csv_error)?;
    }
    wtr.into_inner().map_err(|e| EngineError::Io {
        context: "flushing rows".into(),
        source: e.into_error(),
    })
}

/// Write `table` as a report artifact at `path`.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(path = %path.display(), rows = table.len())
)]
pub fn write_report(path: &Path, table: &Table, opts: &ReportOptions) -> Result<WriteStatus> {
    if opts.mode == WriteMode::Idempotent && path.exists() {
        return Ok(WriteStatus::AlreadyExists(path.to_path_buf()));
    }
    let contents = render_report(table, opts, Local::now())?;
    write_atomic(path, &contents, opts.mode)
}

/// Write only the header and data rows, dropping the preamble.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(path = %path.display(), rows = table.len())
)]
pub fn write_rows(path: &Path, table: &Table, opts: &ReportOptions) -> Result<WriteStatus> {
    if opts.mode == WriteMode::Idempotent && path.exists() {
        return Ok(WriteStatus::AlreadyExists(path.to_path_buf()));
    }
    let contents = render_rows(table, &opts.date_format)?;
    write_atomic(path, &contents, opts.mode)
}

/// Byte-for-byte copy of the original input.
pub fn duplicate_raw(path: &Path, raw: &RawInput, mode: WriteMode) -> Result<WriteStatus> {
    write_atomic(path, raw.bytes(), mode)
}

fn csv_error(e: csv::Error) -> EngineError {
    EngineError::Io {
        context: "serialising rows".into(),
        source: io::Error::from(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::{materialize_all, DerivedColumn};
    use crate::load::{load_table, parse_table, LoadOptions};
    use crate::table::{ColumnType, Value};
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    const INPUT: &str = "Data Table for Daily Case Trends - The United States
Date generated: Mon Feb 14 2022 16:51:47 GMT-0500 (Eastern Standard Time)

State,Date,New Cases
United States,Feb 12 2022,37145
United States,Feb 11 2022,245312
\"Guam, Territory of\",Feb 10 2022,
";

    fn opts() -> LoadOptions {
        LoadOptions::default()
            .with_type("Date", ColumnType::Date)
            .with_type("New Cases", ColumnType::Integer)
    }

    #[test]
    fn test_render_regenerates_generation_line() -> anyhow::Result<()> {
        let table = parse_table(INPUT, &opts())?;
        let at = Local.with_ymd_and_hms(2026, 10, 16, 9, 30, 5).unwrap();
        let out = String::from_utf8(render_report(&table, &ReportOptions::default(), at)?)?;
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Data Table for Daily Case Trends - The United States");
        assert!(lines[1].starts_with("Date generated: Fri Oct 16 2026 09:30:05 GMT"));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "State,Date,New Cases");
        assert_eq!(lines[4], "United States,Feb 12 2022,37145");
        assert_eq!(lines[6], "\"Guam, Territory of\",Feb 10 2022,");
        Ok(())
    }

    #[test]
    fn test_title_override() -> anyhow::Result<()> {
        let table = parse_table(INPUT, &opts())?;
        let ropts = ReportOptions {
            title: Some("Weekly Report".into()),
            ..ReportOptions::default()
        };
        let out = String::from_utf8(render_report(&table, &ropts, Local::now())?)?;
        assert_eq!(out.lines().next(), Some("Weekly Report"));
        Ok(())
    }

    #[test]
    fn test_headerless_input_still_gets_title_and_generation_line() -> anyhow::Result<()> {
        let bare = LoadOptions::new(0)
            .with_type("Date", ColumnType::Date)
            .with_type("New Cases", ColumnType::Integer);
        let table = parse_table("Date,New Cases\nFeb 01 2022,3\n", &bare)?;
        let at = Local.with_ymd_and_hms(2026, 10, 16, 9, 30, 5).unwrap();

        let titled = ReportOptions {
            title: Some("Cases by State".into()),
            ..ReportOptions::default()
        };
        let out = String::from_utf8(render_report(&table, &titled, at)?)?;
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Cases by State");
        assert!(lines[1].starts_with("Date generated: Fri Oct 16 2026 09:30:05 GMT"));
        assert_eq!(&lines[2..], ["Date,New Cases", "Feb 01 2022,3"]);

        let out = String::from_utf8(render_report(&table, &ReportOptions::default(), at)?)?;
        assert_eq!(out.lines().next(), Some(DEFAULT_TITLE));

        // the written report loads back with a two-line preamble
        let two_lines = LoadOptions::new(2).with_type("New Cases", ColumnType::Integer);
        let again = parse_table(&out, &two_lines)?;
        assert_eq!(again.preamble().title(), Some(DEFAULT_TITLE));
        assert_eq!(again.rows()[0].get(1), Some(&Value::Integer(3)));
        Ok(())
    }

    #[test]
    fn test_write_then_reload_round_trip() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("data_output.csv");
        let table = parse_table(INPUT, &opts())?;
        let derived = materialize_all(
            &table,
            &[
                DerivedColumn::rolling_mean("7-Day Avg", "New Cases", 7),
                DerivedColumn::reserved("Historic Cases"),
            ],
            2,
        )?;

        let status = write_report(&path, &derived, &ReportOptions::default())?;
        assert_eq!(status, WriteStatus::Written(path.clone()));

        let reloaded = load_table(&RawInput::from_path(&path)?, &opts())?;
        assert_eq!(reloaded.len(), table.len());
        assert_eq!(
            reloaded.column_names(),
            vec!["State", "Date", "New Cases", "7-Day Avg", "Historic Cases"]
        );
        for (a, b) in table.rows().iter().zip(reloaded.rows()) {
            assert_eq!(a.values(), &b.values()[..3]);
        }
        assert_eq!(reloaded.rows()[0].get(3), Some(&Value::Text("141228.5".into())));
        Ok(())
    }

    #[test]
    fn test_second_write_reports_already_exists() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("data_output.csv");
        let table = parse_table(INPUT, &opts())?;

        write_report(&path, &table, &ReportOptions::default())?;
        let first = fs::read(&path)?;

        let smaller = table.select(&["State"], Some(1))?;
        let status = write_report(&path, &smaller, &ReportOptions::default())?;
        assert_eq!(status, WriteStatus::AlreadyExists(path.clone()));
        assert_eq!(fs::read(&path)?, first);

        let overwrite = ReportOptions {
            mode: WriteMode::Overwrite,
            ..ReportOptions::default()
        };
        assert!(write_report(&path, &smaller, &overwrite)?.was_written());
        assert_ne!(fs::read(&path)?, first);
        Ok(())
    }

    #[test]
    fn test_duplicate_and_copy() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let raw = RawInput::from_text("input", INPUT);

        let dup = dir.path().join("duplicate.csv");
        duplicate_raw(&dup, &raw, WriteMode::Idempotent)?;
        assert_eq!(fs::read(&dup)?, INPUT.as_bytes());
        assert!(!duplicate_raw(&dup, &raw, WriteMode::Idempotent)?.was_written());

        let copy = dir.path().join("copy_data.csv");
        let table = load_table(&raw, &opts())?;
        write_rows(&copy, &table, &ReportOptions::default())?;
        let text = fs::read_to_string(&copy)?;
        assert!(text.starts_with("State,Date,New Cases\n"));

        let again = parse_table(&text, &LoadOptions::new(0).with_type("Date", ColumnType::Date))?;
        assert_eq!(again.len(), 3);
        Ok(())
    }
}
