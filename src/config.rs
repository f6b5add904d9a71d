// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::derive::{DerivedColumn, DEFAULT_PRECISION, DEFAULT_WINDOW};
use crate::load::{LoadOptions, DEFAULT_PREAMBLE_LINES};
use crate::report::{ReportOptions, WriteMode, DEFAULT_DATE_FORMAT};
use crate::table::ColumnType;

/// Everything a session needs to know about its input and artifacts.
/// Every field has a default, so a config file only names what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: PathBuf,
    pub preamble_lines: usize,
    pub column_types: BTreeMap<String, ColumnType>,

    pub date_column: String,
    pub metric_column: String,
    pub group_column: String,
    /// Dependent column of the trend-line fit; the metric column is the other.
    pub fit_column: String,

    /// Rows shown by the "most recent" operation.
    pub recent_rows: usize,
    pub top_n: i64,
    pub precision: u32,

    pub date_format: String,
    pub output_dir: PathBuf,
    pub duplicate_file: String,
    pub copy_file: String,
    pub report_file: String,
    pub report_title: Option<String>,
    pub overwrite: bool,

    /// Columns appended when writing the transformed report.
    pub derived: Vec<DerivedColumn>,
}

impl Default for Config {
    fn default() -> Self {
        let column_types = [
            ("Date", ColumnType::Date),
            ("New Cases", ColumnType::Integer),
            ("7-Day Moving Avg", ColumnType::Float),
            ("Historic Cases", ColumnType::Integer),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            input: PathBuf::from("data_table_for_daily_case_trends__the_united_states.csv"),
            preamble_lines: DEFAULT_PREAMBLE_LINES,
            column_types,
            date_column: "Date".into(),
            metric_column: "New Cases".into(),
            group_column: "State".into(),
            fit_column: "7-Day Moving Avg".into(),
            recent_rows: 5,
            top_n: 10,
            precision: DEFAULT_PRECISION,
            date_format: DEFAULT_DATE_FORMAT.into(),
            output_dir: PathBuf::from("output"),
            duplicate_file: "duplicate.csv".into(),
            copy_file: "copy_data.csv".into(),
            report_file: "data_output.csv".into(),
            report_title: None,
            overwrite: false,
            derived: vec![
                DerivedColumn::rolling_mean("Rolling 7-Day Avg", "New Cases", DEFAULT_WINDOW),
                DerivedColumn::reserved("Historic Cases Estimate"),
            ],
        }
    }
}

impl Config {
    /// Read a YAML or JSON (by extension) config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        let cfg: Config = if is_json {
            serde_json::from_str(&text)
                .with_context(|| format!("parsing JSON config {}", path.display()))?
        } else {
            serde_yaml::from_str(&text)
                .with_context(|| format!("parsing YAML config {}", path.display()))?
        };
        debug!(config = ?cfg, "loaded config");
        Ok(cfg)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            preamble_lines: self.preamble_lines,
            column_types: self.column_types.clone(),
        }
    }

    pub fn write_mode(&self) -> WriteMode {
        if self.overwrite {
            WriteMode::Overwrite
        } else {
            WriteMode::Idempotent
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            date_format: self.date_format.clone(),
            title: self.report_title.clone(),
            mode: self.write_mode(),
        }
    }

    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::DerivedRule;
    use tempfile::tempdir;

    #[test]
    fn yaml_overrides_only_what_it_names() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("report.yaml");
        fs::write(
            &path,
            r#"
input: lab03/cases.csv
preamble_lines: 0
column_types:
  submission_date: date
  new_case: int
date_column: submission_date
metric_column: new_case
group_column: state
derived:
  - name: 7-Day Moving Avg
    rule: rolling
    source: new_case
  - name: Historic Cases
    rule: reserved
"#,
        )?;
        let cfg = Config::load(&path)?;
        assert_eq!(cfg.input, PathBuf::from("lab03/cases.csv"));
        assert_eq!(cfg.preamble_lines, 0);
        assert_eq!(cfg.column_types["new_case"], ColumnType::Integer);
        assert_eq!(cfg.top_n, 10);
        assert_eq!(cfg.report_file, "data_output.csv");
        assert!(matches!(
            cfg.derived[0].rule,
            DerivedRule::Rolling { window: 7, .. }
        ));

        let opts = cfg.load_options();
        assert_eq!(opts.preamble_lines, 0);
        assert_eq!(opts.column_types.len(), 2);
        Ok(())
    }

    #[test]
    fn json_config_and_write_mode() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("report.json");
        fs::write(&path, r#"{"overwrite": true, "output_dir": "out", "report_title": "T"}"#)?;
        let cfg = Config::load(&path)?;
        assert_eq!(cfg.write_mode(), WriteMode::Overwrite);
        assert_eq!(cfg.artifact_path("x.csv"), PathBuf::from("out").join("x.csv"));
        assert_eq!(cfg.report_options().title.as_deref(), Some("T"));
        assert_eq!(Config::default().write_mode(), WriteMode::Idempotent);
        Ok(())
    }

    #[test]
    fn bad_config_has_context() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "preamble_lines: lots").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing YAML config"));
    }
}
