use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a column, supplied by the caller's type map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Date,
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "number", alias = "numeric")]
    Float,
    #[default]
    #[serde(alias = "string")]
    Text,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Date => "date",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Date(NaiveDate),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Empty cell in a date or numeric column.
    Empty,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Text form used when writing CSV artifacts and printing rows.
    pub fn render(&self, date_format: &str) -> String {
        match self {
            Value::Date(d) => d.format(date_format).to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Empty => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_uses_date_format_and_blank_for_empty() {
        let d = Value::Date(NaiveDate::from_ymd_opt(2022, 2, 3).unwrap());
        assert_eq!(d.render("%b %d %Y"), "Feb 03 2022");
        assert_eq!(Value::Empty.render("%b %d %Y"), "");
        assert_eq!(Value::Float(9.5).render(""), "9.5");
        assert_eq!(Value::Integer(-4).as_f64(), Some(-4.0));
        assert_eq!(Value::Text("4".into()).as_f64(), None);
    }

    #[test]
    fn column_type_accepts_aliases() {
        let ty: ColumnType = serde_yaml::from_str("int").unwrap();
        assert_eq!(ty, ColumnType::Integer);
        let ty: ColumnType = serde_yaml::from_str("string").unwrap();
        assert_eq!(ty, ColumnType::Text);
    }
}
