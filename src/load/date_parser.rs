use chrono::{NaiveDate, NaiveDateTime};

/// Date-only spellings, tried in order. The first is the CDC export style
/// (`Feb 14 2022`) and also what reports are written with.
const DATE_FORMATS: &[&str] = &["%b %d %Y", "%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Date-time spellings; only the date part is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parse a trimmed date cell into a calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}
