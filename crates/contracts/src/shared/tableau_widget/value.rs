use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw row supplied by the data layer, keyed by catalog field id
pub type Row = HashMap<String, CellValue>;

/// Scalar value of a raw row cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
}

impl CellValue {
    /// String form used for value-set and text filters, grouping and distinct counts
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Numeric form; anything that is not a number becomes NaN
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Null => f64::NAN,
            CellValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Integer(i) => *i as f64,
            CellValue::Number(n) => *n,
            CellValue::Text(s) => parse_number(s),
        }
    }

    /// Calendar date of the value, if it can be read as one
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Text(s) => parse_date(s),
            CellValue::Integer(ms) => DateTime::from_timestamp_millis(*ms).map(|d| d.date_naive()),
            CellValue::Number(ms) if ms.is_finite() => {
                DateTime::from_timestamp_millis(*ms as i64).map(|d| d.date_naive())
            }
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// Missing cells read as null
pub fn cell<'a>(row: &'a Row, key: &str) -> &'a CellValue {
    const NULL: &CellValue = &CellValue::Null;
    row.get(key).unwrap_or(NULL)
}

/// Parse user or row text as a number (blank and malformed text are NaN)
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse a date from the formats the data layer emits
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y/%m/%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }
    None
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}
