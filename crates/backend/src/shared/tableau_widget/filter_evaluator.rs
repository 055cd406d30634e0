//! Filter evaluation over raw rows
//!
//! Filters compose with AND semantics: each one narrows the rows left by the
//! previous one. Evaluation never fails; values that cannot be read as the
//! filter's type simply do not match.

use std::collections::HashSet;

use chrono::NaiveDate;
use contracts::shared::tableau_widget::{
    cell, parse_date, ActiveFilter, CellValue, FilterMode, NumOperator, Row, TextOperator,
};

use super::date_presets::{resolve_date_preset, DateRange};

/// Filter with its inputs parsed once, ready to test rows
#[derive(Debug)]
enum Predicate {
    /// Passes every row
    All,
    /// Hides every row
    Nothing,
    Values(HashSet<String>),
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
    Text {
        operator: TextOperator,
        needle: String,
    },
    Number {
        operator: NumOperator,
        value: f64,
        value2: f64,
    },
    Date(DateRange),
}

/// Compiled form of one active filter
#[derive(Debug)]
pub struct CompiledFilter<'a> {
    key: &'a str,
    predicate: Predicate,
}

impl<'a> CompiledFilter<'a> {
    /// Parse the inputs of the filter's current mode; date presets resolve against `today`
    pub fn new(filter: &'a ActiveFilter, today: NaiveDate) -> Self {
        Self {
            key: filter.field.row_key(),
            predicate: compile(filter, today),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        let value = cell(row, self.key);
        match &self.predicate {
            Predicate::All => true,
            Predicate::Nothing => false,
            Predicate::Values(allowed) => allowed.contains(&value.as_text()),
            Predicate::Range { min, max } => {
                let n = value.as_number();
                min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m)
            }
            Predicate::Text { operator, needle } => {
                text_matches(*operator, &value.as_text().to_lowercase(), needle)
            }
            Predicate::Number {
                operator,
                value: target,
                value2,
            } => number_matches(*operator, value.as_number(), *target, *value2),
            Predicate::Date(range) => value.as_date().is_some_and(|d| range.contains(d)),
        }
    }
}

fn compile(filter: &ActiveFilter, today: NaiveDate) -> Predicate {
    match filter.mode {
        FilterMode::Values => {
            if filter.selected_values.is_empty() {
                Predicate::Nothing
            } else {
                Predicate::Values(filter.selected_values.iter().cloned().collect())
            }
        }
        FilterMode::Range => match (filter.range_min, filter.range_max) {
            (None, None) => Predicate::All,
            (min, max) => Predicate::Range { min, max },
        },
        FilterMode::TextCondition => match filter.text_value.as_deref() {
            None | Some("") => Predicate::All,
            Some(text) => Predicate::Text {
                operator: filter.text_operator.unwrap_or_default(),
                needle: text.to_lowercase(),
            },
        },
        FilterMode::NumCondition => match &filter.num_value {
            None => Predicate::All,
            Some(value) => Predicate::Number {
                operator: filter.num_operator.unwrap_or_default(),
                value: value.as_number(),
                value2: filter
                    .num_value2
                    .as_ref()
                    .map_or(f64::NAN, CellValue::as_number),
            },
        },
        FilterMode::Date => compile_date(filter, today),
    }
}

fn compile_date(filter: &ActiveFilter, today: NaiveDate) -> Predicate {
    let preset = filter.date_preset.unwrap_or_default();
    if let Some(range) = resolve_date_preset(preset, today) {
        return Predicate::Date(range);
    }

    let from = filter.date_from.as_deref().filter(|s| !s.trim().is_empty());
    let to = filter.date_to.as_deref().filter(|s| !s.trim().is_empty());
    if from.is_none() && to.is_none() {
        return Predicate::All;
    }

    let from = from.map(parse_date);
    let to = to.map(parse_date);
    if matches!(from, Some(None)) || matches!(to, Some(None)) {
        tracing::debug!(
            "Filter {}: unreadable custom date bound, hiding all rows",
            filter.id
        );
        return Predicate::Nothing;
    }
    Predicate::Date(DateRange {
        from: from.flatten(),
        to: to.flatten(),
    })
}

/// `haystack` and `needle` are already lowercase
fn text_matches(operator: TextOperator, haystack: &str, needle: &str) -> bool {
    match operator {
        TextOperator::Contains => haystack.contains(needle),
        TextOperator::NotContains => !haystack.contains(needle),
        TextOperator::Equals => haystack == needle,
        TextOperator::NotEquals => haystack != needle,
        TextOperator::StartsWith => haystack.starts_with(needle),
        TextOperator::EndsWith => haystack.ends_with(needle),
    }
}

fn number_matches(operator: NumOperator, n: f64, value: f64, value2: f64) -> bool {
    // NaN on either side fails every operator, including `notEquals`
    if n.is_nan() || value.is_nan() {
        return false;
    }
    match operator {
        NumOperator::Equals => n == value,
        NumOperator::NotEquals => n != value,
        NumOperator::Greater => n > value,
        NumOperator::GreaterEq => n >= value,
        NumOperator::Less => n < value,
        NumOperator::LessEq => n <= value,
        NumOperator::Between => n >= value && n <= value2,
    }
}

/// Keep the rows that pass one filter
pub fn apply_filter(mut rows: Vec<Row>, filter: &ActiveFilter, today: NaiveDate) -> Vec<Row> {
    let compiled = CompiledFilter::new(filter, today);
    let before = rows.len();
    rows.retain(|row| compiled.matches(row));
    tracing::debug!(
        "Filter {} ({}): {} -> {} rows",
        filter.id,
        filter.display_text(),
        before,
        rows.len()
    );
    rows
}

/// Fold every filter over the rows, in order
pub fn apply_filters(rows: Vec<Row>, filters: &[ActiveFilter], today: NaiveDate) -> Vec<Row> {
    filters
        .iter()
        .fold(rows, |rows, filter| apply_filter(rows, filter, today))
}

/// Distinct stringified values of a key, in first-seen order
pub fn distinct_values(rows: &[Row], key: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|row| cell(row, key).as_text())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
