use serde::{Deserialize, Serialize};

use super::field::{DataType, Field};
use super::value::CellValue;

/// Evaluation mode of an active filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Value-set selection (checkbox list)
    Values,
    /// Numeric range with optional bounds
    Range,
    /// Case-insensitive text comparison
    TextCondition,
    /// Numeric comparison
    NumCondition,
    /// Preset or custom date range
    Date,
}

impl FilterMode {
    /// Mode a new filter starts in for a field of the given data type
    pub fn default_for(data_type: DataType) -> Self {
        match data_type {
            DataType::Number => FilterMode::Range,
            DataType::Date => FilterMode::Date,
            DataType::String => FilterMode::Values,
        }
    }
}

/// Text comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TextOperator {
    #[default]
    Contains,
    NotContains,
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
}

impl TextOperator {
    pub fn label(&self) -> &'static str {
        match self {
            TextOperator::Contains => "contains",
            TextOperator::NotContains => "does not contain",
            TextOperator::Equals => "equals",
            TextOperator::NotEquals => "does not equal",
            TextOperator::StartsWith => "starts with",
            TextOperator::EndsWith => "ends with",
        }
    }
}

/// Numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NumOperator {
    #[default]
    Equals,
    NotEquals,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    /// Inclusive range between `numValue` and `numValue2`
    Between,
}

impl NumOperator {
    /// Get display symbol for UI
    pub fn symbol(&self) -> &'static str {
        match self {
            NumOperator::Equals => "=",
            NumOperator::NotEquals => "≠",
            NumOperator::Greater => ">",
            NumOperator::GreaterEq => "≥",
            NumOperator::Less => "<",
            NumOperator::LessEq => "≤",
            NumOperator::Between => "between",
        }
    }
}

/// Date range preset, resolved against the current day at evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DatePreset {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    LastQuarter,
    ThisYear,
    LastYear,
    Last7Days,
    Last30Days,
    /// Explicit `dateFrom`/`dateTo` bounds
    #[default]
    Custom,
}

impl DatePreset {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            DatePreset::Today => "Today",
            DatePreset::Yesterday => "Yesterday",
            DatePreset::ThisWeek => "This week",
            DatePreset::LastWeek => "Last week",
            DatePreset::ThisMonth => "This month",
            DatePreset::LastMonth => "Last month",
            DatePreset::ThisQuarter => "This quarter",
            DatePreset::LastQuarter => "Last quarter",
            DatePreset::ThisYear => "This year",
            DatePreset::LastYear => "Last year",
            DatePreset::Last7Days => "Last 7 days",
            DatePreset::Last30Days => "Last 30 days",
            DatePreset::Custom => "Custom range",
        }
    }
}

/// Filter attached to one field of the widget
///
/// Every mode keeps its own inputs so switching modes in the UI does not lose them;
/// only the inputs of the current `mode` take part in evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFilter {
    pub id: String,
    pub field: Field,
    pub mode: FilterMode,
    /// Allowed values in `values` mode; empty hides every row
    #[serde(default)]
    pub selected_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_operator: Option<TextOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_operator: Option<NumOperator>,
    /// Raw user input, number or text; malformed text compares as NaN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_value: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_value2: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_preset: Option<DatePreset>,
    /// YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    /// YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

impl ActiveFilter {
    /// Create a filter in the default mode for the field's data type
    pub fn new(field: Field, selected_values: Vec<String>) -> Self {
        let mode = FilterMode::default_for(field.data_type);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            field,
            mode,
            selected_values,
            range_min: None,
            range_max: None,
            text_operator: None,
            text_value: None,
            num_operator: None,
            num_value: None,
            num_value2: None,
            date_preset: None,
            date_from: None,
            date_to: None,
        }
    }

    /// Human-readable summary for filter chips
    pub fn display_text(&self) -> String {
        let name = &self.field.name;
        match self.mode {
            FilterMode::Values => {
                if self.selected_values.is_empty() {
                    format!("{}: nothing selected", name)
                } else if self.selected_values.len() <= 3 {
                    format!("{} in [{}]", name, self.selected_values.join(", "))
                } else {
                    format!("{}: {} values", name, self.selected_values.len())
                }
            }
            FilterMode::Range => match (self.range_min, self.range_max) {
                (Some(min), Some(max)) => format!("{}: {} to {}", name, min, max),
                (Some(min), None) => format!("{} ≥ {}", name, min),
                (None, Some(max)) => format!("{} ≤ {}", name, max),
                (None, None) => format!("{}: any value", name),
            },
            FilterMode::TextCondition => format!(
                "{} {} \"{}\"",
                name,
                self.text_operator.unwrap_or_default().label(),
                self.text_value.as_deref().unwrap_or("")
            ),
            FilterMode::NumCondition => {
                let operator = self.num_operator.unwrap_or_default();
                let value = self.num_value.as_ref().map(CellValue::as_text).unwrap_or_default();
                if operator == NumOperator::Between {
                    format!(
                        "{} between {} and {}",
                        name,
                        value,
                        self.num_value2.as_ref().map(CellValue::as_text).unwrap_or_default()
                    )
                } else {
                    format!("{} {} {}", name, operator.symbol(), value)
                }
            }
            FilterMode::Date => match self.date_preset.unwrap_or_default() {
                DatePreset::Custom => match (&self.date_from, &self.date_to) {
                    (Some(f), Some(t)) => format!("{}: {} to {}", name, f, t),
                    (Some(f), None) => format!("{} ≥ {}", name, f),
                    (None, Some(t)) => format!("{} ≤ {}", name, t),
                    (None, None) => format!("{}: any period", name),
                },
                preset => format!("{}: {}", name, preset.display_name()),
            },
        }
    }
}
