use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::catalog::Software;
use super::config::{DashboardWidget, DroppedField, TableauWidgetConfig, WidgetSize};
use super::field::Field;
use super::value::{CellValue, Row};

/// Chart-ready structure handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    /// Filtered (and optionally grouped) rows
    pub data: Vec<Row>,
    /// Row key of the category axis
    pub x_key: String,
    /// Row keys of the plotted measures
    pub y_keys: Vec<String>,
    /// Measures on the values shelf, in the order of `y_keys`
    pub y_measure_fields: Vec<DroppedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_key: Option<String>,
}

/// Slice of a pie chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
}

/// Data in the shape a given chart type expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderPayload {
    /// Cartesian charts (bar, line, area, radar, scatter)
    Series(ChartData),
    /// `{name, value}` pairs from the x key and the first y key
    Pie { slices: Vec<PieSlice> },
    /// Flat table with `xKey` followed by `yKeys`
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    },
}

/// Request to shape a configuration against rows supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRequest {
    pub config: TableauWidgetConfig,
    /// Raw rows by data source id
    #[serde(default)]
    pub rows: HashMap<String, Vec<Row>>,
}

/// Result of shaping; both parts are absent when there is no chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeResponse {
    pub chart: Option<ChartData>,
    pub payload: Option<RenderPayload>,
}

/// Response listing the field catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSoftwaresResponse {
    pub softwares: Vec<Software>,
}

/// Request for the fields selectable in a configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableFieldsRequest {
    pub config: TableauWidgetConfig,
}

/// Fields selectable in a configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableFieldsResponse {
    pub fields: Vec<Field>,
}

/// Request to filter one field of a configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFilterRequest {
    pub config: TableauWidgetConfig,
    /// Composite id of the field to filter
    pub field_id: String,
}

/// Configuration with the new (or already existing) filter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFilterResponse {
    pub config: TableauWidgetConfig,
    pub filter_id: String,
}

/// Response listing the widgets of the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListWidgetsResponse {
    pub widgets: Vec<DashboardWidget>,
}

/// Response after saving a widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveWidgetResponse {
    /// Saved widget ID
    pub id: String,
    /// Success message
    pub message: String,
}

/// Response after deleting a widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteWidgetResponse {
    /// Success flag
    pub success: bool,
    /// Response message
    pub message: String,
}

/// Request to resize a widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeWidgetRequest {
    pub size: WidgetSize,
}

/// Request to reorder the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderWidgetsRequest {
    pub ids: Vec<String>,
}
