use serde::{Deserialize, Serialize};

use super::field::{DataType, Field, FieldKind, FieldSource};
use super::filter::ActiveFilter;

/// One instance of a catalog table within a widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: String,
    pub software_id: String,
    pub table_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Join type between two data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

/// Declared link between two adjacent data sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConfig {
    /// Data source id of the left side
    pub left_source: String,
    /// Data source id of the right side
    pub right_source: String,
    /// Raw field id on the left side
    pub left_key: String,
    /// Raw field id on the right side
    pub right_key: String,
    #[serde(rename = "type", default)]
    pub join_type: JoinType,
}

impl JoinConfig {
    pub fn references(&self, data_source_id: &str) -> bool {
        self.left_source == data_source_id || self.right_source == data_source_id
    }
}

/// Named slot a field can be dropped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shelf {
    Columns,
    Rows,
    Values,
    Color,
    Size,
}

impl Shelf {
    /// Whether the shelf holds a single field (assignment replaces)
    pub fn is_single(&self) -> bool {
        matches!(self, Shelf::Color | Shelf::Size)
    }

    /// Whether a field of the given kind may be dropped here
    pub fn accepts(&self, kind: FieldKind) -> bool {
        match (self, kind) {
            (Shelf::Columns | Shelf::Rows | Shelf::Color, _) => true,
            (Shelf::Values | Shelf::Size, FieldKind::Measure) => true,
            (Shelf::Values | Shelf::Size, FieldKind::Dimension) => false,
        }
    }

    pub fn all() -> &'static [Shelf] {
        &[Shelf::Columns, Shelf::Rows, Shelf::Values, Shelf::Color, Shelf::Size]
    }
}

/// Aggregate function applied to a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum AggregateFunction {
    /// Sum of values
    #[default]
    Sum,
    /// Average of numeric values
    Avg,
    /// Count of rows
    Count,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Count of unique stringified values
    CountDistinct,
}

impl AggregateFunction {
    /// Get display label for UI
    pub fn label(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "Sum",
            AggregateFunction::Avg => "Average",
            AggregateFunction::Count => "Count",
            AggregateFunction::Min => "Min",
            AggregateFunction::Max => "Max",
            AggregateFunction::CountDistinct => "Count distinct",
        }
    }
}

/// A field placed on a shelf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedField {
    pub field: Field,
    /// Only set for measures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregateFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl DroppedField {
    /// Place a field, measures start with `sum`
    pub fn new(field: Field) -> Self {
        let aggregation = match field.kind {
            FieldKind::Measure => Some(AggregateFunction::Sum),
            FieldKind::Dimension => None,
        };
        Self {
            field,
            aggregation,
            alias: None,
        }
    }

    /// Label shown on the shelf pill and chart legend
    pub fn display_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match self.aggregation {
            Some(agg) => format!("{}({})", agg.label(), self.field.name),
            None => self.field.name.clone(),
        }
    }
}

/// User-defined named formula; the formula is carried as opaque text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedField {
    pub id: String,
    pub name: String,
    pub formula: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
}

impl CalculatedField {
    /// Synthetic field exposed next to the catalog fields
    pub fn as_field(&self) -> Field {
        let data_type = match self.kind {
            FieldKind::Measure => DataType::Number,
            FieldKind::Dimension => DataType::String,
        };
        Field {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            data_type,
            source: FieldSource::Calculated {
                calculated_id: self.id.clone(),
                formula: self.formula.clone(),
            },
        }
    }
}

/// Chart type tag; does not constrain the shelves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
    Area,
    Radar,
    Table,
    Scatter,
}

/// Widget configuration: the unit persisted and replayed through shaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableauWidgetConfig {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub chart_type: ChartType,
    /// Ordered; the first one is the primary source
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub joins: Vec<JoinConfig>,
    #[serde(default)]
    pub columns: Vec<DroppedField>,
    #[serde(default)]
    pub rows: Vec<DroppedField>,
    #[serde(default)]
    pub values: Vec<DroppedField>,
    /// Legacy filter list, superseded by `active_filters_snapshot`
    #[serde(default)]
    pub filters: Vec<ActiveFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_by: Option<DroppedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_by: Option<DroppedField>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default = "default_true")]
    pub show_legend: bool,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default)]
    pub calculated_fields: Vec<CalculatedField>,
    #[serde(default)]
    pub active_filters_snapshot: Vec<ActiveFilter>,
    /// Group rows by the x value and aggregate the y values before charting
    #[serde(default)]
    pub group_by_x: bool,
}

/// Helper function for serde default
fn default_true() -> bool {
    true
}

impl TableauWidgetConfig {
    /// Create an empty widget configuration
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            chart_type: ChartType::default(),
            data_sources: Vec::new(),
            joins: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            values: Vec::new(),
            filters: Vec::new(),
            color_by: None,
            size_by: None,
            colors: Vec::new(),
            show_legend: true,
            show_grid: true,
            calculated_fields: Vec::new(),
            active_filters_snapshot: Vec::new(),
            group_by_x: false,
        }
    }

    /// First declared data source, which drives row iteration
    pub fn primary_data_source(&self) -> Option<&DataSource> {
        self.data_sources.first()
    }

    pub fn data_source(&self, id: &str) -> Option<&DataSource> {
        self.data_sources.iter().find(|ds| ds.id == id)
    }

    /// Fields currently placed on a shelf, in order
    pub fn shelf(&self, shelf: Shelf) -> Vec<&DroppedField> {
        match shelf {
            Shelf::Columns => self.columns.iter().collect(),
            Shelf::Rows => self.rows.iter().collect(),
            Shelf::Values => self.values.iter().collect(),
            Shelf::Color => self.color_by.iter().collect(),
            Shelf::Size => self.size_by.iter().collect(),
        }
    }

    /// Every field referenced by shelves and filters
    pub fn referenced_fields(&self) -> impl Iterator<Item = &Field> {
        self.columns
            .iter()
            .chain(self.rows.iter())
            .chain(self.values.iter())
            .chain(self.color_by.iter())
            .chain(self.size_by.iter())
            .map(|d| &d.field)
            .chain(self.active_filters_snapshot.iter().map(|f| &f.field))
    }
}

/// Size of a widget on the dashboard grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WidgetSize {
    fn default() -> Self {
        Self {
            width: 6,
            height: 4,
        }
    }
}

/// Widget placed on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardWidget {
    pub config: TableauWidgetConfig,
    #[serde(default)]
    pub size: WidgetSize,
    #[serde(default)]
    pub order: usize,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind: FieldKind) -> Field {
        CalculatedField {
            id: "calc-1".to_string(),
            name: "Margin".to_string(),
            formula: "[revenue] - [cost]".to_string(),
            kind,
        }
        .as_field()
    }

    #[test]
    fn test_shelf_acceptance() {
        for shelf in Shelf::all() {
            assert!(shelf.accepts(FieldKind::Measure));
        }
        assert!(Shelf::Columns.accepts(FieldKind::Dimension));
        assert!(Shelf::Rows.accepts(FieldKind::Dimension));
        assert!(Shelf::Color.accepts(FieldKind::Dimension));
        assert!(!Shelf::Values.accepts(FieldKind::Dimension));
        assert!(!Shelf::Size.accepts(FieldKind::Dimension));
    }

    #[test]
    fn test_dropped_field_default_aggregation() {
        assert_eq!(
            DroppedField::new(field(FieldKind::Measure)).aggregation,
            Some(AggregateFunction::Sum)
        );
        assert_eq!(DroppedField::new(field(FieldKind::Dimension)).aggregation, None);
        assert_eq!(DroppedField::new(field(FieldKind::Measure)).display_name(), "Sum(Margin)");
    }

    #[test]
    fn test_config_round_trip_defaults() {
        let json = r#"{"id": "w1", "title": "Sales"}"#;
        let config: TableauWidgetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.chart_type, ChartType::Bar);
        assert!(config.show_legend);
        assert!(config.show_grid);
        assert!(!config.group_by_x);
        assert!(config.primary_data_source().is_none());

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["chartType"], "bar");
        assert!(value.get("activeFiltersSnapshot").is_some());
        assert!(value.get("colorBy").is_none());
    }

    #[test]
    fn test_aggregate_wire_names() {
        let value = serde_json::to_value(AggregateFunction::CountDistinct).unwrap();
        assert_eq!(value, "countDistinct");
        let join: JoinConfig = serde_json::from_str(
            r#"{"leftSource": "a", "rightSource": "b", "leftKey": "id", "rightKey": "customer_id", "type": "left"}"#,
        )
        .unwrap();
        assert_eq!(join.join_type, JoinType::Left);
        assert!(join.references("b"));
    }
}
