use serde::{Deserialize, Serialize};

/// Separator between the data source instance id and the raw field id in `Field::id`
pub const FIELD_ID_SEPARATOR: char = '.';

/// Value type of a catalog field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Date,
}

/// Role of a field on the shelves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Categorical field, usable as a grouping axis
    Dimension,
    /// Numeric field, usable as a chart value
    Measure,
}

impl FieldKind {
    /// Kind derived from the data type at registration time
    pub fn from_data_type(data_type: DataType) -> Self {
        match data_type {
            DataType::Number => FieldKind::Measure,
            DataType::String | DataType::Date => FieldKind::Dimension,
        }
    }
}

/// Where a field comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldSource {
    /// Raw field of a catalog table, bound to one data source instance
    #[serde(rename_all = "camelCase")]
    Catalog {
        software_id: String,
        table_id: String,
        data_source_id: String,
        field_id: String,
    },
    /// User-defined formula, kept unparsed
    #[serde(rename_all = "camelCase")]
    Calculated {
        calculated_id: String,
        formula: String,
    },
}

/// Field selectable in the widget builder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Globally unique id (data source instance id + raw field id)
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub data_type: DataType,
    pub source: FieldSource,
}

impl Field {
    /// Key of this field inside raw rows
    ///
    /// Raw rows are keyed by the catalog field id, never by the composite `Field::id`.
    pub fn row_key(&self) -> &str {
        match &self.source {
            FieldSource::Catalog { field_id, .. } => field_id,
            FieldSource::Calculated { calculated_id, .. } => calculated_id,
        }
    }

    pub fn source_table(&self) -> &str {
        match &self.source {
            FieldSource::Catalog { table_id, .. } => table_id,
            FieldSource::Calculated { .. } => "calculated",
        }
    }

    pub fn source_software(&self) -> &str {
        match &self.source {
            FieldSource::Catalog { software_id, .. } => software_id,
            FieldSource::Calculated { .. } => "calculated",
        }
    }

    /// Whether the field was produced by the given data source instance
    pub fn belongs_to(&self, data_source_id: &str) -> bool {
        matches!(
            &self.source,
            FieldSource::Catalog { data_source_id: ds, .. } if ds == data_source_id
        )
    }

    pub fn is_calculated(&self) -> bool {
        matches!(self.source, FieldSource::Calculated { .. })
    }

    /// Whether the field is the synthetic field of the given calculated field
    pub fn is_calculated_field(&self, id: &str) -> bool {
        matches!(&self.source, FieldSource::Calculated { calculated_id, .. } if calculated_id == id)
    }
}

/// Build the composite field id for a data source instance
pub fn composite_field_id(data_source_id: &str, field_id: &str) -> String {
    format!("{}{}{}", data_source_id, FIELD_ID_SEPARATOR, field_id)
}

/// Last segment of a composite field id (the raw catalog field id)
pub fn last_segment(field_id: &str) -> &str {
    field_id
        .rsplit(FIELD_ID_SEPARATOR)
        .next()
        .unwrap_or(field_id)
}
