use serde::{Deserialize, Serialize};

use super::field::DataType;

/// Software (business area) exposing a set of tables (static version for the registry)
#[derive(Debug, Clone)]
pub struct SoftwareDef {
    /// Unique identifier (e.g., "sales")
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Tables available in this software
    pub tables: &'static [TableDef],
}

/// Table definition inside a software (static version)
#[derive(Debug, Clone)]
pub struct TableDef {
    /// Table identifier, unique within its software (e.g., "sales_summary")
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Raw fields of the table
    pub fields: &'static [CatalogFieldDef],
}

/// Raw field of a catalog table (static version)
#[derive(Debug, Clone)]
pub struct CatalogFieldDef {
    /// Field identifier, also the key of the field in raw rows
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Value type of the field
    pub data_type: DataType,
}

/// Owned version of SoftwareDef for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Software {
    pub id: String,
    pub name: String,
    pub tables: Vec<Table>,
}

/// Owned version of TableDef
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub name: String,
    pub fields: Vec<CatalogField>,
}

/// Owned version of CatalogFieldDef
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogField {
    pub id: String,
    pub name: String,
    pub data_type: DataType,
}

impl From<&SoftwareDef> for Software {
    fn from(software: &SoftwareDef) -> Self {
        Self {
            id: software.id.to_string(),
            name: software.name.to_string(),
            tables: software.tables.iter().map(|t| t.into()).collect(),
        }
    }
}

impl From<&TableDef> for Table {
    fn from(table: &TableDef) -> Self {
        Self {
            id: table.id.to_string(),
            name: table.name.to_string(),
            fields: table.fields.iter().map(|f| f.into()).collect(),
        }
    }
}

impl From<&CatalogFieldDef> for CatalogField {
    fn from(field: &CatalogFieldDef) -> Self {
        Self {
            id: field.id.to_string(),
            name: field.name.to_string(),
            data_type: field.data_type,
        }
    }
}
