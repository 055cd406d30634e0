//! Field catalog
//!
//! Static registry of the softwares, tables and raw fields a widget can be
//! built from. Unknown ids never fail: they resolve to nothing.

use contracts::shared::tableau_widget::{
    composite_field_id, CatalogFieldDef, DataSource, DataType, Field, FieldKind, FieldSource,
    Software, SoftwareDef, TableDef, TableauWidgetConfig,
};

const fn field(id: &'static str, name: &'static str, data_type: DataType) -> CatalogFieldDef {
    CatalogFieldDef { id, name, data_type }
}

pub const SALES_SUMMARY_TABLE: TableDef = TableDef {
    id: "sales_summary",
    name: "Sales summary",
    fields: &[
        field("type", "Type", DataType::String),
        field("value", "Value", DataType::Number),
    ],
};

pub const SALES_INVOICES_TABLE: TableDef = TableDef {
    id: "sales_invoices",
    name: "Sales invoices",
    fields: &[
        field("invoice_no", "Invoice number", DataType::String),
        field("invoice_date", "Invoice date", DataType::Date),
        field("customer_id", "Customer", DataType::String),
        field("branch", "Branch", DataType::String),
        field("quantity", "Quantity", DataType::Number),
        field("amount", "Amount", DataType::Number),
        field("discount", "Discount", DataType::Number),
    ],
};

pub const CUSTOMERS_TABLE: TableDef = TableDef {
    id: "customers",
    name: "Customers",
    fields: &[
        field("customer_id", "Customer", DataType::String),
        field("customer_name", "Customer name", DataType::String),
        field("city", "City", DataType::String),
        field("registered_at", "Registration date", DataType::Date),
        field("credit_limit", "Credit limit", DataType::Number),
    ],
};

pub const PRODUCTS_TABLE: TableDef = TableDef {
    id: "products",
    name: "Products",
    fields: &[
        field("product_id", "Product", DataType::String),
        field("product_name", "Product name", DataType::String),
        field("category", "Category", DataType::String),
        field("unit_price", "Unit price", DataType::Number),
    ],
};

pub const WAREHOUSE_STOCK_TABLE: TableDef = TableDef {
    id: "stock",
    name: "Stock balances",
    fields: &[
        field("warehouse", "Warehouse", DataType::String),
        field("product_id", "Product", DataType::String),
        field("balance_date", "Balance date", DataType::Date),
        field("on_hand", "On hand", DataType::Number),
        field("reserved", "Reserved", DataType::Number),
    ],
};

/// All softwares known to the builder
pub static SOFTWARES: &[SoftwareDef] = &[
    SoftwareDef {
        id: "sales",
        name: "Sales",
        tables: &[SALES_SUMMARY_TABLE, SALES_INVOICES_TABLE],
    },
    SoftwareDef {
        id: "crm",
        name: "Customers",
        tables: &[CUSTOMERS_TABLE],
    },
    SoftwareDef {
        id: "products",
        name: "Products",
        tables: &[PRODUCTS_TABLE],
    },
    SoftwareDef {
        id: "warehouse",
        name: "Warehouse",
        tables: &[WAREHOUSE_STOCK_TABLE],
    },
];

/// List the catalog for API responses
pub fn list_softwares() -> Vec<Software> {
    SOFTWARES.iter().map(Software::from).collect()
}

pub fn find_software(software_id: &str) -> Option<&'static SoftwareDef> {
    SOFTWARES.iter().find(|s| s.id == software_id)
}

pub fn find_table(software_id: &str, table_id: &str) -> Option<&'static TableDef> {
    find_software(software_id)?
        .tables
        .iter()
        .find(|t| t.id == table_id)
}

/// Fields of one data source instance, empty for unknown tables
pub fn fields_for_data_source(data_source: &DataSource) -> Vec<Field> {
    let Some(table) = find_table(&data_source.software_id, &data_source.table_id) else {
        tracing::warn!(
            "Catalog: unknown table {}/{} for data source {}",
            data_source.software_id,
            data_source.table_id,
            data_source.id
        );
        return Vec::new();
    };

    table
        .fields
        .iter()
        .map(|f| Field {
            id: composite_field_id(&data_source.id, f.id),
            name: f.name.to_string(),
            kind: FieldKind::from_data_type(f.data_type),
            data_type: f.data_type,
            source: FieldSource::Catalog {
                software_id: data_source.software_id.clone(),
                table_id: data_source.table_id.clone(),
                data_source_id: data_source.id.clone(),
                field_id: f.id.to_string(),
            },
        })
        .collect()
}

/// Fields selectable in a widget: data source fields in order, then calculated fields
pub fn available_fields(config: &TableauWidgetConfig) -> Vec<Field> {
    config
        .data_sources
        .iter()
        .flat_map(fields_for_data_source)
        .chain(config.calculated_fields.iter().map(|c| c.as_field()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_source(id: &str, software_id: &str, table_id: &str) -> DataSource {
        DataSource {
            id: id.to_string(),
            software_id: software_id.to_string(),
            table_id: table_id.to_string(),
            alias: None,
        }
    }

    #[test]
    fn test_catalog_lists_all_softwares() {
        let softwares = list_softwares();
        assert_eq!(softwares.len(), SOFTWARES.len());
        let sales = softwares.iter().find(|s| s.id == "sales").unwrap();
        assert!(sales.tables.iter().any(|t| t.id == "sales_summary"));
    }

    #[test]
    fn test_unknown_ids_yield_nothing() {
        assert!(find_table("missing", "sales_summary").is_none());
        assert!(find_table("sales", "missing").is_none());
        assert!(fields_for_data_source(&data_source("ds-1", "sales", "missing")).is_empty());
    }

    #[test]
    fn test_field_kinds_derived_from_data_type() {
        let fields = fields_for_data_source(&data_source("ds-1", "sales", "sales_invoices"));
        for f in &fields {
            assert_eq!(f.kind, FieldKind::from_data_type(f.data_type));
        }
        let amount = fields.iter().find(|f| f.row_key() == "amount").unwrap();
        assert_eq!(amount.id, "ds-1.amount");
        assert_eq!(amount.kind, FieldKind::Measure);
        let date = fields.iter().find(|f| f.row_key() == "invoice_date").unwrap();
        assert_eq!(date.kind, FieldKind::Dimension);
    }

    #[test]
    fn test_two_instances_of_one_table_have_distinct_ids() {
        let mut config = TableauWidgetConfig::new("Twice");
        config.data_sources.push(data_source("ds-1", "sales", "sales_summary"));
        config.data_sources.push(data_source("ds-2", "sales", "sales_summary"));
        let fields = available_fields(&config);
        assert_eq!(fields.len(), 4);
        let ids: std::collections::HashSet<_> = fields.iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_calculated_fields_follow_catalog_fields() {
        let mut config = TableauWidgetConfig::new("Calc");
        config.data_sources.push(data_source("ds-1", "sales", "sales_summary"));
        config.calculated_fields.push(contracts::shared::tableau_widget::CalculatedField {
            id: "calc-1".to_string(),
            name: "Double".to_string(),
            formula: "[value] * 2".to_string(),
            kind: FieldKind::Measure,
        });
        let fields = available_fields(&config);
        assert_eq!(fields.len(), 3);
        assert!(fields[2].is_calculated());
        assert_eq!(fields[2].source_table(), "calculated");
    }
}
